//! Real-world totals over the committed polygons.

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;

use serde::{Deserialize, Serialize};

use crate::polygons::Polygon;

/// Total area and perimeter in calibrated units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of polygon areas times the squared scale factor.
    pub area: f64,
    /// Sum of polygon perimeters times the scale factor.
    pub perimeter: f64,
}

/// Sum area and perimeter over `polygons`, converted by `scale_factor`.
///
/// Without a scale factor the totals are zero whatever the polygons are; that
/// is the normal state before calibration, not an error.
#[must_use]
pub fn totals(polygons: &[Polygon], scale_factor: Option<f64>) -> Totals {
    let Some(scale) = scale_factor else {
        return Totals::default();
    };
    let (area, perimeter) = polygons
        .iter()
        .fold((0.0, 0.0), |(a, p), poly| (a + poly.area(), p + poly.perimeter()));
    Totals { area: area * scale * scale, perimeter: perimeter * scale }
}
