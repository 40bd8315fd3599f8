//! Read-only, serializable view of engine state for the host's render pass.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::Serialize;

use crate::calibration::{CalibrationLine, Phase};
use crate::geometry::Point;
use crate::hit::DragTarget;
use crate::input::Mode;
use crate::metrics::Totals;
use crate::polygons::Polygon;
use crate::view::{Surface, ViewTransform};

/// Everything a host needs to draw one frame and its overlay widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub view: ViewTransform,
    /// Render surface size; `None` until an image is loaded.
    pub surface: Option<Surface>,
    /// Committed polygons in index order.
    pub polygons: Vec<Polygon>,
    /// Bounding-box center of each committed polygon, same order.
    pub centers: Vec<Point>,
    /// The polygon being drawn.
    pub draft: Polygon,
    pub calibration: CalibrationSnapshot,
    pub totals: Totals,
    /// The element under an active drag, if any.
    pub drag_target: Option<DragTarget>,
}

/// Calibration part of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationSnapshot {
    pub line: Option<CalibrationLine>,
    pub known_length: Option<f64>,
    pub scale_factor: Option<f64>,
    pub phase: Phase,
    pub prompt_open: bool,
}

impl Snapshot {
    /// Serialize to a JSON string for a non-Rust host.
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
