#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::Serialize;

use crate::calibration::{CalibrationLine, LineEnd};
use crate::geometry::{Point, distance};
use crate::polygons::{Polygon, PolygonSet, VertexAddr};
use crate::view::{Surface, ViewTransform};

/// The geometry element bound to an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragTarget {
    /// One end of the calibration line.
    CalibrationEndpoint(LineEnd),
    /// A vertex of a committed polygon or of the draft.
    Vertex(VertexAddr),
}

/// Everything hit-testing needs to see, borrowed from the engine for one query.
#[derive(Debug, Clone, Copy)]
pub struct HitScene<'a> {
    pub view: &'a ViewTransform,
    pub surface: Surface,
    pub polygons: &'a PolygonSet,
    /// Calibration line whose endpoints may be grabbed; `None` while it is being sketched.
    pub calibration: Option<CalibrationLine>,
    /// Grab radius in screen pixels.
    pub radius: f64,
}

impl HitScene<'_> {
    fn near(&self, screen_pt: Point, normalized: Point) -> bool {
        distance(screen_pt, self.view.to_screen(normalized, self.surface)) <= self.radius
    }
}

/// Find the drag target under `screen_pt`.
///
/// Priority, highest first: committed polygon vertices, calibration endpoints,
/// draft vertices. Within a category the first match in storage order wins.
/// A draft with more than two points never offers its first vertex, which is
/// reserved for closing the shape.
#[must_use]
pub fn hit_test(screen_pt: Point, scene: &HitScene<'_>) -> Option<DragTarget> {
    for (polygon, poly) in scene.polygons.committed().iter().enumerate() {
        for (vertex, &p) in poly.points().iter().enumerate() {
            if scene.near(screen_pt, p) {
                return Some(DragTarget::Vertex(VertexAddr::Committed { polygon, vertex }));
            }
        }
    }

    if let Some(line) = scene.calibration {
        for end in [LineEnd::P1, LineEnd::P2] {
            if scene.near(screen_pt, line.endpoint(end)) {
                return Some(DragTarget::CalibrationEndpoint(end));
            }
        }
    }

    let draft = scene.polygons.draft();
    let skip = usize::from(draft.len() > 2);
    for (vertex, &p) in draft.points().iter().enumerate().skip(skip) {
        if scene.near(screen_pt, p) {
            return Some(DragTarget::Vertex(VertexAddr::Draft { vertex }));
        }
    }

    None
}

/// Whether `screen_pt` closes `draft`: it has more than two points and the tap
/// lands within `radius` screen pixels of its first vertex.
#[must_use]
pub fn hits_close_target(screen_pt: Point, draft: &Polygon, view: &ViewTransform, surface: Surface, radius: f64) -> bool {
    if draft.len() <= 2 {
        return false;
    }
    draft
        .first()
        .is_some_and(|first| distance(screen_pt, view.to_screen(first, surface)) <= radius)
}

/// Whether `screen_pt` lands on the length label, a `width` x `height` screen
/// rectangle centered on the line's midpoint.
#[must_use]
pub fn hits_length_label(
    screen_pt: Point,
    line: &CalibrationLine,
    view: &ViewTransform,
    surface: Surface,
    width: f64,
    height: f64,
) -> bool {
    let center = view.to_screen(line.midpoint(), surface);
    (screen_pt.x - center.x).abs() <= width / 2.0 && (screen_pt.y - center.y).abs() <= height / 2.0
}
