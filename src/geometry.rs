//! Pure geometry: points, distances and polygon measurements.
//!
//! Every function here is stateless and works in whatever space its inputs are
//! in. The engine calls them with normalized image coordinates for measurement
//! and with screen pixels for hit-testing.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in normalized image space or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point { x: (self.x + other.x) / 2.0, y: (self.y + other.y) / 2.0 }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Shoelace sum over the closed vertex ring, halved.
///
/// Positive for counter-clockwise winding in a y-up frame. Zero for fewer than
/// three points.
#[must_use]
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y;
        sum -= points[j].x * points[i].y;
    }
    sum / 2.0
}

/// Unsigned polygon area. Independent of winding direction and starting vertex.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Sum of edge lengths around the closed ring, including the last-to-first edge.
#[must_use]
pub fn polygon_perimeter(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| distance(points[i], points[(i + 1) % n])).sum()
}

/// Center of the axis-aligned bounding box (not the centroid).
///
/// An empty input yields `(0.5, 0.5)`, the middle of normalized space, so
/// overlay widgets for an empty shape still land somewhere sensible.
#[must_use]
pub fn polygon_center(points: &[Point]) -> Point {
    let Some(first) = points.first() else {
        return Point::new(0.5, 0.5);
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Point { x: (min_x + max_x) / 2.0, y: (min_y + max_y) / 2.0 }
}
