//! Polygon storage: the committed set plus the draft being drawn.
//!
//! Polygons are addressed by index only. Deleting one shifts every later index
//! down by one, so callers must not hold indices across a deletion. Vertex
//! edits replace the addressed polygon with a new value rather than mutating
//! points through a shared reference.

#[cfg(test)]
#[path = "polygons_test.rs"]
mod polygons_test;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::geometry::{Point, polygon_area, polygon_center, polygon_perimeter};

/// An ordered ring of normalized points. Click order is drawing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// A copy of this polygon with vertex `index` moved to `p`, or `None` if out of range.
    #[must_use]
    pub fn with_vertex(&self, index: usize, p: Point) -> Option<Polygon> {
        if index >= self.points.len() {
            return None;
        }
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, &q)| if i == index { p } else { q })
            .collect();
        Some(Polygon { points })
    }

    /// Unsigned area in normalized units.
    #[must_use]
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Perimeter in normalized units, closing edge included.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        polygon_perimeter(&self.points)
    }

    /// Bounding-box center, `(0.5, 0.5)` when empty.
    #[must_use]
    pub fn center(&self) -> Point {
        polygon_center(&self.points)
    }
}

/// Address of one vertex in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VertexAddr {
    /// Vertex `vertex` of committed polygon `polygon`.
    Committed { polygon: usize, vertex: usize },
    /// Vertex `vertex` of the draft polygon.
    Draft { vertex: usize },
}

/// Committed polygons plus the one currently being drawn.
#[derive(Debug, Clone, Default)]
pub struct PolygonSet {
    committed: Vec<Polygon>,
    draft: Polygon,
}

impl PolygonSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    /// Committed polygons in insertion order.
    #[must_use]
    pub fn committed(&self) -> &[Polygon] {
        &self.committed
    }

    #[must_use]
    pub fn draft(&self) -> &Polygon {
        &self.draft
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Polygon> {
        self.committed.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    #[must_use]
    pub fn vertex(&self, addr: VertexAddr) -> Option<Point> {
        match addr {
            VertexAddr::Committed { polygon, vertex } => self.committed.get(polygon)?.points.get(vertex).copied(),
            VertexAddr::Draft { vertex } => self.draft.points.get(vertex).copied(),
        }
    }

    /// Bounding-box center of each committed polygon, for overlay placement.
    #[must_use]
    pub fn centers(&self) -> Vec<Point> {
        self.committed.iter().map(Polygon::center).collect()
    }

    // --- Draft authoring ---

    /// Append a point to the draft.
    pub fn push_draft_point(&mut self, p: Point) {
        self.draft.points.push(p);
        debug!(x = p.x, y = p.y, vertices = self.draft.len(), "draft point added");
    }

    /// Move the draft into the committed set. Returns the new polygon's index.
    ///
    /// The first point is not repeated at the end. An empty draft commits nothing.
    pub fn close_draft(&mut self) -> Option<usize> {
        if self.draft.is_empty() {
            return None;
        }
        let polygon = std::mem::take(&mut self.draft);
        let vertices = polygon.len();
        self.committed.push(polygon);
        let index = self.committed.len() - 1;
        info!(index, vertices, "polygon closed");
        Some(index)
    }

    /// Drop the draft's points. Returns whether there were any.
    pub fn discard_draft(&mut self) -> bool {
        let had_points = !self.draft.is_empty();
        self.draft = Polygon::default();
        if had_points {
            debug!("draft polygon discarded");
        }
        had_points
    }

    // --- Editing ---

    /// Replace the vertex at `addr` with `p`. Returns false if the address is stale.
    pub fn set_vertex(&mut self, addr: VertexAddr, p: Point) -> bool {
        match addr {
            VertexAddr::Committed { polygon, vertex } => {
                let Some(updated) = self.committed.get(polygon).and_then(|poly| poly.with_vertex(vertex, p)) else {
                    return false;
                };
                self.committed[polygon] = updated;
                true
            }
            VertexAddr::Draft { vertex } => {
                let Some(updated) = self.draft.with_vertex(vertex, p) else {
                    return false;
                };
                self.draft = updated;
                true
            }
        }
    }

    /// Remove committed polygon `index`, shifting later polygons down.
    pub fn delete(&mut self, index: usize) -> Option<Polygon> {
        if index >= self.committed.len() {
            return None;
        }
        let removed = self.committed.remove(index);
        info!(index, remaining = self.committed.len(), "polygon deleted");
        Some(removed)
    }

    /// Remove every committed polygon and the draft.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.draft = Polygon::default();
    }
}
