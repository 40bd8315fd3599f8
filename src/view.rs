#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Pixel size of a rectangle: the render surface, the host container or the decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are positive and finite.
    #[must_use]
    pub fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// The smaller of width and height.
    #[must_use]
    pub fn min_side(self) -> f64 {
        self.width.min(self.height)
    }

    /// Screen-space center of the surface.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Largest surface with `image`'s aspect ratio that fits inside `container`.
    ///
    /// A container with no usable height fits by width alone. Returns `None`
    /// when the image or the container width is unusable.
    #[must_use]
    pub fn fit(image: Surface, container: Surface) -> Option<Surface> {
        if !image.is_usable() || !(container.width.is_finite() && container.width > 0.0) {
            return None;
        }
        let by_width = container.width / image.width;
        let ratio = if container.height.is_finite() && container.height > 0.0 {
            by_width.min(container.height / image.height)
        } else {
            by_width
        };
        Some(Surface { width: image.width * ratio, height: image.height * ratio })
    }

    /// Map a normalized point to unscaled surface pixels.
    #[must_use]
    pub fn to_pixels(self, p: Point) -> Point {
        Point { x: p.x * self.width, y: p.y * self.height }
    }
}

/// Pan/zoom state over the render surface.
///
/// `pan_x` / `pan_y` are in screen pixels. `scale` is the zoom factor, kept
/// within the configured limits by [`ViewTransform::zoom_at`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0 }
    }
}

impl ViewTransform {
    /// Convert a normalized image point to screen pixels.
    #[must_use]
    pub fn to_screen(&self, p: Point, surface: Surface) -> Point {
        Point {
            x: p.x * surface.width * self.scale + self.pan_x,
            y: p.y * surface.height * self.scale + self.pan_y,
        }
    }

    /// Convert a screen-pixel point to normalized image space.
    ///
    /// Inverse of [`ViewTransform::to_screen`]. Results are not clamped to [0, 1].
    #[must_use]
    pub fn to_normalized(&self, screen: Point, surface: Surface) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.scale / surface.width,
            y: (screen.y - self.pan_y) / self.scale / surface.height,
        }
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Change scale by `delta` while keeping `focal` fixed on screen.
    ///
    /// The new scale is clamped to `[min_scale, max_scale]`. Pan is recomputed
    /// from the focal point's unscaled surface coordinate so that the same
    /// image point stays under it.
    pub fn zoom_at(&mut self, focal: Point, delta: f64, min_scale: f64, max_scale: f64) {
        let new_scale = (self.scale + delta).max(min_scale).min(max_scale);
        let unscaled_x = (focal.x - self.pan_x) / self.scale;
        let unscaled_y = (focal.y - self.pan_y) / self.scale;
        self.pan_x = focal.x - unscaled_x * new_scale;
        self.pan_y = focal.y - unscaled_y * new_scale;
        self.scale = new_scale;
    }
}
