//! Shared numeric constants for the engine.

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space grab radius in pixels for polygon vertices and calibration endpoints.
pub const HIT_RADIUS_PX: f64 = 20.0;

/// Screen-space radius around a draft polygon's first vertex that closes the shape.
pub const CLOSE_RADIUS_PX: f64 = 20.0;

/// Width of the tappable length label centered on the calibration midpoint.
pub const LABEL_WIDTH_PX: f64 = 80.0;

/// Height of the tappable length label centered on the calibration midpoint.
pub const LABEL_HEIGHT_PX: f64 = 28.0;

// ── View ────────────────────────────────────────────────────────

/// Smallest allowed view scale (image fills the surface exactly).
pub const MIN_SCALE: f64 = 1.0;

/// Largest allowed view scale.
pub const MAX_SCALE: f64 = 5.0;

/// Scale change per pixel of wheel `deltaY` (negative delta zooms in).
pub const WHEEL_ZOOM_STEP: f64 = 0.001;

/// Scale change per pixel of change in pinch finger distance.
pub const PINCH_ZOOM_STEP: f64 = 0.01;

/// Surface size used before the host reports a container.
pub const DEFAULT_SURFACE_WIDTH: f64 = 800.0;

/// Surface size used before the host reports a container.
pub const DEFAULT_SURFACE_HEIGHT: f64 = 600.0;

// ── Calibration ─────────────────────────────────────────────────

/// Minimum calibration span as a fraction of the surface's smaller dimension.
pub const MIN_LINE_FRACTION: f64 = 0.05;

/// A dragged calibration line longer than this (surface pixels) opens the length prompt on release.
pub const AUTO_PROMPT_SPAN_PX: f64 = 30.0;

/// Value pre-filled in the length prompt before any length is known.
pub const DEFAULT_CALIBRATION_LENGTH: f64 = 10.0;
