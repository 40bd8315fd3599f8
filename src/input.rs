//! Input model: tool modes, host events, and the gesture state machine.
//!
//! `Mode` is the tool the user picked. Its transition table
//! ([`Mode::resets`]) says which uncommitted geometry a switch throws away, and
//! its guards ([`Mode::allows_zoom`], [`Mode::allows_editing`]) say which
//! gestures the tool accepts. `InputState` is the gesture currently tracked
//! between press and release. `Event` is the serializable form of everything a
//! host can send.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::hit::DragTarget;

/// Which tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No tool. Existing geometry can still be edited.
    #[default]
    Idle,
    /// Drag to pan, wheel or pinch to zoom.
    Panning,
    /// Draw or adjust the calibration line.
    Calibrating,
    /// Click out polygon vertices.
    Drawing,
}

/// Uncommitted state discarded by a mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resets {
    /// Drop the draft polygon.
    pub draft_polygon: bool,
    /// Roll back an unconfirmed calibration sketch or close its prompt.
    pub pending_calibration: bool,
    /// End whatever press-move-release gesture is in flight.
    pub gesture: bool,
}

impl Mode {
    /// What switching from `self` to `to` discards.
    ///
    /// | from \ to      | same mode | any other mode |
    /// |----------------|-----------|----------------|
    /// | `Idle`         | nothing   | gesture |
    /// | `Panning`      | nothing   | gesture |
    /// | `Calibrating`  | nothing   | gesture, pending calibration |
    /// | `Drawing`      | nothing   | gesture, draft polygon |
    #[must_use]
    pub fn resets(self, to: Mode) -> Resets {
        if self == to {
            return Resets::default();
        }
        Resets {
            draft_polygon: self == Mode::Drawing,
            pending_calibration: self == Mode::Calibrating,
            gesture: true,
        }
    }

    /// Wheel and pinch zoom are only honored while panning.
    #[must_use]
    pub fn allows_zoom(self) -> bool {
        self == Mode::Panning
    }

    /// Single-pointer drags pan the view only while panning.
    #[must_use]
    pub fn allows_pan(self) -> bool {
        self == Mode::Panning
    }

    /// Vertices and calibration endpoints can be grabbed in every mode but Panning.
    #[must_use]
    pub fn allows_editing(self) -> bool {
        self != Mode::Panning
    }
}

/// The gesture being tracked between press and release.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the view.
    Panning {
        /// Screen position of the previous pointer event.
        last_screen: Point,
    },
    /// Dragging a vertex or calibration endpoint.
    Dragging { target: DragTarget },
    /// Holding the pointer while sketching a calibration line.
    SketchingLine,
    /// Two touches down. Single-touch handling is suppressed until all fingers lift.
    Pinching {
        /// Finger distance at the previous pinch event, in screen pixels.
        last_distance: f64,
    },
    /// The pointer was pressed but the press did nothing; wait for release.
    Pressed,
}

/// Host events the engine consumes. Coordinates are screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A decoded image with its native pixel size.
    LoadImage { width: f64, height: f64 },
    /// The container the surface must fit in was laid out or resized.
    Resize { width: f64, height: f64 },
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// Wheel scroll; positive `delta_y` scrolls down (zooms out).
    Wheel { delta_y: f64 },
    /// Active touch points after a touch started.
    TouchStart { touches: Vec<Point> },
    /// Active touch points after they moved.
    TouchMove { touches: Vec<Point> },
    /// A touch lifted at `x`, `y`; `remaining` touches are still down.
    TouchEnd { x: f64, y: f64, remaining: usize },
    SetMode { mode: Mode },
    ResetAll,
    DeletePolygon { index: usize },
    /// Raw text from the length prompt.
    ConfirmCalibration { length: String },
    CancelCalibration,
}

/// Distance between the first two touches, if there are at least two.
#[must_use]
pub fn pinch_distance(touches: &[Point]) -> Option<f64> {
    match touches {
        [a, b, ..] => Some(crate::geometry::distance(*a, *b)),
        _ => None,
    }
}
