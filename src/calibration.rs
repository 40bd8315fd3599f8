//! Calibration: the reference line, its confirmed real-world length, and the
//! scale factor derived from them.
//!
//! A line is sketched either by dragging (press, move, release) or by two
//! discrete clicks. Once long enough it goes to a length prompt; confirming a
//! positive length settles it and fixes the scale factor. A settled line keeps
//! both endpoints editable and the scale follows every edit live, using the
//! already-confirmed length.
//!
//! Sketching a new line stashes the settled one. Anything that abandons the
//! sketch (a too-short release, a cancelled prompt, leaving the tool) restores
//! the stash, so a confirmed calibration is only ever replaced by another
//! confirmed calibration.

#[cfg(test)]
#[path = "calibration_test.rs"]
mod calibration_test;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geometry::{Point, distance};
use crate::view::Surface;

/// Error returned when confirming a calibration length.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// The supplied length is missing, non-numeric, zero, negative or not finite.
    #[error("calibration length must be a positive number, got {0:?}")]
    InvalidLength(String),
    /// There is no line to attach a length to.
    #[error("no calibration line to confirm")]
    NoLine,
    /// A length arrived while the prompt was closed.
    #[error("calibration prompt is not open")]
    NoPrompt,
}

/// Which end of the calibration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnd {
    P1,
    P2,
}

/// The reference segment, in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLine {
    pub p1: Point,
    pub p2: Point,
}

impl CalibrationLine {
    /// A zero-length line with both ends at `p`.
    #[must_use]
    pub fn at(p: Point) -> Self {
        Self { p1: p, p2: p }
    }

    #[must_use]
    pub fn endpoint(&self, end: LineEnd) -> Point {
        match end {
            LineEnd::P1 => self.p1,
            LineEnd::P2 => self.p2,
        }
    }

    /// A copy of this line with one endpoint replaced.
    #[must_use]
    pub fn with_endpoint(self, end: LineEnd, p: Point) -> Self {
        match end {
            LineEnd::P1 => Self { p1: p, ..self },
            LineEnd::P2 => Self { p2: p, ..self },
        }
    }

    #[must_use]
    pub fn midpoint(&self) -> Point {
        self.p1.midpoint(self.p2)
    }

    /// Length in unscaled render-surface pixels. Independent of zoom.
    #[must_use]
    pub fn pixel_span(&self, surface: Surface) -> f64 {
        distance(surface.to_pixels(self.p1), surface.to_pixels(self.p2))
    }
}

/// Where the calibration tool is in its authoring flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing in progress. A line, if present, is the confirmed one.
    #[default]
    Settled,
    /// Pointer is held after placing p1; moves drag p2.
    Sketching {
        /// Whether any move arrived since the press.
        moved: bool,
    },
    /// p1 is placed; the next click sets p2.
    AwaitingSecondClick,
    /// The length prompt is open.
    Prompting {
        /// `true` when the line being prompted for is a new sketch, `false`
        /// when the prompt was reopened for a settled line.
        fresh: bool,
    },
}

/// What a release or second click did to the sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Too short; the sketch was rolled back.
    Discarded,
    /// Long enough; the length prompt is now open.
    Prompt,
    /// Still waiting for a second click to place p2.
    AwaitSecondClick,
    /// Nothing was being sketched.
    Ignored,
}

/// Result of a successful confirmation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfirmOutcome {
    /// The length was stored and the line settled.
    Applied { scale_factor: f64 },
    /// The line was below the minimum span and was dropped instead.
    Discarded,
}

/// Minimum-span rules used to judge a sketched line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanRules {
    /// Lines shorter than this (surface pixels) are discarded.
    pub min_span: f64,
    /// Dragged lines longer than this (surface pixels) open the prompt on release.
    pub auto_prompt_span: f64,
}

/// Calibration state: optional line, optional confirmed length, cached scale.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    line: Option<CalibrationLine>,
    stashed: Option<CalibrationLine>,
    known_length: Option<f64>,
    scale_factor: Option<f64>,
    phase: Phase,
}

impl Calibration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    #[must_use]
    pub fn line(&self) -> Option<CalibrationLine> {
        self.line
    }

    /// The confirmed real-world length, if any.
    #[must_use]
    pub fn known_length(&self) -> Option<f64> {
        self.known_length
    }

    /// Real-world units per surface pixel. Defined only when a line exists and
    /// a length has been confirmed. While a new sketch is pending it still
    /// describes the confirmed line.
    #[must_use]
    pub fn scale_factor(&self) -> Option<f64> {
        self.scale_factor
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_prompting(&self) -> bool {
        matches!(self.phase, Phase::Prompting { .. })
    }

    /// Whether p1 has been placed and p2 is still being chosen.
    #[must_use]
    pub fn is_sketching(&self) -> bool {
        matches!(self.phase, Phase::Sketching { .. } | Phase::AwaitingSecondClick)
    }

    /// Value to pre-fill the prompt with.
    #[must_use]
    pub fn prompt_length(&self, default: f64) -> f64 {
        self.known_length.unwrap_or(default)
    }

    // --- Sketching ---

    /// Place p1 (and p2) at `p` and start a drag sketch.
    pub fn begin(&mut self, p: Point, surface: Surface) {
        if self.phase == Phase::Settled {
            self.stashed = self.line.take();
        }
        self.line = Some(CalibrationLine::at(p));
        self.phase = Phase::Sketching { moved: false };
        self.refresh(surface);
        debug!(x = p.x, y = p.y, "calibration sketch started");
    }

    /// Drag p2 while a sketch is held. Returns false if nothing was sketching.
    pub fn extend(&mut self, p: Point, surface: Surface) -> bool {
        let Phase::Sketching { .. } = self.phase else {
            return false;
        };
        let Some(line) = self.line else {
            return false;
        };
        self.line = Some(line.with_endpoint(LineEnd::P2, p));
        self.phase = Phase::Sketching { moved: true };
        self.refresh(surface);
        true
    }

    /// Finish a held sketch at `p`.
    ///
    /// A release with no movement is the first click of a click-click sketch.
    /// A moved release below `rules.min_span` is discarded; one above both
    /// thresholds opens the prompt; anything in between waits for a second
    /// click.
    pub fn release(&mut self, p: Point, surface: Surface, rules: SpanRules) -> Release {
        let Phase::Sketching { moved } = self.phase else {
            return Release::Ignored;
        };
        if !moved {
            self.phase = Phase::AwaitingSecondClick;
            return Release::AwaitSecondClick;
        }
        let Some(line) = self.line else {
            return Release::Ignored;
        };
        let line = line.with_endpoint(LineEnd::P2, p);
        self.line = Some(line);
        let span = line.pixel_span(surface);
        if span < rules.min_span || span <= 0.0 {
            debug!(span, min = rules.min_span, "calibration line too short; discarded");
            self.rollback(surface);
            return Release::Discarded;
        }
        if span > rules.auto_prompt_span {
            self.phase = Phase::Prompting { fresh: true };
            self.refresh(surface);
            return Release::Prompt;
        }
        self.phase = Phase::AwaitingSecondClick;
        self.refresh(surface);
        Release::AwaitSecondClick
    }

    /// Place p2 with a discrete click and advance to the prompt.
    pub fn second_click(&mut self, p: Point, surface: Surface, rules: SpanRules) -> Release {
        if self.phase != Phase::AwaitingSecondClick {
            return Release::Ignored;
        }
        let Some(line) = self.line else {
            return Release::Ignored;
        };
        let line = line.with_endpoint(LineEnd::P2, p);
        self.line = Some(line);
        let span = line.pixel_span(surface);
        if span < rules.min_span || span <= 0.0 {
            debug!(span, min = rules.min_span, "calibration line too short; discarded");
            self.rollback(surface);
            return Release::Discarded;
        }
        self.phase = Phase::Prompting { fresh: true };
        self.refresh(surface);
        Release::Prompt
    }

    // --- Editing ---

    /// Move one endpoint of the current line. The scale follows live.
    pub fn move_endpoint(&mut self, end: LineEnd, p: Point, surface: Surface) -> bool {
        let Some(line) = self.line else {
            return false;
        };
        self.line = Some(line.with_endpoint(end, p));
        self.refresh(surface);
        true
    }

    /// Reopen the prompt for a settled line to change its length.
    pub fn reopen_prompt(&mut self) -> bool {
        if self.phase != Phase::Settled || self.line.is_none() {
            return false;
        }
        self.phase = Phase::Prompting { fresh: false };
        true
    }

    // --- Prompt resolution ---

    /// Confirm the line with a real-world `length`.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::NoLine`] if no line exists,
    /// [`CalibrationError::NoPrompt`] if the prompt is closed, and
    /// [`CalibrationError::InvalidLength`] if `length` is not a positive finite
    /// number. In every case the existing scale factor is untouched.
    pub fn confirm(&mut self, length: f64, surface: Surface, min_span: f64) -> Result<ConfirmOutcome, CalibrationError> {
        let Some(line) = self.line else {
            return Err(CalibrationError::NoLine);
        };
        if !self.is_prompting() {
            return Err(CalibrationError::NoPrompt);
        }
        if !(length.is_finite() && length > 0.0) {
            warn!(length, "rejected calibration length");
            return Err(CalibrationError::InvalidLength(length.to_string()));
        }
        let span = line.pixel_span(surface);
        if span < min_span || span <= 0.0 {
            debug!(span, min = min_span, "confirmed calibration line too short; discarded");
            self.rollback(surface);
            return Ok(ConfirmOutcome::Discarded);
        }
        self.known_length = Some(length);
        self.stashed = None;
        self.phase = Phase::Settled;
        self.refresh(surface);
        let scale_factor = length / span;
        info!(length, span, scale_factor, "calibration confirmed");
        Ok(ConfirmOutcome::Applied { scale_factor })
    }

    /// Confirm with raw prompt text. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// As [`Calibration::confirm`], plus [`CalibrationError::InvalidLength`]
    /// when the text is empty or not a number.
    pub fn confirm_input(
        &mut self,
        input: &str,
        surface: Surface,
        min_span: f64,
    ) -> Result<ConfirmOutcome, CalibrationError> {
        if self.line.is_none() {
            return Err(CalibrationError::NoLine);
        }
        if !self.is_prompting() {
            return Err(CalibrationError::NoPrompt);
        }
        let Ok(length) = input.trim().parse::<f64>() else {
            warn!(input, "rejected calibration input");
            return Err(CalibrationError::InvalidLength(input.to_string()));
        };
        self.confirm(length, surface, min_span)
    }

    /// Abandon whatever is in progress.
    ///
    /// An unconfirmed sketch or a prompt for a fresh sketch rolls back to the
    /// stashed line. A prompt reopened on a settled line just closes. Returns
    /// whether anything changed.
    pub fn cancel(&mut self, surface: Surface) -> bool {
        match self.phase {
            Phase::Settled => false,
            Phase::Prompting { fresh: false } => {
                self.phase = Phase::Settled;
                true
            }
            Phase::Sketching { .. } | Phase::AwaitingSecondClick | Phase::Prompting { fresh: true } => {
                debug!("calibration sketch abandoned");
                self.rollback(surface);
                true
            }
        }
    }

    /// Re-derive the scale after the render surface changed size.
    pub fn rescale(&mut self, surface: Surface) {
        self.refresh(surface);
    }

    /// Drop the line, the length and the scale.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn rollback(&mut self, surface: Surface) {
        self.line = self.stashed.take();
        if self.line.is_none() {
            self.known_length = None;
        }
        self.phase = Phase::Settled;
        self.refresh(surface);
    }

    /// The line the scale is measured on: the stashed confirmed line while a
    /// fresh sketch is pending, otherwise the current one.
    fn measured_line(&self) -> Option<CalibrationLine> {
        match self.phase {
            Phase::Sketching { .. } | Phase::AwaitingSecondClick | Phase::Prompting { fresh: true } => self.stashed,
            Phase::Settled | Phase::Prompting { fresh: false } => self.line,
        }
    }

    fn refresh(&mut self, surface: Surface) {
        self.scale_factor = match (self.measured_line(), self.known_length) {
            (Some(line), Some(length)) => {
                let span = line.pixel_span(surface);
                (span > 0.0).then(|| length / span)
            }
            _ => None,
        };
    }
}
