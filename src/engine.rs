use tracing::{debug, info, warn};
use web_sys::HtmlCanvasElement;

use crate::calibration::{Calibration, CalibrationError, CalibrationLine, ConfirmOutcome, Phase, Release, SpanRules};
use crate::config::EngineConfig;
use crate::consts::{DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH};
use crate::estimate::{Complexity, Estimate, Rates};
use crate::geometry::Point;
use crate::hit::{self, DragTarget, HitScene};
use crate::input::{Event, InputState, Mode, pinch_distance};
use crate::metrics::{self, Totals};
use crate::polygons::{PolygonSet, VertexAddr};
use crate::snapshot::{CalibrationSnapshot, Snapshot};
use crate::view::{Surface, ViewTransform};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// State changed in a way that needs a redraw.
    RenderNeeded,
    /// Show the length prompt, pre-filled with `initial_length`.
    OpenCalibrationPrompt { initial_length: f64 },
    /// Hide the length prompt.
    CloseCalibrationPrompt,
    /// The calibration sketch was too short and was dropped.
    CalibrationDiscarded,
    /// The prompt text was not a usable length. The prompt stays open.
    CalibrationRejected { reason: String },
    /// The draft was committed as polygon `index`.
    PolygonClosed { index: usize },
    /// Polygon `index` was removed; later indices shifted down.
    PolygonDeleted { index: usize },
    /// Real-world totals changed.
    TotalsChanged(Totals),
}

/// Core engine state: everything that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without a browser.
#[derive(Debug, Clone, Default)]
pub struct EngineCore {
    pub config: EngineConfig,
    mode: Mode,
    view: ViewTransform,
    image: Option<Surface>,
    container: Option<Surface>,
    surface: Option<Surface>,
    calibration: Calibration,
    polygons: PolygonSet,
    input: InputState,
    totals: Totals,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config, ..Self::default() }
    }

    // --- Data inputs ---

    /// Load a decoded image of `width` x `height` pixels.
    ///
    /// Everything drawn over the previous image is dropped and the view is
    /// reset. A non-positive size leaves the engine untouched.
    pub fn load_image(&mut self, width: f64, height: f64) -> Vec<Action> {
        let image = Surface::new(width, height);
        if !image.is_usable() {
            warn!(width, height, "ignoring image with unusable size");
            return Vec::new();
        }
        let mut actions = self.close_prompt_if_open();
        self.polygons.clear();
        self.calibration.reset();
        self.view = ViewTransform::default();
        self.input = InputState::Idle;
        self.image = Some(image);
        self.refit();
        info!(width, height, "image loaded");
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Record the host container size and refit the surface.
    ///
    /// The scale factor is re-derived against the new surface, so it always
    /// equals the known length over the line's current pixel span.
    pub fn set_container(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.container = Some(Surface::new(width, height));
        self.refit();
        debug!(width, height, surface = ?self.surface, "container resized");
        let mut actions = Vec::new();
        if let Some(surface) = self.surface {
            self.calibration.rescale(surface);
            self.refresh_totals(&mut actions);
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Tool ---

    /// Switch tools, discarding whatever the old tool left uncommitted.
    ///
    /// Selecting the active mode again does nothing.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if self.mode == mode {
            return Vec::new();
        }
        let resets = self.mode.resets(mode);
        let mut actions = Vec::new();
        if resets.gesture {
            self.input = InputState::Idle;
        }
        if resets.draft_polygon {
            self.polygons.discard_draft();
        }
        if resets.pending_calibration {
            actions.extend(self.abandon_calibration());
        }
        debug!(from = ?self.mode, to = ?mode, "mode changed");
        self.mode = mode;
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Clear all polygons, the draft, calibration and view. The image stays.
    pub fn reset_all(&mut self) -> Vec<Action> {
        let mut actions = self.close_prompt_if_open();
        self.polygons.clear();
        self.calibration.reset();
        self.view = ViewTransform::default();
        self.input = InputState::Idle;
        self.mode = Mode::Idle;
        info!("engine reset");
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Delete committed polygon `index`. An out-of-range index does nothing.
    pub fn delete_polygon(&mut self, index: usize) -> Vec<Action> {
        if self.polygons.delete(index).is_none() {
            debug!(index, "delete ignored; no such polygon");
            return Vec::new();
        }
        // Committed vertex addresses shift after a deletion.
        if let InputState::Dragging { target: DragTarget::Vertex(VertexAddr::Committed { .. }) } = self.input {
            self.input = InputState::Pressed;
        }
        let mut actions = vec![Action::PolygonDeleted { index }];
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Calibration prompt ---

    /// Confirm the open prompt with `length`.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::InvalidLength`] for a non-positive or non-finite
    /// length, [`CalibrationError::NoLine`] when there is nothing to confirm
    /// and [`CalibrationError::NoPrompt`] when the prompt is closed. The scale
    /// is unchanged.
    pub fn confirm_calibration(&mut self, length: f64) -> Result<Vec<Action>, CalibrationError> {
        let surface = self.surface.ok_or(CalibrationError::NoLine)?;
        let min_span = self.min_span(surface);
        let outcome = self.calibration.confirm(length, surface, min_span)?;
        Ok(self.confirm_actions(outcome))
    }

    /// Confirm the open prompt with its raw text.
    ///
    /// # Errors
    ///
    /// As [`EngineCore::confirm_calibration`], plus
    /// [`CalibrationError::InvalidLength`] for empty or non-numeric text.
    pub fn confirm_calibration_input(&mut self, input: &str) -> Result<Vec<Action>, CalibrationError> {
        let surface = self.surface.ok_or(CalibrationError::NoLine)?;
        let min_span = self.min_span(surface);
        let outcome = self.calibration.confirm_input(input, surface, min_span)?;
        Ok(self.confirm_actions(outcome))
    }

    /// Dismiss the prompt without a length.
    pub fn cancel_calibration(&mut self) -> Vec<Action> {
        if !self.calibration.is_prompting() {
            return Vec::new();
        }
        let mut actions = self.abandon_calibration();
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, screen: Point) -> Vec<Action> {
        let Some(surface) = self.surface else {
            return Vec::new();
        };
        if matches!(self.input, InputState::Pinching { .. }) {
            return Vec::new();
        }
        // The prompt is modal, whatever the tool.
        if self.calibration.is_prompting() {
            self.input = InputState::Pressed;
            return Vec::new();
        }
        if self.mode.allows_pan() {
            self.input = InputState::Panning { last_screen: screen };
            return Vec::new();
        }

        if self.mode.allows_editing() {
            let grabbable = if self.calibration.is_sketching() { None } else { self.calibration.line() };
            let scene = HitScene {
                view: &self.view,
                surface,
                polygons: &self.polygons,
                calibration: grabbable,
                radius: self.config.hit_radius_px,
            };
            if let Some(target) = hit::hit_test(screen, &scene) {
                debug!(?target, "drag started");
                self.input = InputState::Dragging { target };
                return vec![Action::RenderNeeded];
            }
            if let Some(line) = self.settled_line()
                && self.hits_label(screen, &line, surface)
                && self.calibration.reopen_prompt()
            {
                self.input = InputState::Pressed;
                let initial_length = self.calibration.prompt_length(self.config.default_calibration_length);
                return vec![Action::OpenCalibrationPrompt { initial_length }];
            }
        }

        let p = self.view.to_normalized(screen, surface);
        match self.mode {
            Mode::Calibrating => {
                if self.calibration.phase() == Phase::AwaitingSecondClick {
                    self.input = InputState::Pressed;
                    let rules = self.span_rules(surface);
                    let release = self.calibration.second_click(p, surface, rules);
                    return self.release_actions(release);
                }
                self.calibration.begin(p, surface);
                self.input = InputState::SketchingLine;
                let mut actions = Vec::new();
                self.refresh_totals(&mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            Mode::Drawing => {
                self.input = InputState::Pressed;
                let closes = hit::hits_close_target(
                    screen,
                    self.polygons.draft(),
                    &self.view,
                    surface,
                    self.config.close_radius_px,
                );
                if closes {
                    let mut actions = Vec::new();
                    if let Some(index) = self.polygons.close_draft() {
                        actions.push(Action::PolygonClosed { index });
                    }
                    self.refresh_totals(&mut actions);
                    actions.push(Action::RenderNeeded);
                    return actions;
                }
                self.polygons.push_draft_point(p);
                vec![Action::RenderNeeded]
            }
            Mode::Idle | Mode::Panning => {
                self.input = InputState::Pressed;
                Vec::new()
            }
        }
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        let Some(surface) = self.surface else {
            return Vec::new();
        };
        match self.input {
            InputState::Dragging { target } => {
                let p = self.view.to_normalized(screen, surface);
                let moved = match target {
                    DragTarget::CalibrationEndpoint(end) => self.calibration.move_endpoint(end, p, surface),
                    DragTarget::Vertex(addr) => self.polygons.set_vertex(addr, p),
                };
                if !moved {
                    return Vec::new();
                }
                let mut actions = Vec::new();
                self.refresh_totals(&mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            InputState::Panning { last_screen } => {
                self.view.pan_by(screen.x - last_screen.x, screen.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen };
                vec![Action::RenderNeeded]
            }
            InputState::SketchingLine => {
                let p = self.view.to_normalized(screen, surface);
                if !self.calibration.extend(p, surface) {
                    return Vec::new();
                }
                let mut actions = Vec::new();
                self.refresh_totals(&mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            InputState::Idle | InputState::Pinching { .. } | InputState::Pressed => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, screen: Point) -> Vec<Action> {
        match self.input {
            InputState::Pinching { .. } => Vec::new(),
            InputState::SketchingLine => {
                self.input = InputState::Idle;
                let Some(surface) = self.surface else {
                    return Vec::new();
                };
                let p = self.view.to_normalized(screen, surface);
                let rules = self.span_rules(surface);
                let release = self.calibration.release(p, surface, rules);
                self.release_actions(release)
            }
            InputState::Dragging { target } => {
                debug!(?target, "drag finished");
                self.input = InputState::Idle;
                vec![Action::RenderNeeded]
            }
            InputState::Idle | InputState::Panning { .. } | InputState::Pressed => {
                self.input = InputState::Idle;
                Vec::new()
            }
        }
    }

    // --- Zoom ---

    /// Wheel zoom about the surface center. Positive `delta_y` zooms out.
    pub fn on_wheel(&mut self, delta_y: f64) -> Vec<Action> {
        self.zoom(-delta_y * self.config.wheel_zoom_step)
    }

    /// Change the zoom scale by `delta` about the surface center.
    ///
    /// Only honored in `Panning` mode, and never while the prompt is open.
    pub fn zoom(&mut self, delta: f64) -> Vec<Action> {
        let Some(surface) = self.surface else {
            return Vec::new();
        };
        if !self.mode.allows_zoom() || self.calibration.is_prompting() || delta == 0.0 {
            return Vec::new();
        }
        self.view.zoom_at(surface.center(), delta, self.config.min_scale, self.config.max_scale);
        vec![Action::RenderNeeded]
    }

    /// Feed the current two-finger `distance`. The first call starts the
    /// pinch; later calls zoom by the change since the previous one.
    pub fn on_pinch(&mut self, distance: f64) -> Vec<Action> {
        let last = match self.input {
            InputState::Pinching { last_distance } => last_distance,
            _ => {
                self.begin_pinch(distance);
                return Vec::new();
            }
        };
        self.input = InputState::Pinching { last_distance: distance };
        self.zoom((distance - last) * self.config.pinch_zoom_step)
    }

    // --- Touch ---

    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        if let Some(distance) = pinch_distance(touches) {
            if !matches!(self.input, InputState::Pinching { .. }) {
                return self.begin_pinch(distance);
            }
            return Vec::new();
        }
        match touches.first() {
            Some(&touch) => self.on_pointer_down(touch),
            None => Vec::new(),
        }
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        if matches!(self.input, InputState::Pinching { .. }) {
            return match pinch_distance(touches) {
                Some(distance) => self.on_pinch(distance),
                None => Vec::new(),
            };
        }
        match touches.first() {
            Some(&touch) => self.on_pointer_move(touch),
            None => Vec::new(),
        }
    }

    /// A touch lifted at `point` with `remaining` touches still down.
    pub fn on_touch_end(&mut self, point: Point, remaining: usize) -> Vec<Action> {
        if matches!(self.input, InputState::Pinching { .. }) {
            if remaining == 0 {
                self.input = InputState::Idle;
            }
            return Vec::new();
        }
        if remaining == 0 {
            return self.on_pointer_up(point);
        }
        Vec::new()
    }

    // --- Dispatch ---

    /// Route a serialized host event to its handler.
    ///
    /// A rejected prompt confirmation is reported as
    /// [`Action::CalibrationRejected`] rather than an error.
    pub fn dispatch(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::LoadImage { width, height } => self.load_image(width, height),
            Event::Resize { width, height } => self.set_container(width, height),
            Event::PointerDown { x, y } => self.on_pointer_down(Point::new(x, y)),
            Event::PointerMove { x, y } => self.on_pointer_move(Point::new(x, y)),
            Event::PointerUp { x, y } => self.on_pointer_up(Point::new(x, y)),
            Event::Wheel { delta_y } => self.on_wheel(delta_y),
            Event::TouchStart { touches } => self.on_touch_start(&touches),
            Event::TouchMove { touches } => self.on_touch_move(&touches),
            Event::TouchEnd { x, y, remaining } => self.on_touch_end(Point::new(x, y), remaining),
            Event::SetMode { mode } => self.set_mode(mode),
            Event::ResetAll => self.reset_all(),
            Event::DeletePolygon { index } => self.delete_polygon(index),
            Event::ConfirmCalibration { length } => match self.confirm_calibration_input(&length) {
                Ok(actions) => actions,
                Err(e) => vec![Action::CalibrationRejected { reason: e.to_string() }],
            },
            Event::CancelCalibration => self.cancel_calibration(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Render surface size; `None` until an image is loaded.
    #[must_use]
    pub fn surface(&self) -> Option<Surface> {
        self.surface
    }

    #[must_use]
    pub fn polygons(&self) -> &PolygonSet {
        &self.polygons
    }

    #[must_use]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[must_use]
    pub fn input(&self) -> InputState {
        self.input
    }

    #[must_use]
    pub fn scale_factor(&self) -> Option<f64> {
        self.calibration.scale_factor()
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Price the current totals.
    #[must_use]
    pub fn estimate(&self, rates: Rates, complexity: Complexity) -> Estimate {
        Estimate::compute(self.totals, rates, complexity)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let drag_target = match self.input {
            InputState::Dragging { target } => Some(target),
            _ => None,
        };
        Snapshot {
            mode: self.mode,
            view: self.view,
            surface: self.surface,
            polygons: self.polygons.committed().to_vec(),
            centers: self.polygons.centers(),
            draft: self.polygons.draft().clone(),
            calibration: CalibrationSnapshot {
                line: self.calibration.line(),
                known_length: self.calibration.known_length(),
                scale_factor: self.calibration.scale_factor(),
                phase: self.calibration.phase(),
                prompt_open: self.calibration.is_prompting(),
            },
            totals: self.totals,
            drag_target,
        }
    }

    // --- Internals ---

    fn refit(&mut self) {
        let container = self
            .container
            .unwrap_or_else(|| Surface::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT));
        self.surface = self.image.and_then(|image| Surface::fit(image, container));
    }

    fn min_span(&self, surface: Surface) -> f64 {
        self.config.min_line_fraction * surface.min_side()
    }

    fn span_rules(&self, surface: Surface) -> SpanRules {
        SpanRules { min_span: self.min_span(surface), auto_prompt_span: self.config.auto_prompt_span_px }
    }

    fn settled_line(&self) -> Option<CalibrationLine> {
        (self.calibration.phase() == Phase::Settled)
            .then(|| self.calibration.line())
            .flatten()
    }

    fn hits_label(&self, screen: Point, line: &CalibrationLine, surface: Surface) -> bool {
        hit::hits_length_label(
            screen,
            line,
            &self.view,
            surface,
            self.config.label_width_px,
            self.config.label_height_px,
        )
    }

    fn begin_pinch(&mut self, distance: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        // A second finger ends any single-finger gesture; an unfinished sketch is dropped.
        if self.input == InputState::SketchingLine {
            actions.extend(self.abandon_calibration());
            self.refresh_totals(&mut actions);
            actions.push(Action::RenderNeeded);
        }
        debug!(distance, "pinch started");
        self.input = InputState::Pinching { last_distance: distance };
        actions
    }

    /// Roll back a pending sketch or close a reopened prompt.
    fn abandon_calibration(&mut self) -> Vec<Action> {
        let Some(surface) = self.surface else {
            return Vec::new();
        };
        let was_prompting = self.calibration.is_prompting();
        if self.calibration.cancel(surface) && was_prompting {
            return vec![Action::CloseCalibrationPrompt];
        }
        Vec::new()
    }

    fn close_prompt_if_open(&self) -> Vec<Action> {
        if self.calibration.is_prompting() { vec![Action::CloseCalibrationPrompt] } else { Vec::new() }
    }

    fn release_actions(&mut self, release: Release) -> Vec<Action> {
        let mut actions = Vec::new();
        match release {
            Release::Ignored => return actions,
            Release::Discarded => actions.push(Action::CalibrationDiscarded),
            Release::Prompt => actions.push(Action::OpenCalibrationPrompt {
                initial_length: self.calibration.prompt_length(self.config.default_calibration_length),
            }),
            Release::AwaitSecondClick => {}
        }
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    fn confirm_actions(&mut self, outcome: ConfirmOutcome) -> Vec<Action> {
        let mut actions = vec![Action::CloseCalibrationPrompt];
        if outcome == ConfirmOutcome::Discarded {
            actions.push(Action::CalibrationDiscarded);
        }
        self.refresh_totals(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    fn refresh_totals(&mut self, actions: &mut Vec<Action>) {
        let totals = metrics::totals(self.polygons.committed(), self.calibration.scale_factor());
        if totals != self.totals {
            self.totals = totals;
            actions.push(Action::TotalsChanged(totals));
        }
    }
}

/// The full engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, core: EngineCore::new() }
    }

    #[must_use]
    pub fn with_config(canvas: HtmlCanvasElement, config: EngineConfig) -> Self {
        Self { canvas, core: EngineCore::with_config(config) }
    }

    /// Refit the surface to the canvas element's laid-out size.
    pub fn sync_surface(&mut self) -> Vec<Action> {
        let width = f64::from(self.canvas.client_width());
        let height = f64::from(self.canvas.client_height());
        self.core.set_container(width, height)
    }

    // --- Delegated handlers ---

    pub fn load_image(&mut self, width: f64, height: f64) -> Vec<Action> {
        let mut actions = self.sync_surface();
        actions.extend(self.core.load_image(width, height));
        actions
    }

    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        self.core.set_mode(mode)
    }

    pub fn reset_all(&mut self) -> Vec<Action> {
        self.core.reset_all()
    }

    pub fn delete_polygon(&mut self, index: usize) -> Vec<Action> {
        self.core.delete_polygon(index)
    }

    /// # Errors
    ///
    /// See [`EngineCore::confirm_calibration`].
    pub fn confirm_calibration(&mut self, length: f64) -> Result<Vec<Action>, CalibrationError> {
        self.core.confirm_calibration(length)
    }

    /// # Errors
    ///
    /// See [`EngineCore::confirm_calibration_input`].
    pub fn confirm_calibration_input(&mut self, input: &str) -> Result<Vec<Action>, CalibrationError> {
        self.core.confirm_calibration_input(input)
    }

    pub fn cancel_calibration(&mut self) -> Vec<Action> {
        self.core.cancel_calibration()
    }

    pub fn on_pointer_down(&mut self, screen: Point) -> Vec<Action> {
        self.core.on_pointer_down(screen)
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        self.core.on_pointer_move(screen)
    }

    pub fn on_pointer_up(&mut self, screen: Point) -> Vec<Action> {
        self.core.on_pointer_up(screen)
    }

    pub fn on_wheel(&mut self, delta_y: f64) -> Vec<Action> {
        self.core.on_wheel(delta_y)
    }

    pub fn zoom(&mut self, delta: f64) -> Vec<Action> {
        self.core.zoom(delta)
    }

    pub fn on_pinch(&mut self, distance: f64) -> Vec<Action> {
        self.core.on_pinch(distance)
    }

    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        self.core.on_touch_start(touches)
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        self.core.on_touch_move(touches)
    }

    pub fn on_touch_end(&mut self, point: Point, remaining: usize) -> Vec<Action> {
        self.core.on_touch_end(point, remaining)
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Action> {
        self.core.dispatch(event)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.core.snapshot()
    }
}
