#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn surface() -> Surface {
    Surface::new(1000.0, 500.0)
}

fn rules() -> SpanRules {
    // 5% of the 500px side.
    SpanRules { min_span: 25.0, auto_prompt_span: 30.0 }
}

// Normalized point from surface pixels on the 1000x500 surface.
fn px(x: f64, y: f64) -> Point {
    Point::new(x / 1000.0, y / 500.0)
}

/// Drag-sketch a line from `a` to `b` and confirm `length`.
fn confirmed(a: Point, b: Point, length: f64) -> Calibration {
    let mut cal = Calibration::new();
    cal.begin(a, surface());
    cal.extend(b, surface());
    assert_eq!(cal.release(b, surface(), rules()), Release::Prompt);
    cal.confirm(length, surface(), rules().min_span).unwrap();
    cal
}

// --- CalibrationLine ---

#[test]
fn line_at_has_coincident_endpoints() {
    let line = CalibrationLine::at(px(10.0, 10.0));
    assert_eq!(line.p1, line.p2);
    assert_eq!(line.pixel_span(surface()), 0.0);
}

#[test]
fn line_pixel_span_uses_surface_pixels() {
    let line = CalibrationLine { p1: px(100.0, 100.0), p2: px(400.0, 500.0) };
    assert!(approx_eq(line.pixel_span(surface()), 500.0));
}

#[test]
fn line_with_endpoint_replaces_only_that_end() {
    let line = CalibrationLine { p1: px(0.0, 0.0), p2: px(10.0, 0.0) };
    let moved = line.with_endpoint(LineEnd::P1, px(5.0, 5.0));
    assert_eq!(moved.p1, px(5.0, 5.0));
    assert_eq!(moved.p2, line.p2);
    assert_eq!(moved.endpoint(LineEnd::P2), line.p2);
}

#[test]
fn line_midpoint() {
    let line = CalibrationLine { p1: Point::new(0.2, 0.2), p2: Point::new(0.4, 0.6) };
    let m = line.midpoint();
    assert!(approx_eq(m.x, 0.3));
    assert!(approx_eq(m.y, 0.4));
}

// --- Fresh state ---

#[test]
fn new_calibration_has_no_scale() {
    let cal = Calibration::new();
    assert!(cal.line().is_none());
    assert!(cal.known_length().is_none());
    assert!(cal.scale_factor().is_none());
    assert_eq!(cal.phase(), Phase::Settled);
}

#[test]
fn prompt_length_falls_back_to_default() {
    let cal = Calibration::new();
    assert_eq!(cal.prompt_length(10.0), 10.0);
}

// --- Drag-to-draw ---

#[test]
fn drag_sketch_tracks_p2_live() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    assert!(cal.is_sketching());
    assert!(cal.extend(px(150.0, 100.0), surface()));
    assert_eq!(cal.line().unwrap().p2, px(150.0, 100.0));
    assert_eq!(cal.phase(), Phase::Sketching { moved: true });
}

#[test]
fn long_drag_release_opens_prompt() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(200.0, 100.0), surface());
    assert_eq!(cal.release(px(200.0, 100.0), surface(), rules()), Release::Prompt);
    assert_eq!(cal.phase(), Phase::Prompting { fresh: true });
    assert!(cal.scale_factor().is_none());
}

#[test]
fn short_drag_release_is_discarded() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(110.0, 100.0), surface());
    assert_eq!(cal.release(px(110.0, 100.0), surface(), rules()), Release::Discarded);
    assert!(cal.line().is_none());
    assert_eq!(cal.phase(), Phase::Settled);
}

#[test]
fn drag_between_thresholds_waits_for_second_click() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(128.0, 100.0), surface());
    let rules = SpanRules { min_span: 25.0, auto_prompt_span: 30.0 };
    assert_eq!(cal.release(px(128.0, 100.0), surface(), rules), Release::AwaitSecondClick);
    assert_eq!(cal.phase(), Phase::AwaitingSecondClick);
}

#[test]
fn extend_without_sketch_is_ignored() {
    let mut cal = Calibration::new();
    assert!(!cal.extend(px(1.0, 1.0), surface()));
    assert!(cal.line().is_none());
}

#[test]
fn release_without_sketch_is_ignored() {
    let mut cal = Calibration::new();
    assert_eq!(cal.release(px(1.0, 1.0), surface(), rules()), Release::Ignored);
}

// --- Click-click ---

#[test]
fn click_without_move_awaits_second_click() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    assert_eq!(cal.release(px(100.0, 100.0), surface(), rules()), Release::AwaitSecondClick);
    let line = cal.line().unwrap();
    assert_eq!(line.p1, line.p2);
}

#[test]
fn second_click_sets_p2_and_prompts() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.release(px(100.0, 100.0), surface(), rules());
    assert_eq!(cal.second_click(px(100.0, 400.0), surface(), rules()), Release::Prompt);
    assert_eq!(cal.line().unwrap().p2, px(100.0, 400.0));
    assert!(cal.is_prompting());
}

#[test]
fn short_second_click_is_discarded() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.release(px(100.0, 100.0), surface(), rules());
    assert_eq!(cal.second_click(px(105.0, 100.0), surface(), rules()), Release::Discarded);
    assert!(cal.line().is_none());
}

#[test]
fn second_click_outside_click_click_is_ignored() {
    let mut cal = Calibration::new();
    assert_eq!(cal.second_click(px(5.0, 5.0), surface(), rules()), Release::Ignored);
}

// --- Confirmation ---

#[test]
fn confirm_sets_scale_to_length_over_pixel_span() {
    let cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    assert_eq!(cal.known_length(), Some(10.0));
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.1));
    assert_eq!(cal.phase(), Phase::Settled);
}

#[test]
fn confirm_reports_applied_scale() {
    let mut cal = Calibration::new();
    cal.begin(px(0.0, 0.0), surface());
    cal.extend(px(300.0, 400.0), surface());
    cal.release(px(300.0, 400.0), surface(), rules());
    let outcome = cal.confirm(50.0, surface(), 25.0).unwrap();
    let ConfirmOutcome::Applied { scale_factor } = outcome else {
        panic!("expected applied, got {outcome:?}");
    };
    assert!(approx_eq(scale_factor, 0.1));
}

#[test]
fn confirm_rejects_zero_negative_and_non_finite() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(200.0, 100.0), surface());
    cal.release(px(200.0, 100.0), surface(), rules());
    for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let err = cal.confirm(bad, surface(), 25.0).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidLength(_)));
    }
    assert!(cal.is_prompting());
    assert!(cal.scale_factor().is_none());
}

#[test]
fn rejected_confirm_keeps_prior_scale() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    assert!(cal.reopen_prompt());
    assert!(cal.confirm(0.0, surface(), 25.0).is_err());
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.1));
    assert!(cal.is_prompting());
}

#[test]
fn confirm_without_line_errors() {
    let mut cal = Calibration::new();
    assert!(matches!(cal.confirm(10.0, surface(), 25.0), Err(CalibrationError::NoLine)));
}

#[test]
fn confirm_requires_open_prompt() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    cal.move_endpoint(LineEnd::P2, px(110.0, 100.0), surface());
    assert!(matches!(cal.confirm(10.0, surface(), 25.0), Err(CalibrationError::NoPrompt)));
    assert!(matches!(cal.confirm_input("10", surface(), 25.0), Err(CalibrationError::NoPrompt)));
    assert!(cal.line().is_some());
    assert_eq!(cal.known_length(), Some(10.0));
    assert!(approx_eq(cal.scale_factor().unwrap(), 1.0));
}

#[test]
fn confirm_mid_sketch_is_refused() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(200.0, 100.0), surface());
    assert!(matches!(cal.confirm(10.0, surface(), 25.0), Err(CalibrationError::NoPrompt)));
    assert_eq!(cal.phase(), Phase::Sketching { moved: true });
    assert!(cal.known_length().is_none());
}

#[test]
fn confirm_input_parses_trimmed_text() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(300.0, 100.0), surface());
    cal.release(px(300.0, 100.0), surface(), rules());
    cal.confirm_input("  40 ", surface(), 25.0).unwrap();
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.2));
}

#[test]
fn confirm_input_rejects_non_numeric_and_empty() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(300.0, 100.0), surface());
    cal.release(px(300.0, 100.0), surface(), rules());
    for bad in ["", "ten", "12ft"] {
        let err = cal.confirm_input(bad, surface(), 25.0).unwrap_err();
        assert!(err.to_string().contains("positive number"), "{bad}: {err}");
    }
    assert!(cal.is_prompting());
}

#[test]
fn confirm_of_degenerate_line_discards_it() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(200.0, 100.0), surface());
    cal.release(px(200.0, 100.0), surface(), rules());
    cal.move_endpoint(LineEnd::P2, px(101.0, 100.0), surface());
    assert_eq!(cal.confirm(10.0, surface(), 25.0).unwrap(), ConfirmOutcome::Discarded);
    assert!(cal.line().is_none());
    assert!(cal.scale_factor().is_none());
}

#[test]
fn discarding_reopened_short_line_forgets_length() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    cal.move_endpoint(LineEnd::P2, px(110.0, 100.0), surface());
    assert!(cal.reopen_prompt());
    assert_eq!(cal.confirm(10.0, surface(), 25.0).unwrap(), ConfirmOutcome::Discarded);
    assert!(cal.line().is_none());
    assert!(cal.known_length().is_none());
    assert!(cal.scale_factor().is_none());
    assert_eq!(cal.prompt_length(7.0), 7.0);
}

// --- Live editing ---

#[test]
fn moving_endpoint_after_confirm_rescales_without_prompt() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    assert!(cal.move_endpoint(LineEnd::P2, px(300.0, 100.0), surface()));
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.05));
    assert_eq!(cal.phase(), Phase::Settled);
    assert_eq!(cal.known_length(), Some(10.0));
}

#[test]
fn collapsing_endpoints_leaves_scale_undefined() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    cal.move_endpoint(LineEnd::P2, px(100.0, 100.0), surface());
    assert!(cal.scale_factor().is_none());
    cal.move_endpoint(LineEnd::P2, px(150.0, 100.0), surface());
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.2));
}

#[test]
fn move_endpoint_without_line_is_noop() {
    let mut cal = Calibration::new();
    assert!(!cal.move_endpoint(LineEnd::P1, px(0.0, 0.0), surface()));
}

// --- Reopen / cancel ---

#[test]
fn reopen_prompt_keeps_line_and_allows_new_length() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    let line = cal.line();
    assert!(cal.reopen_prompt());
    assert_eq!(cal.phase(), Phase::Prompting { fresh: false });
    assert_eq!(cal.prompt_length(99.0), 10.0);
    cal.confirm(20.0, surface(), 25.0).unwrap();
    assert_eq!(cal.line(), line);
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.2));
}

#[test]
fn reopen_prompt_requires_settled_line() {
    let mut cal = Calibration::new();
    assert!(!cal.reopen_prompt());
    cal.begin(px(1.0, 1.0), surface());
    assert!(!cal.reopen_prompt());
}

#[test]
fn cancel_reopened_prompt_just_closes() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    cal.reopen_prompt();
    assert!(cal.cancel(surface()));
    assert_eq!(cal.phase(), Phase::Settled);
    assert!(cal.line().is_some());
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.1));
}

#[test]
fn cancel_first_prompt_drops_line() {
    let mut cal = Calibration::new();
    cal.begin(px(100.0, 100.0), surface());
    cal.extend(px(200.0, 100.0), surface());
    cal.release(px(200.0, 100.0), surface(), rules());
    assert!(cal.cancel(surface()));
    assert!(cal.line().is_none());
    assert!(cal.scale_factor().is_none());
}

#[test]
fn recalibration_sketch_rolls_back_to_confirmed_line() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    let original = cal.line();
    cal.begin(px(500.0, 300.0), surface());
    cal.extend(px(900.0, 300.0), surface());
    // The confirmed line keeps measuring until the new one is confirmed.
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.1));
    cal.release(px(900.0, 300.0), surface(), rules());
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.1));
    assert!(cal.cancel(surface()));
    assert_eq!(cal.line(), original);
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.1));
}

#[test]
fn recalibration_confirm_replaces_line() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    cal.begin(px(500.0, 300.0), surface());
    cal.extend(px(900.0, 300.0), surface());
    cal.release(px(900.0, 300.0), surface(), rules());
    cal.confirm(100.0, surface(), 25.0).unwrap();
    assert_eq!(cal.line().unwrap().p1, px(500.0, 300.0));
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.25));
    // The old line is gone for good.
    cal.begin(px(0.0, 0.0), surface());
    cal.cancel(surface());
    assert_eq!(cal.line().unwrap().p1, px(500.0, 300.0));
}

#[test]
fn rescale_follows_new_surface() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    let half = Surface::new(surface().width / 2.0, surface().height / 2.0);
    cal.rescale(half);
    let span = cal.line().unwrap().pixel_span(half);
    assert!(approx_eq(cal.scale_factor().unwrap(), 10.0 / span));
    assert!(approx_eq(cal.scale_factor().unwrap(), 0.2));
}

#[test]
fn cancel_when_settled_is_noop() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    assert!(!cal.cancel(surface()));
    assert!(cal.line().is_some());
}

#[test]
fn reset_clears_everything() {
    let mut cal = confirmed(px(100.0, 100.0), px(200.0, 100.0), 10.0);
    cal.reset();
    assert!(cal.line().is_none());
    assert!(cal.known_length().is_none());
    assert!(cal.scale_factor().is_none());
}
