#![allow(clippy::float_cmp)]

use super::*;

const VARS: [&str; 9] = [
    "LAWNEST_HIT_RADIUS_PX",
    "LAWNEST_CLOSE_RADIUS_PX",
    "LAWNEST_MIN_SCALE",
    "LAWNEST_MAX_SCALE",
    "LAWNEST_MIN_LINE_FRACTION",
    "LAWNEST_AUTO_PROMPT_SPAN_PX",
    "LAWNEST_WHEEL_ZOOM_STEP",
    "LAWNEST_PINCH_ZOOM_STEP",
    "LAWNEST_DEFAULT_CALIBRATION_LENGTH",
];

/// Serializes env-mutating tests within this binary.
static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK`; no other test in the crate touches `LAWNEST_*`.
unsafe fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn default_matches_constants() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.hit_radius_px, 20.0);
    assert_eq!(cfg.close_radius_px, 20.0);
    assert_eq!(cfg.min_scale, 1.0);
    assert_eq!(cfg.max_scale, 5.0);
    assert_eq!(cfg.min_line_fraction, 0.05);
    assert_eq!(cfg.auto_prompt_span_px, 30.0);
    assert_eq!(cfg.default_calibration_length, 10.0);
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_env_without_overrides_is_default() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_env() };

    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg, EngineConfig::default());
}

#[test]
fn from_env_applies_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("LAWNEST_HIT_RADIUS_PX", "32");
        std::env::set_var("LAWNEST_MAX_SCALE", " 8.5 ");
        std::env::set_var("LAWNEST_DEFAULT_CALIBRATION_LENGTH", "25");
    }

    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg.hit_radius_px, 32.0);
    assert_eq!(cfg.max_scale, 8.5);
    assert_eq!(cfg.default_calibration_length, 25.0);
    assert_eq!(cfg.close_radius_px, 20.0);

    unsafe { clear_env() };
}

#[test]
fn from_env_rejects_unparsable_value() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("LAWNEST_MIN_SCALE", "one");
    }

    let err = EngineConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { var: "LAWNEST_MIN_SCALE", .. }));
    assert!(err.to_string().contains("LAWNEST_MIN_SCALE"));

    unsafe { clear_env() };
}

#[test]
fn from_env_rejects_inverted_scale_limits() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("LAWNEST_MIN_SCALE", "6");
    }

    let err = EngineConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("exceeds max_scale"));

    unsafe { clear_env() };
}

#[test]
fn validate_rejects_non_positive_radius() {
    let cfg = EngineConfig { hit_radius_px: 0.0, ..EngineConfig::default() };
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("hit_radius_px"));
}

#[test]
fn validate_rejects_negative_zoom_step() {
    let cfg = EngineConfig { wheel_zoom_step: -0.1, ..EngineConfig::default() };
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn deserialize_partial_json_fills_defaults() {
    let cfg: EngineConfig = serde_json::from_str(r#"{ "hit_radius_px": 12.0, "max_scale": 3.0 }"#).unwrap();
    assert_eq!(cfg.hit_radius_px, 12.0);
    assert_eq!(cfg.max_scale, 3.0);
    assert_eq!(cfg.min_scale, 1.0);
    assert_eq!(cfg.label_width_px, 80.0);
}
