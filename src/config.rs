//! Engine tunables with environment overrides.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Deserialize;

use crate::consts::{
    AUTO_PROMPT_SPAN_PX, CLOSE_RADIUS_PX, DEFAULT_CALIBRATION_LENGTH, HIT_RADIUS_PX, LABEL_HEIGHT_PX, LABEL_WIDTH_PX,
    MAX_SCALE, MIN_LINE_FRACTION, MIN_SCALE, PINCH_ZOOM_STEP, WHEEL_ZOOM_STEP,
};

/// Error returned by [`EngineConfig::from_env`] and [`EngineConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable is set but does not parse as a number.
    #[error("invalid value for {var}: {value:?}")]
    Parse { var: &'static str, value: String },
    /// The values parse but contradict each other or are out of range.
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// Tunables for hit-testing, zoom and calibration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grab radius in screen pixels for vertices and calibration endpoints.
    pub hit_radius_px: f64,
    /// Radius in screen pixels around a draft's first vertex that closes it.
    pub close_radius_px: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Calibration lines shorter than this fraction of the surface's smaller side are discarded.
    pub min_line_fraction: f64,
    /// Dragged calibration lines longer than this (surface pixels) open the prompt on release.
    pub auto_prompt_span_px: f64,
    pub wheel_zoom_step: f64,
    pub pinch_zoom_step: f64,
    pub label_width_px: f64,
    pub label_height_px: f64,
    /// Prompt pre-fill before any length has been confirmed.
    pub default_calibration_length: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_radius_px: HIT_RADIUS_PX,
            close_radius_px: CLOSE_RADIUS_PX,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            min_line_fraction: MIN_LINE_FRACTION,
            auto_prompt_span_px: AUTO_PROMPT_SPAN_PX,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            pinch_zoom_step: PINCH_ZOOM_STEP,
            label_width_px: LABEL_WIDTH_PX,
            label_height_px: LABEL_HEIGHT_PX,
            default_calibration_length: DEFAULT_CALIBRATION_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables, defaulting anything unset.
    ///
    /// Optional:
    /// - `LAWNEST_HIT_RADIUS_PX`: default 20
    /// - `LAWNEST_CLOSE_RADIUS_PX`: default 20
    /// - `LAWNEST_MIN_SCALE` / `LAWNEST_MAX_SCALE`: default 1 / 5
    /// - `LAWNEST_MIN_LINE_FRACTION`: default 0.05
    /// - `LAWNEST_AUTO_PROMPT_SPAN_PX`: default 30
    /// - `LAWNEST_WHEEL_ZOOM_STEP`: default 0.001
    /// - `LAWNEST_PINCH_ZOOM_STEP`: default 0.01
    /// - `LAWNEST_DEFAULT_CALIBRATION_LENGTH`: default 10
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            hit_radius_px: env_parse_f64("LAWNEST_HIT_RADIUS_PX", defaults.hit_radius_px)?,
            close_radius_px: env_parse_f64("LAWNEST_CLOSE_RADIUS_PX", defaults.close_radius_px)?,
            min_scale: env_parse_f64("LAWNEST_MIN_SCALE", defaults.min_scale)?,
            max_scale: env_parse_f64("LAWNEST_MAX_SCALE", defaults.max_scale)?,
            min_line_fraction: env_parse_f64("LAWNEST_MIN_LINE_FRACTION", defaults.min_line_fraction)?,
            auto_prompt_span_px: env_parse_f64("LAWNEST_AUTO_PROMPT_SPAN_PX", defaults.auto_prompt_span_px)?,
            wheel_zoom_step: env_parse_f64("LAWNEST_WHEEL_ZOOM_STEP", defaults.wheel_zoom_step)?,
            pinch_zoom_step: env_parse_f64("LAWNEST_PINCH_ZOOM_STEP", defaults.pinch_zoom_step)?,
            default_calibration_length: env_parse_f64(
                "LAWNEST_DEFAULT_CALIBRATION_LENGTH",
                defaults.default_calibration_length,
            )?,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("hit_radius_px", self.hit_radius_px),
            ("close_radius_px", self.close_radius_px),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("label_width_px", self.label_width_px),
            ("label_height_px", self.label_height_px),
            ("default_calibration_length", self.default_calibration_length),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("min_line_fraction", self.min_line_fraction),
            ("auto_prompt_span_px", self.auto_prompt_span_px),
            ("wheel_zoom_step", self.wheel_zoom_step),
            ("pinch_zoom_step", self.pinch_zoom_step),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }
}

fn env_parse_f64(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::Parse { var, value: raw }),
        Err(_) => Ok(default),
    }
}
