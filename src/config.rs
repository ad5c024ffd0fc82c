use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::renderer::RenderStrategy;

/// Largest canvas side; the draw buffer stores coordinates as bytes.
pub const MAX_CANVAS_SIDE: u32 = 256;

/// Full runtime configuration. Every field has a default so partial JSON files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub render: RenderConfig,
    pub pointer: PointerConfig,
    pub frame_rate: FrameRateConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub strategy: RenderStrategy,
    /// Side of the square painted for every sampled pixel
    pub block_size: u32,
    /// Per-pixel redraw chance for the stochastic strategy
    pub sample_probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    pub smoothing_k: f32,
    pub velocity_mult: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRateConfig {
    pub seed_fps: f64,
    pub smoothing_k: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Simulated frames per second while recording
    pub fps: f64,
    pub frame_delay_ms: u16,
    pub workers: usize,
    /// GIF encoder speed, 1 (best) to 30 (fastest)
    pub quality: i32,
    /// Length of one animation period in radians of simulated phase
    pub period_radians: f64,
    /// Simulated time units per second (engine ticks are in microseconds)
    pub time_units_per_second: f64,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            canvas_width: 256,
            canvas_height: 200,
            render: RenderConfig::default(),
            pointer: PointerConfig::default(),
            frame_rate: FrameRateConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strategy: RenderStrategy::DrawBuffer,
            block_size: 2,
            sample_probability: 0.05,
        }
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            smoothing_k: 5.0,
            velocity_mult: 200.0,
        }
    }
}

impl Default for FrameRateConfig {
    fn default() -> Self {
        Self {
            seed_fps: 60.0,
            smoothing_k: 20.0,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 50.0,
            frame_delay_ms: 20,
            workers: 4,
            quality: 4,
            period_radians: std::f64::consts::TAU,
            time_units_per_second: 1_000_000.0,
        }
    }
}

impl CaptureConfig {
    /// Engine time increment for one captured frame.
    pub fn step_micros(&self) -> f64 {
        self.time_units_per_second / self.fps
    }
}

impl PaintConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_side("canvas_width", self.canvas_width)?;
        check_side("canvas_height", self.canvas_height)?;
        if self.render.block_size == 0 {
            return Err(invalid("render.block_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.render.sample_probability) {
            return Err(invalid("render.sample_probability", "must be within [0, 1]"));
        }
        if self.pointer.smoothing_k < 0.0 {
            return Err(invalid("pointer.smoothing_k", "must not be negative"));
        }
        if self.frame_rate.seed_fps <= 0.0 || !self.frame_rate.seed_fps.is_finite() {
            return Err(invalid("frame_rate.seed_fps", "must be positive"));
        }
        if self.frame_rate.smoothing_k < 0.0 {
            return Err(invalid("frame_rate.smoothing_k", "must not be negative"));
        }
        if self.capture.fps <= 0.0 || !self.capture.fps.is_finite() {
            return Err(invalid("capture.fps", "must be positive"));
        }
        if self.capture.workers == 0 {
            return Err(invalid("capture.workers", "must be at least 1"));
        }
        if !(1..=30).contains(&self.capture.quality) {
            return Err(invalid("capture.quality", "must be within 1..=30"));
        }
        if self.capture.time_units_per_second <= 0.0 {
            return Err(invalid("capture.time_units_per_second", "must be positive"));
        }
        Ok(())
    }
}

fn check_side(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_CANVAS_SIDE {
        return Err(invalid(field, &format!("{value} is outside 1..={MAX_CANVAS_SIDE}")));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PaintConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PaintConfig::from_json_str(r#"{ "capture": { "fps": 25.0 } }"#).unwrap();
        assert_eq!(config.capture.fps, 25.0);
        assert_eq!(config.capture.frame_delay_ms, 20);
        assert_eq!(config.canvas_width, 256);
        assert_eq!(config.render.strategy, RenderStrategy::DrawBuffer);
    }

    #[test]
    fn rejects_oversized_canvas() {
        let err = PaintConfig::from_json_str(r#"{ "canvas_width": 512 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "canvas_width", .. }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            PaintConfig::from_json_str("{ not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn json_round_trip_preserves_strategy() {
        let mut config = PaintConfig::default();
        config.render.strategy = RenderStrategy::Stochastic;
        let json = config.to_json_string().unwrap();
        assert_eq!(PaintConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn capture_step_matches_fifty_hz() {
        assert_eq!(CaptureConfig::default().step_micros(), 20_000.0);
    }
}
