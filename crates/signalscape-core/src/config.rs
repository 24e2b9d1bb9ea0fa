//! Runtime-adjustable engine configuration.
//!
//! Defaults come from `constants`; a JSON document may override any subset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables shared by every engine component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_bounces: u32,
    pub base_ray_count: u32,
    pub min_ray_count: u32,
    pub max_ray_range_m: f64,
    pub obstruction_penalty_db: f64,
    /// Minimum seconds between throttled probe analyses.
    pub probe_interval_secs: f64,
    pub drive_sample_step_m: f64,
    pub field_intensity_scale: f64,
    pub field_spatial_stretch: f64,
    pub field_time_slowdown: f64,
    pub field_max_sources: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_bounces: MAX_BOUNCES,
            base_ray_count: BASE_RAY_COUNT,
            min_ray_count: MIN_RAY_COUNT,
            max_ray_range_m: MAX_RAY_RANGE_M,
            obstruction_penalty_db: OBSTRUCTION_PENALTY_DB,
            probe_interval_secs: PROBE_MIN_INTERVAL_SECS,
            drive_sample_step_m: DRIVE_SAMPLE_STEP_M,
            field_intensity_scale: FIELD_INTENSITY_SCALE,
            field_spatial_stretch: FIELD_SPATIAL_STRETCH,
            field_time_slowdown: FIELD_TIME_SLOWDOWN,
            field_max_sources: FIELD_MAX_SOURCES,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_ray_count == 0 {
            return Err(invalid("min_ray_count", "must be at least 1"));
        }
        if self.base_ray_count < self.min_ray_count {
            return Err(invalid(
                "base_ray_count",
                format!(
                    "{} is below min_ray_count {}",
                    self.base_ray_count, self.min_ray_count
                ),
            ));
        }
        positive("max_ray_range_m", self.max_ray_range_m)?;
        positive("drive_sample_step_m", self.drive_sample_step_m)?;
        positive("field_spatial_stretch", self.field_spatial_stretch)?;
        positive("field_time_slowdown", self.field_time_slowdown)?;
        if !(self.probe_interval_secs.is_finite() && self.probe_interval_secs >= 0.0) {
            return Err(invalid("probe_interval_secs", "must be finite and >= 0"));
        }
        if !(self.obstruction_penalty_db.is_finite() && self.obstruction_penalty_db >= 0.0) {
            return Err(invalid("obstruction_penalty_db", "must be finite and >= 0"));
        }
        if !(self.field_intensity_scale.is_finite() && self.field_intensity_scale >= 0.0) {
            return Err(invalid("field_intensity_scale", "must be finite and >= 0"));
        }
        Ok(())
    }

    /// Rays per transmitter when `transmitter_count` transmitters share the budget.
    pub fn rays_per_transmitter(&self, transmitter_count: usize) -> u32 {
        let count = transmitter_count.max(1) as u32;
        (self.base_ray_count / count).max(self.min_ray_count)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and > 0, got {value}")))
    }
}
