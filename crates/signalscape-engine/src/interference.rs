//! Interference field: a time-animated superposition of transmitter waves.
//!
//! Each source contributes `sqrt(P_W) / d * cos(w t - k d)`. The wavenumber
//! is stretched and the angular frequency slowed so fringes are visible at
//! city scale and real time. The summed field `E` is mapped to a display
//! intensity `1 - exp(-scale * E^2)` in [0, 1].

use std::f64::consts::TAU;

use glam::DVec3;

use signalscape_core::config::EngineConfig;
use signalscape_core::constants::*;
use signalscape_core::types::Transmitter;

use crate::path_loss::dbm_to_watts;

/// Scaling applied to the physical wave before display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    pub max_sources: usize,
    pub spatial_stretch: f64,
    pub time_slowdown: f64,
    pub intensity_scale: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            max_sources: FIELD_MAX_SOURCES,
            spatial_stretch: FIELD_SPATIAL_STRETCH,
            time_slowdown: FIELD_TIME_SLOWDOWN,
            intensity_scale: FIELD_INTENSITY_SCALE,
        }
    }
}

impl From<&EngineConfig> for FieldParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_sources: config.field_max_sources,
            spatial_stretch: config.field_spatial_stretch,
            time_slowdown: config.field_time_slowdown,
            intensity_scale: config.field_intensity_scale,
        }
    }
}

/// Per-transmitter wave constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSource {
    pub position: DVec3,
    /// `sqrt(P_W)`.
    pub amplitude: f64,
    /// Stretched wavenumber (rad/m).
    pub wavenumber: f64,
    /// Slowed angular frequency (rad/s).
    pub angular_frequency: f64,
}

impl FieldSource {
    /// `None` for a transmitter with an unusable power or frequency.
    pub fn new(tx: &Transmitter, params: &FieldParams) -> Option<Self> {
        if !(tx.power_dbm.is_finite() && tx.frequency_mhz.is_finite() && tx.frequency_mhz > 0.0) {
            return None;
        }
        let frequency_hz = tx.frequency_mhz * 1.0e6;
        let wavelength = SPEED_OF_LIGHT / frequency_hz;
        Some(Self {
            position: tx.position,
            amplitude: dbm_to_watts(tx.power_dbm).sqrt(),
            wavenumber: TAU / wavelength / params.spatial_stretch.max(EPSILON),
            angular_frequency: TAU * frequency_hz / params.time_slowdown.max(EPSILON),
        })
    }

    /// Instantaneous contribution at `point`.
    pub fn contribution(&self, point: DVec3, time: f64) -> f64 {
        let d = self.position.distance(point).max(FIELD_MIN_DISTANCE_M);
        self.amplitude / d * (self.angular_frequency * time - self.wavenumber * d).cos()
    }
}

/// A horizontal grid for sampling the field into a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPlane {
    /// Minimum x/z corner; `y` is the plane height.
    pub origin: DVec3,
    pub size_x: f64,
    pub size_z: f64,
    pub columns: usize,
    pub rows: usize,
}

impl FieldPlane {
    /// Center of cell (`column`, `row`).
    pub fn cell_center(&self, column: usize, row: usize) -> DVec3 {
        let cols = self.columns.max(1) as f64;
        let rows = self.rows.max(1) as f64;
        DVec3::new(
            self.origin.x + (column as f64 + 0.5) * self.size_x / cols,
            self.origin.y,
            self.origin.z + (row as f64 + 0.5) * self.size_z / rows,
        )
    }
}

/// Precomputed wave constants for the current transmitter set.
///
/// Rebuild when the set changes; evaluation itself is allocation-free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSources {
    sources: Vec<FieldSource>,
    intensity_scale: f64,
}

impl FieldSources {
    /// The first `max_sources` usable transmitters, in input order.
    pub fn new(transmitters: &[Transmitter], params: &FieldParams) -> Self {
        let sources: Vec<FieldSource> = transmitters
            .iter()
            .filter_map(|tx| FieldSource::new(tx, params))
            .take(params.max_sources)
            .collect();
        if transmitters.len() > sources.len() {
            tracing::debug!(
                transmitters = transmitters.len(),
                sources = sources.len(),
                "interference field limited to a subset of transmitters"
            );
        }
        Self {
            sources,
            intensity_scale: params.intensity_scale,
        }
    }

    pub fn sources(&self) -> &[FieldSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Summed field `E` at `point` and `time`.
    pub fn amplitude(&self, point: DVec3, time: f64) -> f64 {
        self.sources
            .iter()
            .map(|source| source.contribution(point, time))
            .sum()
    }

    /// Display intensity in [0, 1].
    pub fn intensity(&self, point: DVec3, time: f64) -> f64 {
        let e = self.amplitude(point, time);
        let value = 1.0 - (-self.intensity_scale * e * e).exp();
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Evaluate every cell of `plane` into `out`, row-major, rows along z.
    pub fn sample_plane(&self, plane: &FieldPlane, time: f64, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(plane.columns * plane.rows);
        for row in 0..plane.rows {
            for column in 0..plane.columns {
                out.push(self.intensity(plane.cell_center(column, row), time) as f32);
            }
        }
    }
}

/// Display intensity of the interference field at `point` and `time` (seconds).
pub fn field_value(point: DVec3, transmitters: &[Transmitter], time: f64) -> f64 {
    FieldSources::new(transmitters, &FieldParams::default()).intensity(point, time)
}
