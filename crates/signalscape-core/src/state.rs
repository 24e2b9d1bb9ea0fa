//! Engine results and the per-tick session snapshot consumed by rendering.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{SimTime, Transmitter, TransmitterId};

/// One ray-marching segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHop {
    pub origin: DVec3,
    pub hit_point: DVec3,
    /// Euclidean length of the segment (meters).
    pub distance_m: f64,
    /// Free-space path loss over this segment (dB).
    pub fspl_db: f64,
    /// Loss at the reflection that started this segment; zero on the first hop.
    pub reflection_loss_db: f64,
    pub material: HopMaterial,
    /// Received power at `hit_point` (dBm).
    pub power_dbm: f64,
}

/// The ordered hops of one sampled ray direction from one transmitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayBundle {
    pub transmitter_id: TransmitterId,
    /// Unit launch direction.
    pub direction: DVec3,
    pub hops: Vec<RayHop>,
}

impl RayBundle {
    /// Received power after the last hop.
    pub fn final_power_dbm(&self) -> Option<f64> {
        self.hops.last().map(|hop| hop.power_dbm)
    }

    /// Polyline vertices: launch origin followed by every hit point.
    pub fn polyline(&self) -> Vec<DVec3> {
        let mut points = Vec::with_capacity(self.hops.len() + 1);
        if let Some(first) = self.hops.first() {
            points.push(first.origin);
        }
        points.extend(self.hops.iter().map(|hop| hop.hit_point));
        points
    }
}

/// Per-transmitter row of a probe result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeRow {
    pub transmitter_id: TransmitterId,
    /// Position of the transmitter in the probed slice.
    pub index: usize,
    pub received_power_dbm: f64,
    /// FSPL plus obstruction penalty (dB).
    pub path_loss_db: f64,
    pub line_of_sight: bool,
    pub distance_m: f64,
    pub frequency_mhz: f64,
}

/// Signal analysis at one point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub point: DVec3,
    /// Rows ranked by received power, strongest first.
    pub rows: Vec<ProbeRow>,
    /// Index of the best server in the probed slice.
    pub best_index: Option<usize>,
    /// Best minus second-best power (dB). `None` means unbounded.
    pub margin_db: Option<f64>,
    pub best_power_dbm: Option<f64>,
    pub quality: QualityTier,
    /// Transmitters received above the strong-signal level.
    pub interference_count: usize,
    pub handover_stable: bool,
    /// Softmax blending weights, in probed-slice order.
    pub weights: Vec<f64>,
}

impl ProbeResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn best_row(&self) -> Option<&ProbeRow> {
        self.rows.first()
    }

    /// Margin as a number, with unbounded mapped to infinity.
    pub fn margin_or_infinite(&self) -> f64 {
        self.margin_db.unwrap_or(f64::INFINITY)
    }
}

/// A change of best server along a drive route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandoverEvent {
    pub position: DVec3,
    /// Index of the drive sample at which the new server took over.
    pub sample_index: usize,
    pub from_index: usize,
    pub to_index: usize,
    pub from_id: TransmitterId,
    pub to_id: TransmitterId,
}

/// One resampled point of a drive route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    pub position: DVec3,
    pub color: TraceColor,
    pub best_power_dbm: Option<f64>,
    pub best_index: Option<usize>,
}

/// Aggregate figures over one drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveSummary {
    pub sample_count: usize,
    pub handover_count: usize,
    pub mean_best_power_dbm: Option<f64>,
    pub min_best_power_dbm: Option<f64>,
    /// Share of samples per bucket: green, yellow, orange, red.
    pub color_shares: [f64; 4],
}

/// Output of a drive-test analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveTestResult {
    pub trace: Vec<TraceSample>,
    pub handovers: Vec<HandoverEvent>,
    pub summary: DriveSummary,
}

/// Probe vehicle state for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleView {
    pub position: DVec3,
    /// Latest throttled analysis at the vehicle, if any has run.
    pub probe: Option<ProbeResult>,
}

/// Everything the rendering layer needs after one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub time: SimTime,
    /// Copy of the transmitter set, ordered by id.
    pub transmitters: Vec<Transmitter>,
    /// Revision of the transmitter set the snapshot was taken at.
    pub revision: u64,
    /// Revision the current bundles were built for.
    pub bundles_revision: Option<u64>,
    pub bundles: Vec<RayBundle>,
    pub vehicle: Option<VehicleView>,
    pub events: Vec<crate::events::SessionEvent>,
    /// Camera requests queued since the previous tick.
    #[serde(default)]
    pub camera: Vec<crate::commands::CameraCommand>,
}
