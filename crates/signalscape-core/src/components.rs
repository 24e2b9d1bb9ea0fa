//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Session logic lives in systems, not components.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::TransmitterId;

/// Radio settings of a transmitter entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Radio {
    pub id: TransmitterId,
    pub power_dbm: f64,
    pub frequency_mhz: f64,
    pub color: [u8; 3],
}

/// Scene position of an entity (meters, +Y up).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location(pub DVec3);

/// Marks the drive-test probe vehicle. Moves with a `Mobility::Waypoints` component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeVehicle {
    /// Best server (slice index, id) at the last probe, for handover detection.
    pub last_best: Option<(usize, TransmitterId)>,
    /// Probes run so far.
    pub samples: usize,
}
