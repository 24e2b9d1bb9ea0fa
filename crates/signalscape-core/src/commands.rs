//! Commands sent from the scene/UI layer to the session.
//!
//! Commands are queued and applied at the next tick boundary, so the
//! transmitter set never changes in the middle of a query.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::{Mobility, TransmitterId};

/// All transmitter and probe mutations a user can make.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionCommand {
    // --- Transmitter placement ---
    /// Place a new transmitter. Missing power/frequency use the defaults.
    AddTransmitter {
        position: DVec3,
        power_dbm: Option<f64>,
        frequency_mhz: Option<f64>,
        #[serde(default)]
        mobility: Mobility,
    },
    /// Remove a transmitter.
    RemoveTransmitter { id: TransmitterId },
    /// Remove every transmitter.
    ClearTransmitters,

    // --- Transmitter edits ---
    MoveTransmitter { id: TransmitterId, position: DVec3 },
    SetPower { id: TransmitterId, power_dbm: f64 },
    SetFrequency { id: TransmitterId, frequency_mhz: f64 },
    SetMobility { id: TransmitterId, mobility: Mobility },
    /// Ask the camera to frame a transmitter.
    FocusTransmitter { id: TransmitterId },

    // --- Drive test ---
    /// Start a probe vehicle looping along a route.
    SetProbeRoute { points: Vec<DVec3>, speed: f64 },
    /// Stop and remove the probe vehicle.
    ClearProbeRoute,
}

/// Requests from the UI to the camera controller, drained once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CameraCommand {
    /// Fly the camera to frame `target`.
    FlyTo { target: DVec3, distance: f64 },
}
