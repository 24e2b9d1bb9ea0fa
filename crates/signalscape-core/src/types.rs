//! Fundamental scene and simulation types.
//!
//! Scene space is meters, right-handed, with +Y up. All vectors are
//! `glam::DVec3` so they serialize as `[x, y, z]`.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Stable identity of a transmitter within a session.
pub type TransmitterId = u32;

/// A placed radio transmitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transmitter {
    pub id: TransmitterId,
    /// Antenna position in scene space (meters).
    pub position: DVec3,
    /// Transmit power (dBm).
    pub power_dbm: f64,
    /// Carrier frequency (MHz).
    pub frequency_mhz: f64,
    /// Display color used by the rendering layer.
    pub color: [u8; 3],
    #[serde(default)]
    pub mobility: Mobility,
}

/// How a transmitter moves between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum Mobility {
    #[default]
    Stationary,
    /// Circular orbit in the horizontal plane at a fixed altitude.
    Orbit {
        /// Orbit center; only x and z are used.
        center: DVec3,
        radius: f64,
        /// Absolute height of the orbit (meters).
        altitude: f64,
        /// Radians per second, positive is counter-clockwise seen from above.
        angular_speed: f64,
        /// Current angle (radians).
        phase: f64,
    },
    /// Closed loop through an ordered list of points.
    Waypoints {
        points: Vec<DVec3>,
        /// Meters per second along the path.
        speed: f64,
        /// Index of the waypoint the current segment starts at.
        current_idx: usize,
        /// Fraction of the current segment already covered, in [0, 1).
        progress: f64,
    },
}

impl Mobility {
    /// Whether this mode moves the transmitter at all.
    pub fn is_mobile(&self) -> bool {
        match self {
            Mobility::Stationary => false,
            Mobility::Orbit { angular_speed, .. } => *angular_speed != 0.0,
            Mobility::Waypoints { points, speed, .. } => points.len() >= 2 && *speed > 0.0,
        }
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}
