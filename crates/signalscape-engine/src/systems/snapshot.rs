//! Snapshot system: queries the session world and builds a SessionSnapshot.
//!
//! This system is read-only; it never modifies the world.

use hecs::World;

use signalscape_core::commands::CameraCommand;
use signalscape_core::components::{Location, ProbeVehicle, Radio};
use signalscape_core::events::SessionEvent;
use signalscape_core::state::{ProbeResult, RayBundle, SessionSnapshot, VehicleView};
use signalscape_core::types::{Mobility, SimTime, Transmitter};

/// Copy of every transmitter, ordered by id.
pub fn collect_transmitters(world: &World) -> Vec<Transmitter> {
    let mut query = world.query::<(&Radio, &Location, Option<&Mobility>)>();
    let mut transmitters: Vec<Transmitter> = query
        .iter()
        .map(|(_, (radio, location, mobility))| Transmitter {
            id: radio.id,
            position: location.0,
            power_dbm: radio.power_dbm,
            frequency_mhz: radio.frequency_mhz,
            color: radio.color,
            mobility: mobility.cloned().unwrap_or_default(),
        })
        .collect();
    transmitters.sort_by_key(|tx| tx.id);
    transmitters
}

/// Position of the probe vehicle with its latest analysis.
pub fn vehicle_view(world: &World, last_probe: Option<&ProbeResult>) -> Option<VehicleView> {
    let mut query = world.query::<(&ProbeVehicle, &Location)>();
    let (_, (_, location)) = query.iter().next()?;
    Some(VehicleView {
        position: location.0,
        probe: last_probe.cloned(),
    })
}

/// Everything the per-tick snapshot carries besides the world itself.
pub struct SnapshotInputs<'a> {
    pub time: SimTime,
    pub revision: u64,
    pub bundles_revision: Option<u64>,
    pub bundles: &'a [RayBundle],
    pub last_probe: Option<&'a ProbeResult>,
    pub events: Vec<SessionEvent>,
    pub camera: Vec<CameraCommand>,
}

/// Build a complete SessionSnapshot from the current world state.
pub fn build_snapshot(world: &World, inputs: SnapshotInputs<'_>) -> SessionSnapshot {
    SessionSnapshot {
        time: inputs.time,
        transmitters: collect_transmitters(world),
        revision: inputs.revision,
        bundles_revision: inputs.bundles_revision,
        bundles: inputs.bundles.to_vec(),
        vehicle: vehicle_view(world, inputs.last_probe),
        events: inputs.events,
        camera: inputs.camera,
    }
}
