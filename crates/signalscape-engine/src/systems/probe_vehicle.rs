//! Probe vehicle system: live analysis at the drive-test vehicle.
//!
//! Called only on ticks the probe throttle allows. Probes the vehicle's
//! position and reports a handover when the best server changes.

use hecs::World;

use signalscape_core::components::{Location, ProbeVehicle};
use signalscape_core::events::SessionEvent;
use signalscape_core::state::{HandoverEvent, ProbeResult};
use signalscape_core::types::Transmitter;
use signalscape_scene::index::GeometryIndex;

use crate::probe::Prober;

/// Probe the vehicle, if there is one. Returns a copy of the fresh result.
pub fn run<G: GeometryIndex + ?Sized>(
    world: &mut World,
    transmitters: &[Transmitter],
    index: &G,
    prober: &mut Prober,
    events: &mut Vec<SessionEvent>,
) -> Option<ProbeResult> {
    let (_entity, (vehicle, location)) = world
        .query_mut::<(&mut ProbeVehicle, &Location)>()
        .into_iter()
        .next()?;

    let result = prober.probe(location.0, transmitters, index);
    let best = result
        .best_row()
        .map(|row| (row.index, row.transmitter_id));

    if let (Some((from_index, from_id)), Some((to_index, to_id))) = (vehicle.last_best, best) {
        if from_id != to_id {
            let handover = HandoverEvent {
                position: location.0,
                sample_index: vehicle.samples,
                from_index,
                to_index,
                from_id,
                to_id,
            };
            tracing::info!(from = from_id, to = to_id, "probe vehicle handover");
            events.push(SessionEvent::VehicleHandover(handover));
        }
    }
    vehicle.last_best = best;
    vehicle.samples += 1;

    Some(result.clone())
}
