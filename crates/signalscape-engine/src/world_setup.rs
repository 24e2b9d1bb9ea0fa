//! Entity spawn factories for the session world.
//!
//! Creates transmitter and probe-vehicle entities with their component
//! bundles, and looks entities up by transmitter id.

use glam::DVec3;
use hecs::{Entity, World};

use signalscape_core::components::{Location, ProbeVehicle, Radio};
use signalscape_core::constants::*;
use signalscape_core::types::{Mobility, TransmitterId};

/// Spawn a transmitter. Color is picked from the palette by id.
pub fn spawn_transmitter(
    world: &mut World,
    id: TransmitterId,
    position: DVec3,
    power_dbm: f64,
    frequency_mhz: f64,
    mobility: Mobility,
) -> Entity {
    let radio = Radio {
        id,
        power_dbm,
        frequency_mhz,
        color: palette_color(id),
    };
    world.spawn((radio, Location(position), mobility))
}

pub fn palette_color(id: TransmitterId) -> [u8; 3] {
    TRANSMITTER_PALETTE[id as usize % TRANSMITTER_PALETTE.len()]
}

/// Spawn the probe vehicle at the start of `route`, looping along it.
///
/// Returns `None` for an empty route.
pub fn spawn_probe_vehicle(world: &mut World, route: Vec<DVec3>, speed: f64) -> Option<Entity> {
    let start = *route.first()?;
    let speed = if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        PROBE_VEHICLE_SPEED
    };
    let mobility = Mobility::Waypoints {
        points: route,
        speed,
        current_idx: 0,
        progress: 0.0,
    };
    Some(world.spawn((ProbeVehicle::default(), Location(start), mobility)))
}

/// Entity carrying the transmitter with `id`.
pub fn find_transmitter(world: &World, id: TransmitterId) -> Option<Entity> {
    let mut query = world.query::<&Radio>();
    query
        .iter()
        .find(|(_, radio)| radio.id == id)
        .map(|(entity, _)| entity)
}

/// Every transmitter entity with its id.
pub fn transmitter_entities(world: &World) -> Vec<(Entity, TransmitterId)> {
    let mut query = world.query::<&Radio>();
    query.iter().map(|(entity, radio)| (entity, radio.id)).collect()
}

pub fn probe_vehicle_entities(world: &World) -> Vec<Entity> {
    let mut query = world.query::<&ProbeVehicle>();
    query.iter().map(|(entity, _)| entity).collect()
}
