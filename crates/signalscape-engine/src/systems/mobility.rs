//! Mobility system.
//!
//! Advances every entity with `Mobility` + `Location` by one step and
//! writes the new state back.

use hecs::World;

use signalscape_core::components::{Location, Radio};
use signalscape_core::types::Mobility;

use crate::mobility::advance;

/// Run mobility for all movable entities. Returns true if any transmitter moved.
pub fn run(world: &mut World, dt: f64) -> bool {
    let mut transmitter_moved = false;
    for (_entity, (mobility, location, radio)) in
        world.query_mut::<(&mut Mobility, &mut Location, Option<&Radio>)>()
    {
        if !mobility.is_mobile() {
            continue;
        }
        let step = advance(mobility, location.0, dt);
        if step.position != location.0 && radio.is_some() {
            transmitter_moved = true;
        }
        *mobility = step.mobility;
        location.0 = step.position;
    }
    transmitter_moved
}
