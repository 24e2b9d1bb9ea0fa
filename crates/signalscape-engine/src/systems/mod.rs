//! ECS systems that operate on the session world each tick.
//!
//! Systems are pure functions that take `&mut World` (or `&World` for read-only).
//! They do not own state; all state lives in components.

pub mod mobility;
pub mod probe_vehicle;
pub mod snapshot;
