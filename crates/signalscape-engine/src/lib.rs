//! RF propagation engine for Signalscape.
//!
//! Pure propagation functions (path loss, ray bundles, point probe,
//! interference field, drive test, mobility) plus `RfSession`, which owns
//! the transmitter set as hecs entities, runs systems per tick and
//! produces `SessionSnapshot`s for the rendering layer.

pub mod cache;
pub mod engine;
pub mod explain;
pub mod interference;
pub mod mobility;
pub mod path_loss;
pub mod probe;
pub mod rays;
pub mod rebuild;
pub mod systems;
pub mod throttle;
pub mod world_setup;

pub use signalscape_core as core;
pub use signalscape_scene as scene;

pub use drive_test::{analyze_path, resample_path, trace_color};
pub use engine::RfSession;
pub use interference::{field_value, FieldSources};
pub use path_loss::{free_space_path_loss, reflection_loss};
pub use probe::{probe, Prober};
pub use rays::build_ray_bundles;
