//! Scene geometry for Signalscape.
//!
//! The nearest-hit query seam the engine consumes, a BVH-accelerated
//! triangle index, line-of-sight helpers and a procedural block city
//! for tests and demos.

pub use signalscape_core as core;

pub mod city;
pub mod index;
pub mod los;
pub mod mesh;

// Re-export key types for convenience.
pub use city::{generate_city, CityLayout};
pub use index::{cast_ray, GeometryError, GeometryIndex, Hit, OpenSpace};
pub use los::{first_obstruction, has_line_of_sight};
pub use mesh::{Triangle, TriangleIndex};
