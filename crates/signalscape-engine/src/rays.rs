//! Ray propagation: Fibonacci-sphere ray bundles marched through reflections.
//!
//! Each ray starts just outside the transmitter, takes the nearest surface
//! hit, pays free-space loss for the hop (plus the reflection loss of the
//! surface it lands on, from the second hop on), mirrors about the
//! surface normal and continues. Marching stops after `max_bounces`
//! reflections, at the power floor, or when nothing is hit.

use std::f64::consts::PI;

use glam::DVec3;

use signalscape_core::config::EngineConfig;
use signalscape_core::constants::*;
use signalscape_core::enums::HopMaterial;
use signalscape_core::state::{RayBundle, RayHop};
use signalscape_core::types::Transmitter;
use signalscape_scene::index::{cast_ray, safe_normalize, GeometryIndex};

use crate::path_loss::{free_space_path_loss, reflect, reflection_loss};

/// Limits applied while marching one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchParams {
    pub max_bounces: u32,
    pub max_range_m: f64,
}

impl Default for MarchParams {
    fn default() -> Self {
        Self {
            max_bounces: MAX_BOUNCES,
            max_range_m: MAX_RAY_RANGE_M,
        }
    }
}

impl From<&EngineConfig> for MarchParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_bounces: config.max_bounces,
            max_range_m: config.max_ray_range_m,
        }
    }
}

/// `count` near-uniform unit directions on the sphere. Deterministic.
pub fn fibonacci_directions(count: u32) -> Vec<DVec3> {
    let n = count as f64;
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n;
            let radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            DVec3::new(radius * theta.cos(), y, radius * theta.sin())
        })
        .collect()
}

/// Cast `ray_count` rays from `transmitter` with at most `max_bounces` reflections each.
///
/// Rays that hit nothing are dropped, so the result may hold fewer bundles than rays.
pub fn build_ray_bundles<G: GeometryIndex + ?Sized>(
    transmitter: &Transmitter,
    index: &G,
    ray_count: u32,
    max_bounces: u32,
) -> Vec<RayBundle> {
    let params = MarchParams {
        max_bounces,
        ..Default::default()
    };
    build_ray_bundles_with(transmitter, index, ray_count, &params)
}

/// [`build_ray_bundles`] with explicit march limits.
pub fn build_ray_bundles_with<G: GeometryIndex + ?Sized>(
    transmitter: &Transmitter,
    index: &G,
    ray_count: u32,
    params: &MarchParams,
) -> Vec<RayBundle> {
    fibonacci_directions(ray_count)
        .into_iter()
        .filter_map(|direction| march_ray(transmitter, index, direction, params))
        .collect()
}

/// March a single ray. Returns `None` if the first cast hits nothing.
pub fn march_ray<G: GeometryIndex + ?Sized>(
    transmitter: &Transmitter,
    index: &G,
    direction: DVec3,
    params: &MarchParams,
) -> Option<RayBundle> {
    let launch = safe_normalize(direction)?;
    let mut origin = transmitter.position + launch * TRANSMITTER_CLEARANCE_M;
    let mut heading = launch;
    let mut power = transmitter.power_dbm;
    let mut hops = Vec::with_capacity(params.max_bounces as usize + 1);

    for _ in 0..=params.max_bounces {
        let Some(hit) = cast_ray(index, origin, heading, params.max_range_m) else {
            break;
        };

        // Non-negative so power never rises, even below ~1 MHz.
        let fspl = free_space_path_loss(hit.distance, transmitter.frequency_mhz).max(0.0);
        // Later hops pay for the surface they land on.
        let (material, reflection_db) = if hops.is_empty() {
            (HopMaterial::LineOfSight, 0.0)
        } else {
            (
                HopMaterial::Surface(hit.material),
                reflection_loss(hit.material, hit.normal, heading),
            )
        };
        power -= fspl + reflection_db;

        hops.push(RayHop {
            origin,
            hit_point: hit.point,
            distance_m: hit.distance,
            fspl_db: fspl,
            reflection_loss_db: reflection_db,
            material,
            power_dbm: power,
        });

        if power <= POWER_FLOOR_DBM {
            break;
        }

        let Some(reflected) = safe_normalize(reflect(heading, hit.normal)) else {
            break;
        };
        origin = hit.point + reflected * RAY_ORIGIN_OFFSET_M;
        heading = reflected;
    }

    (!hops.is_empty()).then(|| RayBundle {
        transmitter_id: transmitter.id,
        direction: launch,
        hops,
    })
}
