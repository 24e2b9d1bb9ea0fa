//! Procedural block city for tests, demos and benchmarks.
//!
//! A seeded grid of city blocks separated by streets, each block split into
//! lots carrying an extruded box building. Building height drives the
//! material class, with a share of mid/high-rise towers clad in glass.
//! A water front runs along the +Z edge. Same seed = same city.

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use signalscape_core::enums::MaterialClass;

use crate::mesh::TriangleIndex;

/// Buildings below this height are low-rise concrete (meters).
const LOW_RISE_MAX_HEIGHT: f64 = 20.0;

/// Buildings below this height are mid-rise (meters).
const MID_RISE_MAX_HEIGHT: f64 = 60.0;

/// Chance that a lot is left empty.
const EMPTY_LOT_CHANCE: f64 = 0.15;

/// Chance that an occupied low-rise lot is a metal-clad shed instead.
const METAL_SHED_CHANCE: f64 = 0.05;

/// Parameters of a generated city.
#[derive(Debug, Clone)]
pub struct CityLayout {
    pub seed: u64,
    /// Blocks along X.
    pub blocks_x: u32,
    /// Blocks along Z.
    pub blocks_z: u32,
    /// Edge length of a square block (meters).
    pub block_size: f64,
    /// Street width between blocks (meters).
    pub street_width: f64,
    /// Lots per block edge; each block holds `lots_per_side^2` lots.
    pub lots_per_side: u32,
    pub min_height: f64,
    pub max_height: f64,
    /// Fraction of mid/high-rise buildings clad in glass.
    pub glass_share: f64,
    /// Depth of the water front beyond the last block row (meters).
    pub water_depth: f64,
}

impl Default for CityLayout {
    fn default() -> Self {
        Self {
            seed: 7,
            blocks_x: 6,
            blocks_z: 6,
            block_size: 80.0,
            street_width: 20.0,
            lots_per_side: 2,
            min_height: 8.0,
            max_height: 140.0,
            glass_share: 0.35,
            water_depth: 200.0,
        }
    }
}

impl CityLayout {
    /// Distance between neighbouring street centerlines (meters).
    pub fn pitch(&self) -> f64 {
        self.block_size + self.street_width
    }

    /// Half extents of the street grid along X and Z.
    pub fn half_extents(&self) -> (f64, f64) {
        (
            self.blocks_x as f64 * self.pitch() / 2.0,
            self.blocks_z as f64 * self.pitch() / 2.0,
        )
    }

    /// Closed loop along the outer ring road at `height` above the ground.
    pub fn perimeter_route(&self, height: f64) -> Vec<DVec3> {
        let (hx, hz) = self.half_extents();
        vec![
            DVec3::new(-hx, height, -hz),
            DVec3::new(hx, height, -hz),
            DVec3::new(hx, height, hz),
            DVec3::new(-hx, height, hz),
            DVec3::new(-hx, height, -hz),
        ]
    }

    /// Straight route along the street nearest the center line x = 0.
    pub fn crosstown_route(&self, height: f64) -> Vec<DVec3> {
        let (hx, hz) = self.half_extents();
        let x = -hx + (self.blocks_x / 2) as f64 * self.pitch();
        vec![DVec3::new(x, height, -hz), DVec3::new(x, height, hz)]
    }
}

/// Generate and build the triangle index for `layout`.
pub fn generate_city(layout: &CityLayout) -> TriangleIndex {
    let mut rng = ChaCha8Rng::seed_from_u64(layout.seed);
    let mut index = TriangleIndex::new();
    let (hx, hz) = layout.half_extents();

    // Ground and water front share the y = 0 plane without overlapping.
    index.add_quad(
        DVec3::new(-hx, 0.0, -hz),
        DVec3::new(-hx, 0.0, hz),
        DVec3::new(hx, 0.0, hz),
        DVec3::new(hx, 0.0, -hz),
        MaterialClass::Terrain,
    );
    if layout.water_depth > 0.0 {
        let far = hz + layout.water_depth;
        index.add_quad(
            DVec3::new(-hx, 0.0, hz),
            DVec3::new(-hx, 0.0, far),
            DVec3::new(hx, 0.0, far),
            DVec3::new(hx, 0.0, hz),
            MaterialClass::Water,
        );
    }

    let lots = layout.lots_per_side.max(1);
    let lot_size = layout.block_size / lots as f64;
    let mut buildings = 0usize;

    for bx in 0..layout.blocks_x {
        for bz in 0..layout.blocks_z {
            let block_min_x = -hx + bx as f64 * layout.pitch() + layout.street_width / 2.0;
            let block_min_z = -hz + bz as f64 * layout.pitch() + layout.street_width / 2.0;

            for lx in 0..lots {
                for lz in 0..lots {
                    if rng.gen_bool(EMPTY_LOT_CHANCE) {
                        continue;
                    }
                    let inset = rng.gen_range(1.0..(lot_size * 0.2).max(1.5));
                    let lot_x = block_min_x + lx as f64 * lot_size;
                    let lot_z = block_min_z + lz as f64 * lot_size;

                    // Skew toward low buildings; towers are rare.
                    let t: f64 = rng.gen::<f64>().powi(3);
                    let height = layout.min_height + t * (layout.max_height - layout.min_height);
                    let material = pick_material(&mut rng, height, layout.glass_share);

                    index.add_box(
                        DVec3::new(lot_x + inset, 0.0, lot_z + inset),
                        DVec3::new(lot_x + lot_size - inset, height, lot_z + lot_size - inset),
                        material,
                    );
                    buildings += 1;
                }
            }
        }
    }

    index.build();
    tracing::info!(
        seed = layout.seed,
        buildings,
        triangles = index.triangle_count(),
        "generated city"
    );
    index
}

fn pick_material(rng: &mut ChaCha8Rng, height: f64, glass_share: f64) -> MaterialClass {
    if height < LOW_RISE_MAX_HEIGHT {
        if rng.gen_bool(METAL_SHED_CHANCE) {
            MaterialClass::Metal
        } else {
            MaterialClass::ConcreteLowRise
        }
    } else if rng.gen_bool(glass_share.clamp(0.0, 1.0)) {
        MaterialClass::Glass
    } else if height < MID_RISE_MAX_HEIGHT {
        MaterialClass::ConcreteMidRise
    } else {
        MaterialClass::EmissiveHighRise
    }
}
