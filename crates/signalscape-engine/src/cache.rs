//! Memoized ray bundles per transmitter.
//!
//! A rebuild only re-marches transmitters whose inputs changed since their
//! bundles were built. Everything else is copied from the cache.

use std::collections::HashMap;

use glam::DVec3;

use signalscape_core::config::EngineConfig;
use signalscape_core::state::RayBundle;
use signalscape_core::types::{Transmitter, TransmitterId};
use signalscape_scene::index::GeometryIndex;

use crate::rays::{build_ray_bundles_with, MarchParams};

/// Every input that shapes a transmitter's bundles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleFingerprint {
    pub position: DVec3,
    pub power_dbm: f64,
    pub frequency_mhz: f64,
    pub ray_count: u32,
    pub march: MarchParams,
}

impl BundleFingerprint {
    pub fn new(tx: &Transmitter, ray_count: u32, march: MarchParams) -> Self {
        Self {
            position: tx.position,
            power_dbm: tx.power_dbm,
            frequency_mhz: tx.frequency_mhz,
            ray_count,
            march,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: BundleFingerprint,
    bundles: Vec<RayBundle>,
}

/// How a rebuild was satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildCounts {
    pub reused: usize,
    pub built: usize,
    pub evicted: usize,
}

#[derive(Debug, Default)]
pub struct BundleCache {
    entries: HashMap<TransmitterId, CacheEntry>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: TransmitterId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Bundles for one transmitter, marching only on a fingerprint change.
    ///
    /// The flag is true when the cached bundles were reused.
    pub fn bundles_for<G: GeometryIndex + ?Sized>(
        &mut self,
        tx: &Transmitter,
        index: &G,
        ray_count: u32,
        march: &MarchParams,
    ) -> (&[RayBundle], bool) {
        let fingerprint = BundleFingerprint::new(tx, ray_count, *march);
        let reused = self
            .entries
            .get(&tx.id)
            .is_some_and(|entry| entry.fingerprint == fingerprint);
        if !reused {
            let bundles = build_ray_bundles_with(tx, index, ray_count, march);
            self.entries.insert(
                tx.id,
                CacheEntry {
                    fingerprint,
                    bundles,
                },
            );
        }
        let bundles = self
            .entries
            .get(&tx.id)
            .map_or(&[][..], |entry| entry.bundles.as_slice());
        (bundles, reused)
    }

    /// Bundles for the whole set, in input order. Removed transmitters are evicted.
    pub fn rebuild<G: GeometryIndex + ?Sized>(
        &mut self,
        transmitters: &[Transmitter],
        index: &G,
        config: &EngineConfig,
    ) -> (Vec<RayBundle>, RebuildCounts) {
        let before = self.entries.len();
        self.entries
            .retain(|id, _| transmitters.iter().any(|tx| tx.id == *id));
        let mut counts = RebuildCounts {
            evicted: before - self.entries.len(),
            ..Default::default()
        };

        let ray_count = config.rays_per_transmitter(transmitters.len());
        let march = MarchParams::from(config);
        let mut all = Vec::new();
        for tx in transmitters {
            let (bundles, reused) = self.bundles_for(tx, index, ray_count, &march);
            all.extend_from_slice(bundles);
            if reused {
                counts.reused += 1;
            } else {
                counts.built += 1;
            }
        }
        (all, counts)
    }
}
