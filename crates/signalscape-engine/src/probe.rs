//! Point probe: received power from every transmitter at one point.
//!
//! Each transmitter gets a single line-of-sight query; an obstructed path
//! pays a fixed penalty on top of free-space loss. Rows are ranked by
//! received power and summarized into serving-cell metrics.

use glam::DVec3;

use signalscape_core::config::EngineConfig;
use signalscape_core::constants::*;
use signalscape_core::enums::QualityTier;
use signalscape_core::state::{ProbeResult, ProbeRow};
use signalscape_core::types::Transmitter;
use signalscape_scene::index::GeometryIndex;
use signalscape_scene::los::first_obstruction;

use crate::path_loss::free_space_path_loss;

/// Received power assigned to transmitters with non-finite settings (dBm).
const INVALID_POWER_DBM: f64 = -200.0;

/// Tunables for the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeParams {
    pub obstruction_penalty_db: f64,
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            obstruction_penalty_db: OBSTRUCTION_PENALTY_DB,
        }
    }
}

impl From<&EngineConfig> for ProbeParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            obstruction_penalty_db: config.obstruction_penalty_db,
        }
    }
}

/// Five-tier quality for the best received power. Thresholds are strict.
pub fn classify_quality(best_power_dbm: f64) -> QualityTier {
    if best_power_dbm > QUALITY_EXCELLENT_DBM {
        QualityTier::Excellent
    } else if best_power_dbm > QUALITY_GOOD_DBM {
        QualityTier::Good
    } else if best_power_dbm > QUALITY_FAIR_DBM {
        QualityTier::Fair
    } else if best_power_dbm > QUALITY_POOR_DBM {
        QualityTier::Poor
    } else {
        QualityTier::Dead
    }
}

/// A serving cell is stable when it leads the runner-up by at least the handover margin.
pub fn is_handover_stable(margin_db: f64) -> bool {
    margin_db >= HANDOVER_MARGIN_DB
}

/// Softmax of `powers_dbm` at `temperature_db`: `exp((v - max) / T)`, normalized.
pub fn softmax_weights(powers_dbm: &[f64], temperature_db: f64) -> Vec<f64> {
    let mut weights = powers_dbm.to_vec();
    softmax_in_place(&mut weights, temperature_db);
    weights
}

/// Replace each power in `values` with its softmax weight.
fn softmax_in_place(values: &mut [f64], temperature_db: f64) {
    if values.is_empty() {
        return;
    }
    let temperature = temperature_db.abs().max(EPSILON);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter_mut()
        .for_each(|v| *v = ((*v - max) / temperature).exp());
    let sum: f64 = values.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        values.iter_mut().for_each(|w| *w /= sum);
    } else {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|w| *w = uniform);
    }
}

/// Probe `point` against every transmitter.
pub fn probe<G: GeometryIndex + ?Sized>(
    point: DVec3,
    transmitters: &[Transmitter],
    index: &G,
) -> ProbeResult {
    let mut result = ProbeResult::default();
    probe_into(point, transmitters, index, &ProbeParams::default(), &mut result);
    result
}

/// Probe into an existing result, reusing its buffers.
pub fn probe_into<G: GeometryIndex + ?Sized>(
    point: DVec3,
    transmitters: &[Transmitter],
    index: &G,
    params: &ProbeParams,
    out: &mut ProbeResult,
) {
    out.point = point;
    out.rows.clear();
    out.rows
        .extend(transmitters.iter().enumerate().map(|(i, tx)| {
            measure(point, i, tx, index, params.obstruction_penalty_db)
        }));

    // Weights stay in input order, so compute them before ranking.
    out.weights.clear();
    out.weights
        .extend(out.rows.iter().map(|row| row.received_power_dbm));
    softmax_in_place(&mut out.weights, SOFTMAX_TEMPERATURE_DB);

    out.rows.sort_unstable_by(|a, b| {
        b.received_power_dbm
            .total_cmp(&a.received_power_dbm)
            .then(a.index.cmp(&b.index))
    });

    out.best_index = out.rows.first().map(|row| row.index);
    out.best_power_dbm = out.rows.first().map(|row| row.received_power_dbm);
    out.margin_db = match out.rows.as_slice() {
        [best, second, ..] => Some(best.received_power_dbm - second.received_power_dbm),
        _ => None,
    };
    out.quality = out
        .best_power_dbm
        .map_or(QualityTier::Dead, classify_quality);
    out.interference_count = out
        .rows
        .iter()
        .filter(|row| row.received_power_dbm > STRONG_SIGNAL_DBM)
        .count();
    out.handover_stable = out.margin_db.map_or(true, is_handover_stable);
}

fn measure<G: GeometryIndex + ?Sized>(
    point: DVec3,
    index_in_set: usize,
    tx: &Transmitter,
    index: &G,
    obstruction_penalty_db: f64,
) -> ProbeRow {
    let distance = tx.position.distance(point);
    let line_of_sight =
        first_obstruction(index, tx.position, point, LOS_END_CLEARANCE_M).is_none();
    let mut path_loss = free_space_path_loss(distance, tx.frequency_mhz);
    if !line_of_sight {
        path_loss += obstruction_penalty_db;
    }
    let received = tx.power_dbm - path_loss;

    ProbeRow {
        transmitter_id: tx.id,
        index: index_in_set,
        received_power_dbm: if received.is_finite() {
            received
        } else {
            INVALID_POWER_DBM
        },
        path_loss_db: path_loss,
        line_of_sight,
        distance_m: distance,
        frequency_mhz: tx.frequency_mhz,
    }
}

/// Reusable probe for high-frequency callers.
///
/// Holds one result whose buffers are recycled on every call, so a probe
/// vehicle sampling tens of times per second does not allocate per sample.
#[derive(Debug, Default)]
pub struct Prober {
    params: ProbeParams,
    result: ProbeResult,
}

impl Prober {
    pub fn new(params: ProbeParams) -> Self {
        Self {
            params,
            result: ProbeResult::default(),
        }
    }

    pub fn probe<G: GeometryIndex + ?Sized>(
        &mut self,
        point: DVec3,
        transmitters: &[Transmitter],
        index: &G,
    ) -> &ProbeResult {
        probe_into(point, transmitters, index, &self.params, &mut self.result);
        &self.result
    }

    /// The most recent result.
    pub fn last(&self) -> &ProbeResult {
        &self.result
    }
}
