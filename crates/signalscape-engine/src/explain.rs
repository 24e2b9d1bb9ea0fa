//! Contract with the external natural-language explanation service.
//!
//! The engine packages a probe result into an [`ExplanationRequest`], hands
//! it to an [`ExplanationService`] and attaches whatever comes back. The
//! service is optional: when it fails, the numeric analysis is still
//! returned and the explanation is left empty.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalscape_core::enums::QualityTier;
use signalscape_core::state::ProbeResult;
use signalscape_core::types::{Transmitter, TransmitterId};
use signalscape_scene::index::GeometryIndex;

use crate::probe::{probe_into, ProbeParams};

#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("Explanation service unavailable: {0}")]
    Unavailable(String),

    #[error("Explanation transport failed: {0}")]
    Transport(String),

    #[error("Malformed explanation payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One transmitter as seen from the probed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmitterSummary {
    pub id: TransmitterId,
    pub position: DVec3,
    pub power_dbm: f64,
    pub frequency_mhz: f64,
    pub distance_m: f64,
    pub path_loss_db: f64,
    pub received_power_dbm: f64,
    pub line_of_sight: bool,
}

/// Numbers describing the serving situation at the point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContext {
    pub serving_transmitter_id: Option<TransmitterId>,
    pub distance_m: Option<f64>,
    pub path_loss_db: Option<f64>,
    pub received_power_dbm: Option<f64>,
    pub quality: QualityTier,
    /// `None` when there is no runner-up.
    pub margin_db: Option<f64>,
    pub interference_count: usize,
    pub handover_stable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub point: DVec3,
    /// Strongest first.
    pub transmitters: Vec<TransmitterSummary>,
    pub context: SignalContext,
}

impl ExplanationRequest {
    /// Build a request from a probe of `transmitters`.
    pub fn from_probe(result: &ProbeResult, transmitters: &[Transmitter]) -> Self {
        let summaries = result
            .rows
            .iter()
            .filter_map(|row| {
                let tx = transmitters.get(row.index)?;
                Some(TransmitterSummary {
                    id: tx.id,
                    position: tx.position,
                    power_dbm: tx.power_dbm,
                    frequency_mhz: tx.frequency_mhz,
                    distance_m: row.distance_m,
                    path_loss_db: row.path_loss_db,
                    received_power_dbm: row.received_power_dbm,
                    line_of_sight: row.line_of_sight,
                })
            })
            .collect();

        let best = result.best_row();
        Self {
            point: result.point,
            transmitters: summaries,
            context: SignalContext {
                serving_transmitter_id: best.map(|row| row.transmitter_id),
                distance_m: best.map(|row| row.distance_m),
                path_loss_db: best.map(|row| row.path_loss_db),
                received_power_dbm: result.best_power_dbm,
                quality: result.quality,
                margin_db: result.margin_db,
                interference_count: result.interference_count,
                handover_stable: result.handover_stable,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, ExplainError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetric {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub summary: String,
    pub signal_assessment: String,
    pub coverage_assessment: String,
    pub interference_assessment: String,
    pub handover_assessment: String,
    #[serde(default)]
    pub key_metrics: Vec<KeyMetric>,
}

/// Parse a service reply.
pub fn parse_response(json: &str) -> Result<ExplanationResponse, ExplainError> {
    Ok(serde_json::from_str(json)?)
}

/// Anything that can turn a request into an explanation.
pub trait ExplanationService {
    fn explain(&self, request: &ExplanationRequest) -> Result<ExplanationResponse, ExplainError>;
}

/// Adapts a raw JSON exchange (request body in, reply body out) to [`ExplanationService`].
pub struct JsonExplanationService<F> {
    exchange: F,
}

impl<F> JsonExplanationService<F>
where
    F: Fn(&str) -> Result<String, ExplainError>,
{
    pub fn new(exchange: F) -> Self {
        Self { exchange }
    }
}

impl<F> ExplanationService for JsonExplanationService<F>
where
    F: Fn(&str) -> Result<String, ExplainError>,
{
    fn explain(&self, request: &ExplanationRequest) -> Result<ExplanationResponse, ExplainError> {
        let body = request.to_json()?;
        let reply = (self.exchange)(&body)?;
        parse_response(&reply)
    }
}

/// Numeric analysis at a point plus the optional narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAnalysis {
    pub probe: ProbeResult,
    pub request: ExplanationRequest,
    /// `None` when the service failed.
    pub explanation: Option<ExplanationResponse>,
}

/// Probe `point` with `params` and ask `service` to explain the result.
pub fn explain_point<G, S>(
    point: DVec3,
    transmitters: &[Transmitter],
    index: &G,
    params: &ProbeParams,
    service: &S,
) -> PointAnalysis
where
    G: GeometryIndex + ?Sized,
    S: ExplanationService + ?Sized,
{
    let mut result = ProbeResult::default();
    probe_into(point, transmitters, index, params, &mut result);
    let request = ExplanationRequest::from_probe(&result, transmitters);
    let explanation = match service.explain(&request) {
        Ok(response) => Some(response),
        Err(err) => {
            tracing::warn!(%err, "explanation unavailable, returning numeric analysis only");
            None
        }
    };
    PointAnalysis {
        probe: result,
        request,
        explanation,
    }
}
