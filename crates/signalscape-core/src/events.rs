//! Events emitted by the session for UI feedback.

use serde::{Deserialize, Serialize};

use crate::state::HandoverEvent;
use crate::types::TransmitterId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    TransmitterAdded { id: TransmitterId },
    TransmitterRemoved { id: TransmitterId },
    /// A new set of ray bundles was accepted from the rebuild worker.
    BundlesRebuilt { generation: u64, bundle_count: usize },
    /// The probe vehicle's serving transmitter changed.
    VehicleHandover(HandoverEvent),
}
