//! # Source-Chain Events

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, CrossChainMessage, MessageKey, Timestamp};

/// A cross-chain event as read from a source chain, before tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Sequence number assigned by the source chain. Also the read cursor.
    pub sequence: u64,
    /// Chain the claim must be delivered to.
    pub dest_chain: ChainId,
    /// Opaque claim bytes.
    pub payload: Vec<u8>,
    /// Optional per-pair ordering key.
    pub sequence_hint: Option<u64>,
}

impl RawEvent {
    /// Attach the source chain and observation time.
    pub fn into_message(self, source_chain: ChainId, observed_at: Timestamp) -> CrossChainMessage {
        CrossChainMessage::new(
            MessageKey::new(source_chain, self.sequence),
            self.dest_chain,
            self.payload,
            self.sequence_hint,
            observed_at,
        )
    }
}

/// Destination verdict on a submitted proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    /// The destination applied (or had already applied) the message.
    Accepted,
    /// The destination will never accept this proof.
    PermanentReject(String),
    /// Try again later.
    TransientError(String),
}
