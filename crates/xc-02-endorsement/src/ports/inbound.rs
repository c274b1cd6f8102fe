//! # Inbound Ports
//!
//! API the relay pipeline uses to obtain proofs.

use crate::domain::{CommitteeEpoch, EndorsedProof, EndorsementResult};
use async_trait::async_trait;
use shared_types::CrossChainMessage;
use std::sync::Arc;

/// Endorsement API - inbound port.
#[async_trait]
pub trait EndorsementApi: Send + Sync {
    /// Collect a quorum-endorsed proof for `message` from `epoch`'s committee.
    async fn request_endorsement(
        &self,
        message: &CrossChainMessage,
        epoch: Arc<CommitteeEpoch>,
    ) -> EndorsementResult<EndorsedProof>;
}
