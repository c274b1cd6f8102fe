//! # Outbound Ports
//!
//! One capability trait for every chain backend, selected by chain id.

use crate::domain::{ChainAccessError, RawEvent, SubmissionOutcome};
use async_trait::async_trait;
use shared_types::{ChainId, CrossChainMessage};
use std::collections::HashMap;
use std::sync::Arc;
use xc_02_endorsement::EndorsedProof;

/// Chain access adapter - outbound port.
///
/// Destinations must treat `submit_proof` as idempotent per message id:
/// a proof re-submitted after a crash is `Accepted` again, not applied twice.
#[async_trait]
pub trait ChainAccessAdapter: Send + Sync {
    /// Events with `sequence > since_cursor`, in sequence order.
    async fn read_new_events(
        &self,
        chain: &ChainId,
        since_cursor: u64,
    ) -> Result<Vec<RawEvent>, ChainAccessError>;

    /// Deliver an endorsed proof for `message` to `chain`.
    async fn submit_proof(
        &self,
        chain: &ChainId,
        proof: &EndorsedProof,
        message: &CrossChainMessage,
    ) -> SubmissionOutcome;
}

/// Adapters keyed by the chain they serve.
#[derive(Clone, Default)]
pub struct ChainAdapterRegistry {
    adapters: HashMap<ChainId, Arc<dyn ChainAccessAdapter>>,
}

impl ChainAdapterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` for `chain`, returning any adapter it replaces.
    pub fn register(
        &mut self,
        chain: ChainId,
        adapter: Arc<dyn ChainAccessAdapter>,
    ) -> Option<Arc<dyn ChainAccessAdapter>> {
        self.adapters.insert(chain, adapter)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, chain: ChainId, adapter: Arc<dyn ChainAccessAdapter>) -> Self {
        self.register(chain, adapter);
        self
    }

    /// Adapter for `chain`.
    pub fn get(&self, chain: &ChainId) -> Option<Arc<dyn ChainAccessAdapter>> {
        self.adapters.get(chain).cloned()
    }

    /// Whether `chain` has an adapter.
    pub fn contains(&self, chain: &ChainId) -> bool {
        self.adapters.contains_key(chain)
    }

    /// Registered chains.
    pub fn chains(&self) -> impl Iterator<Item = &ChainId> {
        self.adapters.keys()
    }
}
