//! In-process chain adapter.
//!
//! Plays both roles: a source chain that emits events, and a destination
//! that accepts proofs. Submission outcomes can be scripted, and every
//! attempt is recorded so tests can observe delivery order.

use crate::domain::{ChainAccessError, RawEvent, SubmissionOutcome};
use crate::ports::ChainAccessAdapter;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{ChainId, CrossChainMessage, MessageKey};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;
use xc_02_endorsement::EndorsedProof;

#[derive(Default)]
struct Destination {
    script: VecDeque<SubmissionOutcome>,
    attempts: Vec<MessageKey>,
    delivered: Vec<MessageKey>,
    applied: HashSet<MessageKey>,
}

/// In-memory chain for dev-nets and tests.
pub struct InMemoryChain {
    chain_id: ChainId,
    events: RwLock<Vec<RawEvent>>,
    destination: Mutex<Destination>,
    submit_delay: Option<Duration>,
    unavailable: AtomicBool,
}

impl InMemoryChain {
    /// Chain with no events.
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            events: RwLock::new(Vec::new()),
            destination: Mutex::new(Destination::default()),
            submit_delay: None,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate destination latency on every submission.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Chain this adapter serves.
    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Emit a cross-chain event. Returns its sequence number (1-based).
    pub fn emit(&self, dest_chain: ChainId, payload: Vec<u8>, sequence_hint: Option<u64>) -> u64 {
        let mut events = self.events.write();
        let sequence = events.last().map_or(1, |e| e.sequence + 1);
        events.push(RawEvent {
            sequence,
            dest_chain,
            payload,
            sequence_hint,
        });
        sequence
    }

    /// Queue outcomes for the next submissions. Unscripted submissions are
    /// accepted.
    pub fn script<I>(&self, outcomes: I)
    where
        I: IntoIterator<Item = SubmissionOutcome>,
    {
        self.destination.lock().script.extend(outcomes);
    }

    /// Make event reads fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every submission attempt, in arrival order.
    pub fn attempts(&self) -> Vec<MessageKey> {
        self.destination.lock().attempts.clone()
    }

    /// Messages applied on this chain, in the order they were first accepted.
    pub fn delivered(&self) -> Vec<MessageKey> {
        self.destination.lock().delivered.clone()
    }
}

#[async_trait]
impl ChainAccessAdapter for InMemoryChain {
    async fn read_new_events(
        &self,
        chain: &ChainId,
        since_cursor: u64,
    ) -> Result<Vec<RawEvent>, ChainAccessError> {
        if chain != &self.chain_id {
            return Err(ChainAccessError::UnknownChain(chain.clone()));
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ChainAccessError::Unavailable {
                chain: chain.clone(),
                reason: "node offline".to_string(),
            });
        }
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.sequence > since_cursor)
            .cloned()
            .collect())
    }

    async fn submit_proof(
        &self,
        chain: &ChainId,
        proof: &EndorsedProof,
        message: &CrossChainMessage,
    ) -> SubmissionOutcome {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        if chain != &self.chain_id {
            return SubmissionOutcome::PermanentReject(format!("wrong chain {chain}"));
        }

        let mut dest = self.destination.lock();
        dest.attempts.push(message.key.clone());

        if !proof.threshold_met() || proof.message_id() != &message.key {
            return SubmissionOutcome::PermanentReject("proof does not cover message".into());
        }
        if dest.applied.contains(&message.key) {
            debug!(message = %message.key, "[xc-04] Duplicate delivery acknowledged");
            return SubmissionOutcome::Accepted;
        }

        let outcome = dest.script.pop_front().unwrap_or(SubmissionOutcome::Accepted);
        if outcome == SubmissionOutcome::Accepted {
            dest.applied.insert(message.key.clone());
            dest.delivered.push(message.key.clone());
        }
        outcome
    }
}
