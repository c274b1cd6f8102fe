//! # Tracker Records
//!
//! The persisted unit of relay state. Only the tracker mutates records;
//! everyone else works on clones.

use super::backoff::RetryPolicy;
use super::errors::{TrackerError, TrackerResult};
use super::state::{next_state, FailureReason, RelayEvent, RelayState};
use serde::{Deserialize, Serialize};
use shared_types::{CrossChainMessage, MessageKey, Timestamp};
use xc_02_endorsement::{EndorsedProof, MemberId};

/// Durable state of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub(crate) message: CrossChainMessage,
    pub(crate) state: RelayState,
    pub(crate) version: u64,
    pub(crate) generation: u32,
    pub(crate) retry_count: u32,
    pub(crate) next_retry_at: Timestamp,
    pub(crate) epoch_used: Option<u64>,
    pub(crate) accepted_verdicts: Vec<MemberId>,
    pub(crate) proof: Option<EndorsedProof>,
    pub(crate) last_error: Option<String>,
    pub(crate) created_at: Timestamp,
    pub(crate) updated_at: Timestamp,
}

impl TrackerRecord {
    /// Fresh `Pending` record.
    pub(crate) fn new(message: CrossChainMessage, generation: u32, now: Timestamp) -> Self {
        Self {
            message,
            state: RelayState::Pending,
            version: 1,
            generation,
            retry_count: 0,
            next_retry_at: now,
            epoch_used: None,
            accepted_verdicts: Vec::new(),
            proof: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `event` in place.
    ///
    /// Retry events past the budget turn into `Failed(RetriesExhausted)`.
    pub(crate) fn apply(
        &mut self,
        event: &RelayEvent,
        policy: &RetryPolicy,
        now: Timestamp,
    ) -> TrackerResult<()> {
        let next = next_state(&self.state, event).ok_or_else(|| {
            TrackerError::InvalidTransition {
                key: self.message.key.clone(),
                from: self.state.to_string(),
                event: event.name().to_string(),
            }
        })?;

        match event {
            RelayEvent::EndorsementRequested { epoch } => {
                self.epoch_used = Some(*epoch);
            }
            RelayEvent::QuorumReached { proof } => {
                if !proof.threshold_met() {
                    return Err(self.invalid_proof("threshold not met"));
                }
                if proof.message_id() != &self.message.key {
                    return Err(self.invalid_proof("proof is for another message"));
                }
                if proof.claim_digest() != &self.message.claim_digest() {
                    return Err(self.invalid_proof("claim digest mismatch"));
                }
                self.epoch_used = Some(proof.epoch());
                self.accepted_verdicts = proof.member_ids().cloned().collect();
                self.proof = Some(proof.clone());
                // Endorsement retries and submission retries have separate budgets.
                self.retry_count = 0;
                self.last_error = None;
            }
            RelayEvent::EndorsementRetry { reason } | RelayEvent::SubmissionRetry { reason } => {
                self.last_error = Some(reason.clone());
            }
            RelayEvent::DestinationRejected { reason } => {
                self.last_error = Some(reason.clone());
            }
            _ => {}
        }

        self.state = if event.is_retry() {
            if policy.allows_retry(self.retry_count) {
                self.retry_count += 1;
                self.next_retry_at = now.saturating_add(policy.delay_ms(self.retry_count));
                next
            } else {
                RelayState::Failed(FailureReason::RetriesExhausted)
            }
        } else {
            self.next_retry_at = now;
            next
        };
        self.version += 1;
        self.updated_at = now;
        Ok(())
    }

    fn invalid_proof(&self, reason: &str) -> TrackerError {
        TrackerError::InvalidProof {
            key: self.message.key.clone(),
            reason: reason.to_string(),
        }
    }

    /// Message key.
    pub fn key(&self) -> &MessageKey {
        &self.message.key
    }

    /// Tracked message.
    pub fn message(&self) -> &CrossChainMessage {
        &self.message
    }

    /// Current state.
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Monotonic version, bumped on every persisted change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Reinjection generation, starting at 0.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Transient failures consumed in the current phase.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Earliest time the record may be advanced again.
    pub fn next_retry_at(&self) -> Timestamp {
        self.next_retry_at
    }

    /// Whether the record may be advanced at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        !self.state.is_terminal() && self.next_retry_at <= now
    }

    /// Epoch of the latest endorsement round.
    pub fn epoch_used(&self) -> Option<u64> {
        self.epoch_used
    }

    /// Members whose endorsements are in the proof.
    pub fn accepted_verdicts(&self) -> &[MemberId] {
        &self.accepted_verdicts
    }

    /// Proof, once endorsed.
    pub fn proof(&self) -> Option<&EndorsedProof> {
        self.proof.as_ref()
    }

    /// Most recent transient or rejection reason.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Creation time (ms).
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Last update time (ms).
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}
