//! # Quorum Accumulator
//!
//! Collects member responses for one round and decides as soon as the
//! outcome is known:
//!
//! - **Reached**: accepted `Endorse` count `>= threshold`
//! - **Unreachable**: `(total - responded) < (threshold - endorsed)`
//!
//! Once decided, the accumulator ignores every further response.

use super::epoch::{CommitteeEpoch, MemberId};
use super::errors::{EndorsementError, VerdictRejection};
use super::proof::EndorsedProof;
use super::verdict::{EndorsementVerdict, VerdictOutcome};
use shared_types::{Hash, MessageKey};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// What a member's task produced.
#[derive(Debug, Clone)]
pub enum MemberResponse {
    /// A verdict that passed `check_verdict`.
    Accepted(EndorsementVerdict),
    /// A verdict that was discarded.
    Discarded(VerdictRejection),
    /// No answer within the per-member timeout. Counts as `Abstain`.
    TimedOut,
    /// Transport failure.
    Failed(String),
}

/// Round status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumStatus {
    /// Outcome not yet determined.
    Pending,
    /// Threshold met.
    Reached,
    /// Threshold can no longer be met.
    Unreachable,
}

/// Counters for logs and errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Accepted endorsements.
    pub endorsed: usize,
    /// Valid `Reject` verdicts.
    pub rejected: usize,
    /// Valid `Abstain` verdicts.
    pub abstained: usize,
    /// Discarded verdicts.
    pub discarded: usize,
    /// Timed-out members.
    pub timed_out: usize,
    /// Transport failures.
    pub failed: usize,
    /// Members counted as responded.
    pub responded: usize,
    /// Committee size.
    pub total: usize,
    /// Quorum threshold.
    pub threshold: usize,
}

impl Tally {
    /// Members that delivered any verdict, valid or not.
    pub fn answered(&self) -> usize {
        self.endorsed + self.rejected + self.abstained + self.discarded
    }
}

/// Per-round response accumulator.
#[derive(Debug)]
pub struct QuorumAccumulator {
    epoch: Arc<CommitteeEpoch>,
    message_id: MessageKey,
    claim_digest: Hash,
    responded: BTreeSet<MemberId>,
    endorsements: BTreeMap<MemberId, EndorsementVerdict>,
    tally: Tally,
    status: QuorumStatus,
}

impl QuorumAccumulator {
    /// Start a round pinned to `epoch`.
    pub fn new(epoch: Arc<CommitteeEpoch>, message_id: MessageKey, claim_digest: Hash) -> Self {
        let tally = Tally {
            total: epoch.len(),
            threshold: epoch.quorum_threshold(),
            ..Default::default()
        };
        let mut acc = Self {
            epoch,
            message_id,
            claim_digest,
            responded: BTreeSet::new(),
            endorsements: BTreeMap::new(),
            tally,
            status: QuorumStatus::Pending,
        };
        acc.status = acc.evaluate();
        acc
    }

    /// Record `member`'s response and return the (possibly new) status.
    pub fn admit(&mut self, member: &MemberId, response: MemberResponse) -> QuorumStatus {
        if self.status != QuorumStatus::Pending {
            debug!(member = %member, "[xc-02] Late response ignored");
            return self.status;
        }
        if !self.epoch.contains(member) {
            debug!(member = %member, "[xc-02] Response from non-member ignored");
            return self.status;
        }
        if !self.responded.insert(member.clone()) {
            debug!(member = %member, "[xc-02] Duplicate response ignored");
            return self.status;
        }

        match response {
            MemberResponse::Accepted(verdict) => match verdict.outcome {
                VerdictOutcome::Endorse => {
                    self.tally.endorsed += 1;
                    self.endorsements.insert(member.clone(), verdict);
                }
                VerdictOutcome::Reject => self.tally.rejected += 1,
                VerdictOutcome::Abstain => self.tally.abstained += 1,
            },
            MemberResponse::Discarded(_) => self.tally.discarded += 1,
            MemberResponse::TimedOut => self.tally.timed_out += 1,
            MemberResponse::Failed(_) => self.tally.failed += 1,
        }
        self.tally.responded = self.responded.len();
        self.status = self.evaluate();
        self.status
    }

    fn evaluate(&self) -> QuorumStatus {
        let threshold = self.epoch.quorum_threshold();
        let endorsed = self.endorsements.len();
        if endorsed >= threshold {
            return QuorumStatus::Reached;
        }
        let outstanding = self.epoch.len() - self.responded.len();
        if outstanding < threshold - endorsed {
            return QuorumStatus::Unreachable;
        }
        QuorumStatus::Pending
    }

    /// Current status.
    pub fn status(&self) -> QuorumStatus {
        self.status
    }

    /// Current counters.
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// True if `member` already has a response counted.
    pub fn has_responded(&self, member: &MemberId) -> bool {
        self.responded.contains(member)
    }

    /// Error describing a round that cannot (or did not) reach quorum.
    ///
    /// Timed-out members count as abstaining for reachability, with one
    /// exception: a round in which no member delivered any verdict (every
    /// member timed out or failed at the transport) is reported as
    /// `CommitteeUnavailable` rather than `QuorumUnreachable`. That error is
    /// transient, so callers retry it in the same epoch instead of failing
    /// the message until the next rotation.
    pub fn failure(&self) -> EndorsementError {
        if self.tally.answered() == 0 {
            return EndorsementError::CommitteeUnavailable {
                epoch: self.epoch.epoch_id(),
            };
        }
        EndorsementError::QuorumUnreachable {
            epoch: self.epoch.epoch_id(),
            endorsed: self.tally.endorsed,
            responded: self.tally.responded,
            threshold: self.tally.threshold,
            total: self.tally.total,
        }
    }

    /// Assemble the proof from accepted endorsements, ordered by member id.
    pub fn build_proof(&self) -> EndorsedProof {
        EndorsedProof::assemble(
            self.message_id.clone(),
            self.claim_digest,
            self.epoch.epoch_id(),
            self.epoch.quorum_threshold(),
            self.endorsements.values().cloned().collect(),
        )
    }
}
