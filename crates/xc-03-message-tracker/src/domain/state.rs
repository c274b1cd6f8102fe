//! # Relay State Machine
//!
//! ```text
//! [Pending] ──endorsement requested──→ [AwaitingEndorsement] ──┐ transient
//!                                          │        │   ↑──────┘
//!                         quorum reached ──┘        └── quorum unreachable ──→ [Failed]
//!                              ↓
//!                         [Endorsed] ──submission started──→ [Submitting]
//!                              ↑                                  │
//!                              └──────── transient error ─────────┤
//!                                                                 ├── accepted ──→ [Confirmed]
//!                                                                 └── rejected ──→ [Failed]
//!
//! any non-terminal ──retries exhausted──→ [Failed]
//! ```
//!
//! `Confirmed` and `Failed` are terminal. `next_state` is pure; the tracker
//! applies it under the per-message lock.

use serde::{Deserialize, Serialize};
use std::fmt;
use xc_02_endorsement::EndorsedProof;

/// Why a message failed terminally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Quorum could not be reached in `epoch`; retryable only after rotation.
    QuorumUnreachable {
        /// Epoch the failed round was pinned to.
        epoch: u64,
    },
    /// Destination rejected the proof permanently.
    Rejected(String),
    /// Transient failures used up the retry budget.
    RetriesExhausted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::QuorumUnreachable { epoch } => {
                write!(f, "quorum unreachable in epoch {epoch}")
            }
            FailureReason::Rejected(reason) => write!(f, "rejected: {reason}"),
            FailureReason::RetriesExhausted => f.write_str("retries exhausted"),
        }
    }
}

/// Relay state of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayState {
    /// Ingested, nothing requested yet.
    Pending,
    /// Endorsement round requested.
    AwaitingEndorsement,
    /// Proof in hand, not yet submitted.
    Endorsed,
    /// Proof handed to the destination.
    Submitting,
    /// Destination accepted the proof.
    Confirmed,
    /// Terminal failure.
    Failed(FailureReason),
}

impl RelayState {
    /// `Confirmed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Confirmed | RelayState::Failed(_))
    }

    /// Variant name without payload.
    pub fn name(&self) -> &'static str {
        match self {
            RelayState::Pending => "Pending",
            RelayState::AwaitingEndorsement => "AwaitingEndorsement",
            RelayState::Endorsed => "Endorsed",
            RelayState::Submitting => "Submitting",
            RelayState::Confirmed => "Confirmed",
            RelayState::Failed(_) => "Failed",
        }
    }

    /// Same variant, ignoring any failure reason.
    pub fn same_kind(&self, other: &RelayState) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayState::Failed(reason) => write!(f, "Failed({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Transition requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A round was started in `epoch`.
    EndorsementRequested {
        /// Epoch the round is pinned to.
        epoch: u64,
    },
    /// Quorum reached; carries the proof.
    QuorumReached {
        /// Assembled proof.
        proof: EndorsedProof,
    },
    /// Quorum cannot be reached in `epoch`.
    QuorumUnreachable {
        /// Epoch of the failed round.
        epoch: u64,
    },
    /// Endorsement could not complete for a transient reason.
    EndorsementRetry {
        /// Cause, kept on the record.
        reason: String,
    },
    /// Proof handed to the destination adapter.
    SubmissionStarted,
    /// Destination accepted.
    DestinationAccepted,
    /// Destination rejected permanently.
    DestinationRejected {
        /// Destination's reason.
        reason: String,
    },
    /// Destination returned a transient error.
    SubmissionRetry {
        /// Destination's reason.
        reason: String,
    },
    /// Retry budget exhausted.
    RetriesExhausted,
}

impl RelayEvent {
    /// Variant name without payload.
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::EndorsementRequested { .. } => "EndorsementRequested",
            RelayEvent::QuorumReached { .. } => "QuorumReached",
            RelayEvent::QuorumUnreachable { .. } => "QuorumUnreachable",
            RelayEvent::EndorsementRetry { .. } => "EndorsementRetry",
            RelayEvent::SubmissionStarted => "SubmissionStarted",
            RelayEvent::DestinationAccepted => "DestinationAccepted",
            RelayEvent::DestinationRejected { .. } => "DestinationRejected",
            RelayEvent::SubmissionRetry { .. } => "SubmissionRetry",
            RelayEvent::RetriesExhausted => "RetriesExhausted",
        }
    }

    /// Transient events consume retry budget.
    pub fn is_retry(&self) -> bool {
        matches!(
            self,
            RelayEvent::EndorsementRetry { .. } | RelayEvent::SubmissionRetry { .. }
        )
    }
}

/// Pure transition function. `None` means the event does not apply.
pub fn next_state(current: &RelayState, event: &RelayEvent) -> Option<RelayState> {
    use RelayEvent as E;
    use RelayState as S;

    match (current, event) {
        (S::Pending, E::EndorsementRequested { .. }) => Some(S::AwaitingEndorsement),
        (S::AwaitingEndorsement, E::QuorumReached { .. }) => Some(S::Endorsed),
        (S::AwaitingEndorsement, E::QuorumUnreachable { epoch }) => {
            Some(S::Failed(FailureReason::QuorumUnreachable { epoch: *epoch }))
        }
        (S::AwaitingEndorsement, E::EndorsementRetry { .. }) => Some(S::AwaitingEndorsement),
        (S::Endorsed, E::SubmissionStarted) => Some(S::Submitting),
        (S::Submitting, E::DestinationAccepted) => Some(S::Confirmed),
        (S::Submitting, E::DestinationRejected { reason }) => {
            Some(S::Failed(FailureReason::Rejected(reason.clone())))
        }
        (S::Submitting, E::SubmissionRetry { .. }) => Some(S::Endorsed),
        (s, E::RetriesExhausted) if !s.is_terminal() => {
            Some(S::Failed(FailureReason::RetriesExhausted))
        }
        _ => None,
    }
}
