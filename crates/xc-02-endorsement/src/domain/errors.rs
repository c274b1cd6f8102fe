//! # Domain Errors
//!
//! Round-level errors (`EndorsementError`) and per-verdict discard reasons
//! (`VerdictRejection`). A discarded verdict never aborts a round; it only
//! lowers reachability.

use super::epoch::MemberId;
use thiserror::Error;
use xc_01_trust_store::TrustError;

/// Endorsement result alias.
pub type EndorsementResult<T> = Result<T, EndorsementError>;

/// Endorsement round and committee errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndorsementError {
    /// Not enough members can still endorse. Terminal for this epoch.
    #[error(
        "Quorum unreachable in epoch {epoch}: {endorsed}/{threshold} endorsed, \
         {responded}/{total} responded"
    )]
    QuorumUnreachable {
        /// Epoch the round was pinned to.
        epoch: u64,
        /// Accepted endorsements.
        endorsed: usize,
        /// Members that responded, timed out or failed.
        responded: usize,
        /// Quorum threshold.
        threshold: usize,
        /// Committee size.
        total: usize,
    },

    /// No member answered at all before the round became unreachable.
    /// Treated as transient: the committee, not the claim, is the problem.
    #[error("Committee unavailable in epoch {epoch}: no member answered")]
    CommitteeUnavailable {
        /// Epoch the round was pinned to.
        epoch: u64,
    },

    /// Committee definition rejected.
    #[error("Invalid committee epoch: {0}")]
    InvalidEpoch(String),

    /// Rotation did not advance the epoch id.
    #[error("Epoch rotation rejected: current {current}, proposed {proposed}")]
    StaleEpoch {
        /// Active epoch id.
        current: u64,
        /// Proposed epoch id.
        proposed: u64,
    },

    /// Proof re-verification failed.
    #[error("Invalid proof: {0}")]
    InvalidProof(String),
}

impl EndorsementError {
    /// Whether the round may be retried in the same epoch.
    pub fn is_transient(&self) -> bool {
        matches!(self, EndorsementError::CommitteeUnavailable { .. })
    }
}

/// Why a single verdict was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerdictRejection {
    /// Responder is not part of the epoch.
    #[error("Member {0} is not in the epoch")]
    NotInEpoch(MemberId),

    /// Responder already has a verdict counted for this message.
    #[error("Duplicate verdict from {0}")]
    Duplicate(MemberId),

    /// Verdict names another member.
    #[error("Verdict claims member {claimed}, received from {responder}")]
    MemberMismatch {
        /// Member the request went to.
        responder: MemberId,
        /// Member named inside the verdict.
        claimed: MemberId,
    },

    /// Verdict was produced for another epoch.
    #[error("Epoch mismatch: expected {expected}, got {got}")]
    EpochMismatch {
        /// Epoch of the round.
        expected: u64,
        /// Epoch inside the verdict.
        got: u64,
    },

    /// Verdict refers to another message or digest.
    #[error("Verdict does not match the requested claim")]
    ClaimMismatch,

    /// Verdict without a signature.
    #[error("Verdict is missing its signature")]
    MissingSignature,

    /// Certificate chain failed trust validation.
    #[error("Untrusted certificate chain: {0}")]
    Trust(#[from] TrustError),

    /// Leaf certificate is not a committee-member identity.
    #[error("Leaf certificate is not a committee member identity")]
    WrongRole,

    /// Leaf key differs from the key registered in the epoch.
    #[error("Leaf key does not match the epoch registration")]
    KeyMismatch,

    /// Signature does not verify over the claim digest.
    #[error("Signature does not verify over the claim digest")]
    BadSignature,
}

/// Failure talking to a committee member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberClientError {
    /// Network or transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Member refuses to serve requests right now.
    #[error("Member unavailable: {0}")]
    Unavailable(String),
}
