//! # Domain Errors
//!
//! Tracker and storage errors.

use shared_types::MessageKey;
use thiserror::Error;

/// Tracker result alias.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError {
        /// Backend message.
        message: String,
    },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError {
        /// Backend message.
        message: String,
    },
    /// Key not found.
    #[error("Key not found in KV store")]
    NotFound,
}

/// Tracker errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// No live record for the key.
    #[error("No record for message {0}")]
    NotFound(MessageKey),

    /// Event does not apply to the record's current state. Also returned to
    /// the loser of a concurrent transition race.
    #[error("Invalid transition for {key}: {event} in state {from}")]
    InvalidTransition {
        /// Message key.
        key: MessageKey,
        /// Current state name.
        from: String,
        /// Rejected event name.
        event: String,
    },

    /// An earlier-hinted message on the same chain pair is still in flight.
    #[error("Submission of {key} blocked by {blocked_by} (hint {hint})")]
    OrderingBlocked {
        /// Message that wanted to submit.
        key: MessageKey,
        /// Earliest non-terminal sibling.
        blocked_by: MessageKey,
        /// Sibling's sequence hint.
        hint: u64,
    },

    /// Proof attached to a quorum event is unusable.
    #[error("Invalid proof for {key}: {reason}")]
    InvalidProof {
        /// Message key.
        key: MessageKey,
        /// Why the proof was refused.
        reason: String,
    },

    /// Reinjection requested for a record that has not failed.
    #[error("Cannot reinject {key}: state is {state}")]
    NotFailed {
        /// Message key.
        key: MessageKey,
        /// Current state name.
        state: String,
    },

    /// Persistence failed; nothing was applied.
    #[error("Storage error: {0}")]
    Store(#[from] KVStoreError),

    /// Stored bytes could not be decoded, or a record could not be encoded.
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for TrackerError {
    fn from(err: bincode::Error) -> Self {
        TrackerError::Codec(err.to_string())
    }
}
