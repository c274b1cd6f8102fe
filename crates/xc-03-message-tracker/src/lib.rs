//! # XC-03 Cross-Chain Message Tracker
//!
//! Durable per-message relay state machine.
//!
//! **Subsystem ID:** 3  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## State machine
//!
//! ```text
//! Pending ──▶ AwaitingEndorsement ──▶ Endorsed ──▶ Submitting ──▶ Confirmed
//!                 │        ▲              ▲            │
//!                 │        └─ retry       └── retry ───┤
//!                 ▼                                    ▼
//!              Failed ◀────────── rejected / retries exhausted
//! ```
//!
//! ## Guarantees
//!
//! | Property | Enforcement |
//! |----------|-------------|
//! | Idempotent ingestion | one record per `(source_chain, source_sequence)` |
//! | Atomic transitions | load, apply, persist under the key's lock stripe |
//! | Durability | a transition is visible only after the batch write succeeds |
//! | Absorbing terminals | `Confirmed` and `Failed` accept no events |
//! | Per-pair ordering | `begin_submission` waits for smaller sequence hints |
//! | Crash recovery | `MessageTracker::open` rebuilds indexes from storage |
//! | Bounded cycle scans | terminal records move out of `live/` |
//!
//! ## Module Structure
//!
//! ```text
//! xc-03-message-tracker/
//! ├── domain/     # RelayState, RelayEvent, TrackerRecord, RetryPolicy
//! ├── ports/      # KeyValueStore (outbound), InMemoryKVStore
//! ├── adapters/   # RocksDbStore (feature `rocksdb`)
//! └── service.rs  # MessageTracker
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use domain::{
    next_state, FailureReason, KVStoreError, RelayEvent, RelayState, RetryPolicy, TrackerError,
    TrackerRecord, TrackerResult,
};
pub use ports::{BatchOperation, InMemoryKVStore, KeyValueStore};
pub use service::{IngestOutcome, IngestReport, MessageTracker, RecoveryReport, LOCK_STRIPES};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
