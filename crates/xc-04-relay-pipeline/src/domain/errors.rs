//! # Domain Errors

use shared_types::ChainId;
use thiserror::Error;
use xc_03_message_tracker::TrackerError;

/// Pipeline result alias.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a whole cycle or refuse a configuration.
///
/// Per-message failures never surface here; they become tracker
/// transitions and `CycleReport` counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Tracker storage failed while listing work.
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// Worker pool was closed.
    #[error("Pipeline is shutting down")]
    ShuttingDown,

    /// Invalid pipeline configuration.
    #[error("Invalid pipeline configuration: {0}")]
    Config(String),
}

/// Chain access failures when reading source events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainAccessError {
    /// Node or RPC endpoint unreachable.
    #[error("Chain {chain} unavailable: {reason}")]
    Unavailable {
        /// Chain that failed.
        chain: ChainId,
        /// Transport detail.
        reason: String,
    },

    /// Adapter does not serve this chain.
    #[error("Adapter does not serve chain {0}")]
    UnknownChain(ChainId),
}
