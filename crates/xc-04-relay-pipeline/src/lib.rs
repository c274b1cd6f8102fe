//! # XC-04 Relay Pipeline
//!
//! Moves cross-chain messages from source chains to destinations with
//! exactly-once effect.
//!
//! **Subsystem ID:** 4  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Responsibilities
//!
//! | Step | Collaborator |
//! |------|--------------|
//! | Read new source events past the cursor | `ChainAccessAdapter` |
//! | Record messages idempotently | `MessageTracker` (xc-03) |
//! | Obtain a quorum-endorsed proof | `EndorsementApi` (xc-02) |
//! | Deliver the proof | `ChainAccessAdapter` of the destination |
//! | Retry with backoff, or fail terminally | `MessageTracker` (xc-03) |
//!
//! ## Error taxonomy
//!
//! | Kind | Effect |
//! |------|--------|
//! | Transient (chain busy, committee silent) | retry with exponential backoff |
//! | Permanent rejection | `Failed(Rejected)` |
//! | Quorum unreachable | `Failed(QuorumUnreachable)`, reinjected after an epoch change if enabled |
//! | Retry budget exhausted | `Failed(RetriesExhausted)` |
//!
//! ## Module Structure
//!
//! ```text
//! xc-04-relay-pipeline/
//! ├── domain/     # RawEvent, SubmissionOutcome, CycleReport, errors
//! ├── ports/      # RelayPipelineApi (inbound), ChainAccessAdapter + registry (outbound)
//! ├── adapters/   # InMemoryChain
//! ├── config.rs   # PipelineConfig
//! └── service.rs  # RelayPipeline
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryChain;
pub use config::PipelineConfig;
pub use domain::{
    ChainAccessError, CycleReport, PipelineError, PipelineResult, RawEvent, StepOutcome,
    SubmissionOutcome,
};
pub use ports::{ChainAccessAdapter, ChainAdapterRegistry, RelayPipelineApi};
pub use service::RelayPipeline;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
