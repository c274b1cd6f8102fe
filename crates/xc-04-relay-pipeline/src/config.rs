//! Relay pipeline configuration.

use crate::domain::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::time::Duration;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records advanced in parallel.
    pub max_concurrency: usize,
    /// Pause between cycles in `run`.
    pub poll_interval_ms: u64,
    /// Chains whose events are ingested each cycle.
    pub source_chains: Vec<ChainId>,
    /// Re-inject `Failed(QuorumUnreachable)` records once a newer committee
    /// epoch is active.
    pub reinject_on_epoch_change: bool,
    /// Deadline for each chain read or submission.
    pub chain_timeout_ms: u64,
}

impl PipelineConfig {
    /// Cycle interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Chain call deadline as a `Duration`.
    pub fn chain_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_timeout_ms)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_concurrency == 0 {
            return Err(PipelineError::Config("max_concurrency must be > 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(PipelineError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.chain_timeout_ms == 0 {
            return Err(PipelineError::Config("chain_timeout_ms must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            poll_interval_ms: 1_000,
            source_chains: Vec::new(),
            reinject_on_epoch_change: false,
            chain_timeout_ms: 10_000,
        }
    }
}
