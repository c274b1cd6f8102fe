//! # Cycle Reports

use serde::{Deserialize, Serialize};
use xc_03_message_tracker::FailureReason;

/// Result of advancing one record by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Quorum reached; proof stored.
    Endorsed,
    /// Destination accepted the proof.
    Confirmed,
    /// Transient failure; backoff scheduled.
    Retrying,
    /// Record became terminal `Failed`.
    Failed(FailureReason),
    /// Waiting for an earlier-hinted sibling on the same chain pair.
    Blocked,
    /// The step could not be applied (lost race, storage error).
    Error(String),
}

/// Counters for one `run_cycle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// New messages ingested.
    pub ingested: usize,
    /// Source events already tracked.
    pub duplicates: usize,
    /// `Failed` records given a fresh generation after an epoch change.
    pub reinjected: usize,
    /// Records advanced this cycle.
    pub processed: usize,
    /// Records that reached `Endorsed`.
    pub endorsed: usize,
    /// Records that reached `Confirmed`.
    pub confirmed: usize,
    /// Transient failures scheduled for retry.
    pub retrying: usize,
    /// Submissions held back by ordering.
    pub blocked: usize,
    /// Records that became `Failed` this cycle.
    pub newly_failed: usize,
    /// Step, read or storage errors.
    pub errors: usize,
    /// Total `Failed` records awaiting operator action.
    pub failed: usize,
}

impl CycleReport {
    /// Fold one step result into the counters.
    pub fn record(&mut self, outcome: &StepOutcome) {
        self.processed += 1;
        match outcome {
            StepOutcome::Endorsed => self.endorsed += 1,
            StepOutcome::Confirmed => self.confirmed += 1,
            StepOutcome::Retrying => self.retrying += 1,
            StepOutcome::Failed(_) => self.newly_failed += 1,
            StepOutcome::Blocked => self.blocked += 1,
            StepOutcome::Error(_) => self.errors += 1,
        }
    }

    /// Nothing happened this cycle.
    pub fn is_idle(&self) -> bool {
        self.ingested == 0 && self.processed == 0 && self.reinjected == 0 && self.errors == 0
    }
}
