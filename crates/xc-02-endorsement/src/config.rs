//! Endorsement coordinator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Deadline for each member's answer. Members time out independently.
    pub member_timeout_ms: u64,
}

impl CoordinatorConfig {
    /// Per-member deadline as a `Duration`.
    pub fn member_timeout(&self) -> Duration {
        Duration::from_millis(self.member_timeout_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            member_timeout_ms: 5_000,
        }
    }
}
