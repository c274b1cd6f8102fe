//! # Retry Policy
//!
//! Bounded exponential backoff: `base * multiplier^(retry - 1)`, capped at
//! `max_delay`.

use serde::{Deserialize, Serialize};

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Transient failures tolerated before `Failed(RetriesExhausted)`.
    pub max_retries: u32,
    /// Delay before the first retry (ms).
    pub base_delay_ms: u64,
    /// Growth factor per retry.
    pub multiplier: u32,
    /// Upper bound on any single delay (ms).
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1_000,
            multiplier: 2,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based). Zero for `retry == 0`.
    pub fn delay_ms(&self, retry: u32) -> u64 {
        if retry == 0 {
            return 0;
        }
        let factor = u64::from(self.multiplier).saturating_pow(retry - 1);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    /// Whether another retry is allowed after `retry_count` retries.
    pub fn allows_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }
}
