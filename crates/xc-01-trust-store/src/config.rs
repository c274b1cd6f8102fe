//! Trust store configuration.

use crate::domain::MAX_CHAIN_DEPTH;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trust store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustStoreConfig {
    /// Longest accepted certificate chain, root included.
    pub max_chain_depth: usize,
    /// Deadline for each BCDNS call made by `sync_from`.
    pub bcdns_timeout_ms: u64,
}

impl TrustStoreConfig {
    /// BCDNS timeout as a `Duration`.
    pub fn bcdns_timeout(&self) -> Duration {
        Duration::from_millis(self.bcdns_timeout_ms)
    }
}

impl Default for TrustStoreConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: MAX_CHAIN_DEPTH,
            bcdns_timeout_ms: 5_000,
        }
    }
}
