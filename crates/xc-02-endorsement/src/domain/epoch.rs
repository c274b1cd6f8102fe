//! # Committee Epochs
//!
//! An epoch is an immutable snapshot of committee membership and quorum
//! threshold. Membership changes only by rotating to a new epoch with a
//! strictly larger id.

use super::errors::{EndorsementError, EndorsementResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use xc_01_trust_store::IdentityCertificate;

/// Default number of retired epochs kept for lookups.
pub const DEFAULT_EPOCH_HISTORY: usize = 16;

/// Committee member identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Wrap a member name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable committee snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeEpoch {
    epoch_id: u64,
    members: BTreeMap<MemberId, IdentityCertificate>,
    quorum_threshold: usize,
}

impl CommitteeEpoch {
    /// Build an epoch with an explicit threshold (`1 <= t <= n`).
    pub fn new(
        epoch_id: u64,
        members: BTreeMap<MemberId, IdentityCertificate>,
        quorum_threshold: usize,
    ) -> EndorsementResult<Self> {
        if members.is_empty() {
            return Err(EndorsementError::InvalidEpoch("committee is empty".into()));
        }
        if quorum_threshold == 0 || quorum_threshold > members.len() {
            return Err(EndorsementError::InvalidEpoch(format!(
                "threshold {} outside 1..={}",
                quorum_threshold,
                members.len()
            )));
        }
        Ok(Self {
            epoch_id,
            members,
            quorum_threshold,
        })
    }

    /// Build an epoch tolerating `f = floor((n-1)/3)` faulty members.
    ///
    /// Threshold is `n - f`, which is `2f+1` when `n = 3f+1`.
    pub fn byzantine(
        epoch_id: u64,
        members: BTreeMap<MemberId, IdentityCertificate>,
    ) -> EndorsementResult<Self> {
        let n = members.len();
        let threshold = n.saturating_sub(n.saturating_sub(1) / 3);
        Self::new(epoch_id, members, threshold)
    }

    /// Epoch id.
    pub fn epoch_id(&self) -> u64 {
        self.epoch_id
    }

    /// Quorum threshold.
    pub fn quorum_threshold(&self) -> usize {
        self.quorum_threshold
    }

    /// Committee size.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a constructed epoch.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Registered leaf certificate of a member.
    pub fn member(&self, id: &MemberId) -> Option<&IdentityCertificate> {
        self.members.get(id)
    }

    /// True if `id` belongs to the epoch.
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    /// Member ids in order.
    pub fn member_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.members.keys()
    }

    /// Largest number of faulty members the threshold tolerates for liveness.
    pub fn max_faulty(&self) -> usize {
        self.members.len() - self.quorum_threshold
    }
}

/// Holds the current epoch and a bounded history of retired ones.
pub struct EpochRegistry {
    current: RwLock<Arc<CommitteeEpoch>>,
    history: RwLock<VecDeque<Arc<CommitteeEpoch>>>,
    history_limit: usize,
}

impl EpochRegistry {
    /// Registry starting at `initial`.
    pub fn new(initial: CommitteeEpoch) -> Self {
        Self::with_history_limit(initial, DEFAULT_EPOCH_HISTORY)
    }

    /// Registry keeping at most `history_limit` retired epochs.
    pub fn with_history_limit(initial: CommitteeEpoch, history_limit: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            history: RwLock::new(VecDeque::new()),
            history_limit,
        }
    }

    /// Snapshot of the active epoch.
    pub fn current(&self) -> Arc<CommitteeEpoch> {
        self.current.read().clone()
    }

    /// Active epoch id.
    pub fn current_id(&self) -> u64 {
        self.current.read().epoch_id()
    }

    /// Install `next`. Its id must be strictly greater than the current one.
    pub fn rotate(&self, next: CommitteeEpoch) -> EndorsementResult<u64> {
        let mut current = self.current.write();
        if next.epoch_id() <= current.epoch_id() {
            return Err(EndorsementError::StaleEpoch {
                current: current.epoch_id(),
                proposed: next.epoch_id(),
            });
        }
        let next_id = next.epoch_id();
        let retired = std::mem::replace(&mut *current, Arc::new(next));
        info!(
            "[xc-02] Committee epoch rotated {} -> {}",
            retired.epoch_id(),
            next_id
        );

        let mut history = self.history.write();
        history.push_front(retired);
        history.truncate(self.history_limit);
        Ok(next_id)
    }

    /// Look up the current or a retained retired epoch.
    pub fn get(&self, epoch_id: u64) -> Option<Arc<CommitteeEpoch>> {
        let current = self.current();
        if current.epoch_id() == epoch_id {
            return Some(current);
        }
        self.history
            .read()
            .iter()
            .find(|e| e.epoch_id() == epoch_id)
            .cloned()
    }
}
