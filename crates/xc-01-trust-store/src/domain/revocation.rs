//! # Revocations
//!
//! Revocation is permanent: once an id is in the set it stays there.

use super::certificate::CertificateId;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::BTreeMap;

/// A single revocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// Revoked certificate.
    pub certificate_id: CertificateId,
    /// When BCDNS revoked it (ms).
    pub revoked_at: Timestamp,
}

/// Immutable revocation snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationSet {
    revoked: BTreeMap<CertificateId, Timestamp>,
}

impl RevocationSet {
    /// Copy of `self` with `entries` merged in. Earliest revocation time wins.
    pub fn with(&self, entries: impl IntoIterator<Item = RevocationEntry>) -> Self {
        let mut revoked = self.revoked.clone();
        for entry in entries {
            revoked
                .entry(entry.certificate_id)
                .and_modify(|at| *at = (*at).min(entry.revoked_at))
                .or_insert(entry.revoked_at);
        }
        Self { revoked }
    }

    /// True if `id` has been revoked.
    ///
    /// Revocation applies regardless of the validation instant.
    pub fn is_revoked(&self, id: &CertificateId) -> bool {
        self.revoked.contains_key(id)
    }

    /// Revocation time, if revoked.
    pub fn revoked_at(&self, id: &CertificateId) -> Option<Timestamp> {
        self.revoked.get(id).copied()
    }

    /// Number of revoked certificates.
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    /// True when nothing is revoked.
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_earliest() {
        let id = CertificateId([9; 32]);
        let set = RevocationSet::default()
            .with([RevocationEntry {
                certificate_id: id,
                revoked_at: 50,
            }])
            .with([RevocationEntry {
                certificate_id: id,
                revoked_at: 80,
            }]);

        assert!(set.is_revoked(&id));
        assert_eq!(set.revoked_at(&id), Some(50));
        assert_eq!(set.len(), 1);
    }
}
