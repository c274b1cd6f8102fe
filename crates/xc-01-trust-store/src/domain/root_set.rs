//! # Root Sets
//!
//! The versioned set of BCDNS trust anchors. A root set is never mutated;
//! rotation builds a replacement that the store swaps in.

use super::certificate::{CertificateId, IdentityCertificate, SubjectKind};
use super::errors::{TrustError, TrustResult};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::BTreeMap;

/// Versioned root rotation event published by BCDNS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRotation {
    /// Must equal the active version plus one.
    pub version: u64,
    /// Complete replacement set of self-signed roots.
    pub roots: Vec<IdentityCertificate>,
    /// When BCDNS published the rotation (ms).
    pub issued_at: Timestamp,
}

/// Immutable set of active roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSet {
    version: u64,
    roots: BTreeMap<CertificateId, IdentityCertificate>,
}

impl RootSet {
    /// The empty set at version 0; validates nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the successor of `self` from a rotation.
    ///
    /// Each root must be a self-signed `Root` subject with an intact id.
    pub fn rotate(&self, rotation: &RootRotation) -> TrustResult<RootSet> {
        if rotation.version != self.version + 1 {
            return Err(TrustError::StaleRotation {
                current: self.version,
                proposed: rotation.version,
            });
        }
        Self::from_rotation(rotation)
    }

    /// Build a root set from a rotation without checking version succession.
    ///
    /// Used only to bootstrap an empty store from BCDNS.
    pub fn from_rotation(rotation: &RootRotation) -> TrustResult<RootSet> {
        if rotation.roots.is_empty() {
            return Err(TrustError::InvalidRotation(
                "rotation must carry at least one root".into(),
            ));
        }
        let mut roots = BTreeMap::new();
        for root in &rotation.roots {
            root.check_integrity()?;
            if root.subject().kind != SubjectKind::Root || root.issuer().is_some() {
                return Err(TrustError::InvalidRotation(format!(
                    "{} is not a self-signed root",
                    root.id()
                )));
            }
            root.verify_signed_by(root.public_key())?;
            roots.insert(root.id(), root.clone());
        }
        Ok(RootSet {
            version: rotation.version,
            roots,
        })
    }

    /// Active version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up an active root.
    pub fn get(&self, id: &CertificateId) -> Option<&IdentityCertificate> {
        self.roots.get(id)
    }

    /// True if `id` is an active root.
    pub fn contains(&self, id: &CertificateId) -> bool {
        self.roots.contains_key(id)
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// True when no roots are active.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterate roots in id order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityCertificate> {
        self.roots.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CertificateAuthority;

    fn rotation(version: u64, authority: &CertificateAuthority) -> RootRotation {
        RootRotation {
            version,
            roots: vec![authority.certificate().clone()],
            issued_at: 0,
        }
    }

    #[test]
    fn test_rotation_requires_next_version() {
        let root = CertificateAuthority::new_root("bcdns", 0, u64::MAX).unwrap();
        let set = RootSet::empty();

        assert!(matches!(
            set.rotate(&rotation(2, &root)),
            Err(TrustError::StaleRotation {
                current: 0,
                proposed: 2
            })
        ));

        let v1 = set.rotate(&rotation(1, &root)).unwrap();
        assert_eq!(v1.version(), 1);
        assert!(v1.contains(&root.certificate().id()));

        assert!(matches!(
            v1.rotate(&rotation(1, &root)),
            Err(TrustError::StaleRotation { .. })
        ));
    }

    #[test]
    fn test_rotation_rejects_non_root() {
        let root = CertificateAuthority::new_root("bcdns", 0, u64::MAX).unwrap();
        let inter = root.issue_intermediate("ca-1", 0, u64::MAX).unwrap();

        let result = RootSet::empty().rotate(&RootRotation {
            version: 1,
            roots: vec![inter.certificate().clone()],
            issued_at: 0,
        });
        assert!(matches!(result, Err(TrustError::InvalidRotation(_))));
    }

    #[test]
    fn test_rotation_rejects_empty() {
        let result = RootSet::empty().rotate(&RootRotation {
            version: 1,
            roots: vec![],
            issued_at: 0,
        });
        assert!(matches!(result, Err(TrustError::InvalidRotation(_))));
    }
}
