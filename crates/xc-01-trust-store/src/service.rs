//! # Trust Store Service
//!
//! Holds the active root set and revocation set as `Arc` snapshots behind
//! `parking_lot::RwLock`. Writers build a replacement and swap the pointer;
//! readers clone the `Arc` and validate without holding any lock.

use crate::config::TrustStoreConfig;
use crate::domain::{
    validate_chain, CertificateChain, CertificateId, RevocationEntry, RevocationSet,
    RootRotation, RootSet, TrustError, TrustResult, TrustedIdentity,
};
use crate::ports::{BcdnsClient, TrustStoreApi};
use parking_lot::RwLock;
use shared_types::Timestamp;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Certificate trust store.
pub struct TrustStore {
    config: TrustStoreConfig,
    roots: RwLock<Arc<RootSet>>,
    revocations: RwLock<Arc<RevocationSet>>,
}

impl TrustStore {
    /// Empty store; validates nothing until roots are installed.
    pub fn new(config: TrustStoreConfig) -> Self {
        Self {
            config,
            roots: RwLock::new(Arc::new(RootSet::empty())),
            revocations: RwLock::new(Arc::new(RevocationSet::default())),
        }
    }

    /// Store seeded with an initial root rotation (usually version 1).
    pub fn with_roots(config: TrustStoreConfig, rotation: &RootRotation) -> TrustResult<Self> {
        let store = Self::new(config);
        *store.roots.write() = Arc::new(RootSet::from_rotation(rotation)?);
        Ok(store)
    }

    /// Snapshot of the revocation set.
    pub fn revocations(&self) -> Arc<RevocationSet> {
        self.revocations.read().clone()
    }

    /// Merge revocation entries.
    pub fn apply_revocations(&self, entries: impl IntoIterator<Item = RevocationEntry>) {
        let mut guard = self.revocations.write();
        let next = guard.with(entries);
        if next.len() != guard.len() {
            info!(
                "[xc-01] Revocation set grew {} -> {}",
                guard.len(),
                next.len()
            );
        }
        *guard = Arc::new(next);
    }

    /// Pull roots and revocations from BCDNS.
    ///
    /// An empty store adopts whatever version BCDNS reports. Otherwise the
    /// remote version must be the current one (no-op) or its successor.
    /// Each call is bounded by `bcdns_timeout`.
    pub async fn sync_from(&self, client: &dyn BcdnsClient) -> TrustResult<u64> {
        let deadline = self.config.bcdns_timeout();
        let timeout_ms = self.config.bcdns_timeout_ms;

        let rotation = tokio::time::timeout(deadline, client.current_roots())
            .await
            .map_err(|_| TrustError::Timeout(timeout_ms))??;
        let revocations = tokio::time::timeout(deadline, client.revocations())
            .await
            .map_err(|_| TrustError::Timeout(timeout_ms))??;

        // Revocations first so a freshly installed root set is never used
        // without them.
        self.apply_revocations(revocations);

        let current = self.roots.read().version();
        if current == 0 {
            let installed = RootSet::from_rotation(&rotation)?;
            *self.roots.write() = Arc::new(installed);
            info!("[xc-01] Bootstrapped root set at version {}", rotation.version);
            return Ok(rotation.version);
        }
        if rotation.version == current {
            debug!("[xc-01] Root set already at version {}", current);
            return Ok(current);
        }
        self.rotate_roots(rotation)
    }

    /// Configuration in effect.
    pub fn config(&self) -> &TrustStoreConfig {
        &self.config
    }
}

impl TrustStoreApi for TrustStore {
    fn validate(&self, chain: &CertificateChain, as_of: Timestamp) -> TrustResult<TrustedIdentity> {
        let roots = self.roots();
        let revocations = self.revocations();
        validate_chain(
            chain,
            &roots,
            &revocations,
            as_of,
            self.config.max_chain_depth,
        )
    }

    fn rotate_roots(&self, rotation: RootRotation) -> TrustResult<u64> {
        let mut guard = self.roots.write();
        let next = match guard.rotate(&rotation) {
            Ok(next) => next,
            Err(err) => {
                warn!("[xc-01] Root rotation rejected: {}", err);
                return Err(err);
            }
        };
        info!(
            "[xc-01] Root set rotated {} -> {} ({} roots)",
            guard.version(),
            next.version(),
            next.len()
        );
        let version = next.version();
        *guard = Arc::new(next);
        Ok(version)
    }

    fn revoke(&self, id: CertificateId, revoked_at: Timestamp) -> bool {
        let mut guard = self.revocations.write();
        if guard.is_revoked(&id) {
            return false;
        }
        *guard = Arc::new(guard.with([RevocationEntry {
            certificate_id: id,
            revoked_at,
        }]));
        info!("[xc-01] Revoked certificate {}", id);
        true
    }

    fn roots(&self) -> Arc<RootSet> {
        self.roots.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBcdns;
    use crate::domain::{CertificateAuthority, Subject, SubjectKind};
    use async_trait::async_trait;
    use std::time::Duration;

    fn member(name: &str) -> Subject {
        Subject::new(SubjectKind::CommitteeMember, name)
    }

    #[tokio::test]
    async fn test_sync_bootstraps_and_validates() {
        let bcdns = InMemoryBcdns::new(CertificateAuthority::new_root("r1", 0, 10_000).unwrap());
        let store = TrustStore::new(TrustStoreConfig::default());

        let (_, chain) = bcdns
            .authority()
            .issue_identity(member("m1"), 0, 10_000)
            .unwrap();
        assert!(matches!(
            store.validate(&chain, 10),
            Err(TrustError::UntrustedRoot(_))
        ));

        assert_eq!(store.sync_from(&bcdns).await.unwrap(), 1);
        assert!(store.validate(&chain, 10).is_ok());
    }

    #[tokio::test]
    async fn test_sync_applies_rotation_and_revocation() {
        let bcdns = InMemoryBcdns::new(CertificateAuthority::new_root("r1", 0, 10_000).unwrap());
        let store = TrustStore::new(TrustStoreConfig::default());
        store.sync_from(&bcdns).await.unwrap();

        let (_, old_chain) = bcdns
            .authority()
            .issue_identity(member("m1"), 0, 10_000)
            .unwrap();
        bcdns.rotate(CertificateAuthority::new_root("r2", 0, 10_000).unwrap(), 5);
        let (_, new_chain) = bcdns
            .authority()
            .issue_identity(member("m2"), 0, 10_000)
            .unwrap();
        bcdns.revoke(new_chain.leaf().unwrap().id(), 6);

        assert_eq!(store.sync_from(&bcdns).await.unwrap(), 2);
        assert!(matches!(
            store.validate(&old_chain, 10),
            Err(TrustError::UntrustedRoot(_))
        ));
        assert!(matches!(
            store.validate(&new_chain, 10),
            Err(TrustError::Revoked(_))
        ));
    }

    #[test]
    fn test_snapshot_survives_rotation() {
        let r1 = CertificateAuthority::new_root("r1", 0, 10_000).unwrap();
        let store = TrustStore::with_roots(
            TrustStoreConfig::default(),
            &RootRotation {
                version: 1,
                roots: vec![r1.certificate().clone()],
                issued_at: 0,
            },
        )
        .unwrap();

        let before = store.roots();
        let r2 = CertificateAuthority::new_root("r2", 0, 10_000).unwrap();
        store
            .rotate_roots(RootRotation {
                version: 2,
                roots: vec![r2.certificate().clone()],
                issued_at: 1,
            })
            .unwrap();

        assert_eq!(before.version(), 1);
        assert!(before.contains(&r1.certificate().id()));
        assert_eq!(store.roots().version(), 2);
        assert!(!store.roots().contains(&r1.certificate().id()));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let store = TrustStore::new(TrustStoreConfig::default());
        let id = CertificateId([1; 32]);
        assert!(store.revoke(id, 1));
        assert!(!store.revoke(id, 2));
        assert_eq!(store.revocations().revoked_at(&id), Some(1));
    }

    struct HangingBcdns;

    #[async_trait]
    impl BcdnsClient for HangingBcdns {
        async fn current_roots(&self) -> TrustResult<RootRotation> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Err(TrustError::Bcdns("unreachable".into()))
        }

        async fn revocations(&self) -> TrustResult<Vec<RevocationEntry>> {
            Ok(Vec::new())
        }

        async fn apply_certificate(
            &self,
            _request: crate::domain::CertificateSigningRequest,
        ) -> TrustResult<crate::domain::IdentityCertificate> {
            Err(TrustError::Bcdns("unsupported".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_times_out() {
        let store = TrustStore::new(TrustStoreConfig {
            bcdns_timeout_ms: 100,
            ..Default::default()
        });
        assert_eq!(
            store.sync_from(&HangingBcdns).await,
            Err(TrustError::Timeout(100))
        );
    }
}
