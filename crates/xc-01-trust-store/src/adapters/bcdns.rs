//! # In-Memory BCDNS
//!
//! Holds a root authority, publishes rotations and revocations, and signs
//! requests. Failure injection lets tests exercise sync error paths.

use crate::domain::{
    CertificateAuthority, CertificateId, CertificateSigningRequest, IdentityCertificate,
    RevocationEntry, RootRotation, TrustError, TrustResult,
};
use crate::ports::BcdnsClient;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Timestamp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct BcdnsState {
    version: u64,
    authority: Arc<CertificateAuthority>,
    issued_at: Timestamp,
    revocations: Vec<RevocationEntry>,
}

/// In-memory BCDNS.
pub struct InMemoryBcdns {
    state: RwLock<BcdnsState>,
    unavailable: AtomicBool,
}

impl InMemoryBcdns {
    /// Start at version 1 with `authority` as the sole root.
    pub fn new(authority: CertificateAuthority) -> Self {
        Self {
            state: RwLock::new(BcdnsState {
                version: 1,
                authority: Arc::new(authority),
                issued_at: 0,
                revocations: Vec::new(),
            }),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Current issuing authority.
    pub fn authority(&self) -> Arc<CertificateAuthority> {
        self.state.read().authority.clone()
    }

    /// Replace the root. Returns the rotation event to distribute.
    pub fn rotate(&self, authority: CertificateAuthority, at: Timestamp) -> RootRotation {
        let mut state = self.state.write();
        state.version += 1;
        state.authority = Arc::new(authority);
        state.issued_at = at;
        Self::rotation_of(&state)
    }

    /// Record a revocation.
    pub fn revoke(&self, certificate_id: CertificateId, revoked_at: Timestamp) {
        self.state.write().revocations.push(RevocationEntry {
            certificate_id,
            revoked_at,
        });
    }

    /// Simulate an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn rotation_of(state: &BcdnsState) -> RootRotation {
        RootRotation {
            version: state.version,
            roots: vec![state.authority.certificate().clone()],
            issued_at: state.issued_at,
        }
    }

    fn check_available(&self) -> TrustResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TrustError::Bcdns("service unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BcdnsClient for InMemoryBcdns {
    async fn current_roots(&self) -> TrustResult<RootRotation> {
        self.check_available()?;
        Ok(Self::rotation_of(&self.state.read()))
    }

    async fn revocations(&self) -> TrustResult<Vec<RevocationEntry>> {
        self.check_available()?;
        Ok(self.state.read().revocations.clone())
    }

    async fn apply_certificate(
        &self,
        request: CertificateSigningRequest,
    ) -> TrustResult<IdentityCertificate> {
        self.check_available()?;
        let authority = self.authority();
        authority.sign_request(&request)
    }
}
