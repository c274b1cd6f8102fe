//! # Inbound Ports
//!
//! API exposed by the trust store to other subsystems.

use crate::domain::{
    CertificateChain, CertificateId, RootRotation, RootSet, TrustResult, TrustedIdentity,
};
use shared_types::Timestamp;
use std::sync::Arc;

/// Certificate trust store API - inbound port.
///
/// Validation is synchronous: it touches only immutable snapshots.
pub trait TrustStoreApi: Send + Sync {
    /// Validate `chain` leaf to root as of `as_of`.
    fn validate(&self, chain: &CertificateChain, as_of: Timestamp) -> TrustResult<TrustedIdentity>;

    /// Apply a versioned root rotation. Returns the new version.
    fn rotate_roots(&self, rotation: RootRotation) -> TrustResult<u64>;

    /// Revoke a certificate. Returns `false` if it was already revoked.
    fn revoke(&self, id: CertificateId, revoked_at: Timestamp) -> bool;

    /// Snapshot of the active root set.
    fn roots(&self) -> Arc<RootSet>;
}
