//! # Outbound Ports
//!
//! BCDNS is the authority the trust store mirrors.

use crate::domain::{
    CertificateSigningRequest, IdentityCertificate, RevocationEntry, RootRotation, TrustResult,
};
use async_trait::async_trait;

/// BCDNS client - outbound port.
#[async_trait]
pub trait BcdnsClient: Send + Sync {
    /// Current root set, as the latest rotation event.
    async fn current_roots(&self) -> TrustResult<RootRotation>;

    /// Every revocation BCDNS has recorded.
    async fn revocations(&self) -> TrustResult<Vec<RevocationEntry>>;

    /// Submit a certificate signing request.
    async fn apply_certificate(
        &self,
        request: CertificateSigningRequest,
    ) -> TrustResult<IdentityCertificate>;
}
