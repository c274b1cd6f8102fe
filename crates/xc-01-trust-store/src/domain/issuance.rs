//! # Certificate Issuance
//!
//! `CertificateAuthority` signs certificates for a root or intermediate
//! key. BCDNS adapters and test fixtures use it to mint identities.

use super::certificate::{
    CertificateBody, CertificateChain, IdentityCertificate, Subject, SubjectKind,
};
use super::errors::{TrustError, TrustResult};
use serde::{Deserialize, Serialize};
use shared_crypto::{IdentityKeyPair, IdentityPublicKey, IdentitySignature};
use shared_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request for a certificate, signed by the key being certified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSigningRequest {
    /// Requested subject.
    pub subject: Subject,
    /// Key to be bound.
    pub public_key: IdentityPublicKey,
    /// Requested validity start (ms).
    pub not_before: Timestamp,
    /// Requested validity end (ms).
    pub not_after: Timestamp,
    /// Proof of possession over the request fields.
    pub proof: IdentitySignature,
}

impl CertificateSigningRequest {
    /// Build and self-sign a request.
    pub fn new(
        subject: Subject,
        keypair: &IdentityKeyPair,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<Self> {
        let public_key = keypair.public_key();
        let bytes = Self::signing_bytes(&subject, &public_key, not_before, not_after)?;
        Ok(Self {
            subject,
            public_key,
            not_before,
            not_after,
            proof: keypair.sign(&bytes),
        })
    }

    /// Check the proof of possession.
    pub fn verify(&self) -> TrustResult<()> {
        let bytes = Self::signing_bytes(
            &self.subject,
            &self.public_key,
            self.not_before,
            self.not_after,
        )?;
        self.public_key
            .verify(&bytes, &self.proof)
            .map_err(|_| TrustError::Bcdns("proof of possession does not verify".into()))
    }

    fn signing_bytes(
        subject: &Subject,
        public_key: &IdentityPublicKey,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<Vec<u8>> {
        Ok(bincode::serialize(&(
            "xc-csr",
            subject,
            public_key,
            not_before,
            not_after,
        ))?)
    }
}

/// An issuing key together with its own certificate chain.
pub struct CertificateAuthority {
    keypair: IdentityKeyPair,
    chain: CertificateChain,
    next_serial: AtomicU64,
}

impl CertificateAuthority {
    /// Generate a fresh self-signed root.
    pub fn new_root(
        name: impl Into<String>,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<Self> {
        Self::root_from_keypair(IdentityKeyPair::generate(), name, not_before, not_after)
    }

    /// Self-sign a root certificate for an existing key.
    pub fn root_from_keypair(
        keypair: IdentityKeyPair,
        name: impl Into<String>,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<Self> {
        let body = CertificateBody {
            serial: 0,
            subject: Subject::new(SubjectKind::Root, name),
            public_key: keypair.public_key(),
            issuer: None,
            not_before,
            not_after,
        };
        let certificate = IdentityCertificate::sign(body, &keypair)?;
        Ok(Self {
            keypair,
            chain: CertificateChain::new(vec![certificate]),
            next_serial: AtomicU64::new(1),
        })
    }

    /// This authority's own certificate.
    pub fn certificate(&self) -> &IdentityCertificate {
        // A chain is always built with the authority's certificate first.
        &self.chain.as_slice()[0]
    }

    /// This authority's chain, own certificate first.
    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }

    /// Issuing public key.
    pub fn public_key(&self) -> IdentityPublicKey {
        self.keypair.public_key()
    }

    /// Issue a certificate for `public_key`.
    pub fn issue(
        &self,
        subject: Subject,
        public_key: IdentityPublicKey,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<IdentityCertificate> {
        let me = self.certificate();
        if !me.subject().kind.can_issue() {
            return Err(TrustError::NotAnIssuer(me.id()));
        }
        let body = CertificateBody {
            serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
            subject,
            public_key,
            issuer: Some(me.id()),
            not_before,
            not_after,
        };
        IdentityCertificate::sign(body, &self.keypair)
    }

    /// Issue against a verified signing request.
    pub fn sign_request(
        &self,
        request: &CertificateSigningRequest,
    ) -> TrustResult<IdentityCertificate> {
        request.verify()?;
        if request.subject.kind == SubjectKind::Root {
            return Err(TrustError::Bcdns("roots cannot be requested".into()));
        }
        self.issue(
            request.subject.clone(),
            request.public_key,
            request.not_before,
            request.not_after,
        )
    }

    /// Full chain for a leaf issued by this authority.
    pub fn chain_for(&self, leaf: IdentityCertificate) -> CertificateChain {
        let mut certificates = Vec::with_capacity(self.chain.len() + 1);
        certificates.push(leaf);
        certificates.extend(self.chain.iter().cloned());
        CertificateChain::new(certificates)
    }

    /// Generate a key and issue a leaf identity for it.
    pub fn issue_identity(
        &self,
        subject: Subject,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<(IdentityKeyPair, CertificateChain)> {
        let keypair = IdentityKeyPair::generate();
        let leaf = self.issue(subject, keypair.public_key(), not_before, not_after)?;
        Ok((keypair, self.chain_for(leaf)))
    }

    /// Create a subordinate issuing authority.
    pub fn issue_intermediate(
        &self,
        name: impl Into<String>,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> TrustResult<CertificateAuthority> {
        let keypair = IdentityKeyPair::generate();
        let certificate = self.issue(
            Subject::new(SubjectKind::Intermediate, name),
            keypair.public_key(),
            not_before,
            not_after,
        )?;
        Ok(CertificateAuthority {
            keypair,
            chain: self.chain_for(certificate),
            next_serial: AtomicU64::new(1),
        })
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("subject", self.certificate().subject())
            .field("id", &self.certificate().id())
            .field("depth", &self.chain.len())
            .finish()
    }
}
