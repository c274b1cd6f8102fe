//! # Identity Certificates
//!
//! A BCDNS certificate binds a public key to a subject. The issuer signs the
//! canonical bincode encoding of the [`CertificateBody`]; the certificate id
//! is the SHA-256 of those same bytes.

use super::errors::{TrustError, TrustResult};
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, IdentityKeyPair, IdentityPublicKey, IdentitySignature};
use shared_types::Timestamp;
use std::fmt;

/// Content address of a certificate body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificateId(pub [u8; 32]);

impl CertificateId {
    /// Full hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..6]))
    }
}

impl fmt::Debug for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateId({self})")
    }
}

/// What a certificate identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    /// Self-signed BCDNS trust anchor.
    Root,
    /// Issuing authority below a root.
    Intermediate,
    /// Endorsing committee node.
    CommitteeMember,
    /// Relayer operator.
    Relayer,
    /// A blockchain domain.
    Chain,
}

impl SubjectKind {
    /// Only roots and intermediates may sign other certificates.
    pub fn can_issue(&self) -> bool {
        matches!(self, SubjectKind::Root | SubjectKind::Intermediate)
    }
}

/// Named subject of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    /// Role of the subject.
    pub kind: SubjectKind,
    /// Human-readable name, e.g. a member id or a chain domain.
    pub name: String,
}

impl Subject {
    /// Construct a subject.
    pub fn new(kind: SubjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.kind, self.name)
    }
}

/// The to-be-signed part of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    /// Issuer-assigned serial.
    pub serial: u64,
    /// Identified subject.
    pub subject: Subject,
    /// Key bound to the subject.
    pub public_key: IdentityPublicKey,
    /// Issuing certificate; `None` for a self-signed root.
    pub issuer: Option<CertificateId>,
    /// Start of validity (ms).
    pub not_before: Timestamp,
    /// End of validity (ms).
    pub not_after: Timestamp,
}

impl CertificateBody {
    /// Canonical encoding that issuers sign.
    pub fn tbs_bytes(&self) -> TrustResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Id derived from the canonical encoding.
    pub fn compute_id(&self) -> TrustResult<CertificateId> {
        Ok(CertificateId(sha256(&self.tbs_bytes()?)))
    }
}

/// A signed certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCertificate {
    id: CertificateId,
    body: CertificateBody,
    signature: IdentitySignature,
}

impl IdentityCertificate {
    /// Sign `body` with the issuer's key.
    pub fn sign(body: CertificateBody, issuer_key: &IdentityKeyPair) -> TrustResult<Self> {
        let tbs = body.tbs_bytes()?;
        let id = CertificateId(sha256(&tbs));
        let signature = issuer_key.sign(&tbs);
        Ok(Self {
            id,
            body,
            signature,
        })
    }

    /// Reassemble from parts (e.g. after transport). Integrity is checked
    /// during validation, not here.
    pub fn from_parts(
        id: CertificateId,
        body: CertificateBody,
        signature: IdentitySignature,
    ) -> Self {
        Self {
            id,
            body,
            signature,
        }
    }

    /// Certificate id.
    pub fn id(&self) -> CertificateId {
        self.id
    }

    /// Signed body.
    pub fn body(&self) -> &CertificateBody {
        &self.body
    }

    /// Subject shortcut.
    pub fn subject(&self) -> &Subject {
        &self.body.subject
    }

    /// Bound public key.
    pub fn public_key(&self) -> &IdentityPublicKey {
        &self.body.public_key
    }

    /// Issuer id, `None` when self-signed.
    pub fn issuer(&self) -> Option<CertificateId> {
        self.body.issuer
    }

    /// Issuer's signature.
    pub fn signature(&self) -> &IdentitySignature {
        &self.signature
    }

    /// Whether `as_of` lies inside the validity window (inclusive).
    pub fn is_valid_at(&self, as_of: Timestamp) -> bool {
        self.body.not_before <= as_of && as_of <= self.body.not_after
    }

    /// Recompute the id from the body and compare with the carried id.
    pub fn check_integrity(&self) -> TrustResult<()> {
        let computed = self.body.compute_id()?;
        if computed != self.id {
            return Err(TrustError::Malformed(format!(
                "id {} does not match body digest {}",
                self.id, computed
            )));
        }
        Ok(())
    }

    /// Verify this certificate was signed by `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &IdentityPublicKey) -> TrustResult<()> {
        let tbs = self.body.tbs_bytes()?;
        issuer_key
            .verify(&tbs, &self.signature)
            .map_err(|_| TrustError::BadSignature(self.id))
    }

    /// Enforce the validity window, reporting which bound failed.
    pub fn check_validity(&self, as_of: Timestamp) -> TrustResult<()> {
        if as_of < self.body.not_before {
            return Err(TrustError::NotYetValid {
                id: self.id,
                not_before: self.body.not_before,
                as_of,
            });
        }
        if as_of > self.body.not_after {
            return Err(TrustError::Expired {
                id: self.id,
                not_after: self.body.not_after,
                as_of,
            });
        }
        Ok(())
    }
}

/// Leaf-first certificate chain: `[leaf, issuer, issuer's issuer, ...]`.
///
/// May end at a root certificate or at a direct child of one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateChain(Vec<IdentityCertificate>);

impl CertificateChain {
    /// Wrap an ordered list of certificates.
    pub fn new(certificates: Vec<IdentityCertificate>) -> Self {
        Self(certificates)
    }

    /// The end-entity certificate.
    pub fn leaf(&self) -> Option<&IdentityCertificate> {
        self.0.first()
    }

    /// The top-most certificate carried.
    pub fn top(&self) -> Option<&IdentityCertificate> {
        self.0.last()
    }

    /// Number of certificates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no certificates are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate leaf to top.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityCertificate> {
        self.0.iter()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[IdentityCertificate] {
        &self.0
    }
}

impl From<Vec<IdentityCertificate>> for CertificateChain {
    fn from(certificates: Vec<IdentityCertificate>) -> Self {
        Self(certificates)
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedIdentity {
    /// Leaf subject.
    pub subject: Subject,
    /// Leaf public key.
    pub public_key: IdentityPublicKey,
    /// Leaf certificate id.
    pub certificate_id: CertificateId,
    /// Root the chain anchored at.
    pub root_id: CertificateId,
    /// Root-set version used.
    pub root_version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(key: &IdentityKeyPair) -> CertificateBody {
        CertificateBody {
            serial: 1,
            subject: Subject::new(SubjectKind::Root, "root"),
            public_key: key.public_key(),
            issuer: None,
            not_before: 100,
            not_after: 200,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let key = IdentityKeyPair::from_seed([1; 32]);
        let cert = IdentityCertificate::sign(body(&key), &key).unwrap();

        assert!(cert.check_integrity().is_ok());
        assert!(cert.verify_signed_by(&key.public_key()).is_ok());

        let other = IdentityKeyPair::from_seed([2; 32]);
        assert_eq!(
            cert.verify_signed_by(&other.public_key()),
            Err(TrustError::BadSignature(cert.id()))
        );
    }

    #[test]
    fn test_tampered_body_breaks_integrity() {
        let key = IdentityKeyPair::from_seed([1; 32]);
        let cert = IdentityCertificate::sign(body(&key), &key).unwrap();

        let mut tampered_body = cert.body().clone();
        tampered_body.not_after = u64::MAX;
        let tampered =
            IdentityCertificate::from_parts(cert.id(), tampered_body, *cert.signature());

        assert!(matches!(
            tampered.check_integrity(),
            Err(TrustError::Malformed(_))
        ));
    }

    #[test]
    fn test_validity_window_inclusive() {
        let key = IdentityKeyPair::from_seed([1; 32]);
        let cert = IdentityCertificate::sign(body(&key), &key).unwrap();

        assert!(cert.check_validity(100).is_ok());
        assert!(cert.check_validity(200).is_ok());
        assert!(matches!(
            cert.check_validity(99),
            Err(TrustError::NotYetValid { .. })
        ));
        assert!(matches!(
            cert.check_validity(201),
            Err(TrustError::Expired { .. })
        ));
    }

    #[test]
    fn test_only_authorities_issue() {
        assert!(SubjectKind::Root.can_issue());
        assert!(SubjectKind::Intermediate.can_issue());
        assert!(!SubjectKind::CommitteeMember.can_issue());
        assert!(!SubjectKind::Relayer.can_issue());
        assert!(!SubjectKind::Chain.can_issue());
    }
}
