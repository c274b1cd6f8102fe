//! # Domain Errors
//!
//! Error types for certificate validation and root management.

use super::certificate::CertificateId;
use shared_types::Timestamp;
use thiserror::Error;

/// Trust store result alias.
pub type TrustResult<T> = Result<T, TrustError>;

/// Trust errors.
///
/// A trust error on a verdict discards that verdict; it never aborts an
/// endorsement round on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// Chain contained no certificates.
    #[error("Certificate chain is empty")]
    EmptyChain,

    /// Chain exceeds the configured depth.
    #[error("Certificate chain too long: {depth} > {max}")]
    ChainTooLong {
        /// Certificates in the chain.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A certificate in the chain (or its anchoring root) is revoked.
    #[error("Certificate revoked: {0}")]
    Revoked(CertificateId),

    /// `as_of` is past `not_after`.
    #[error("Certificate {id} expired at {not_after} (as of {as_of})")]
    Expired {
        /// Offending certificate.
        id: CertificateId,
        /// End of validity.
        not_after: Timestamp,
        /// Validation instant.
        as_of: Timestamp,
    },

    /// `as_of` is before `not_before`.
    #[error("Certificate {id} not valid before {not_before} (as of {as_of})")]
    NotYetValid {
        /// Offending certificate.
        id: CertificateId,
        /// Start of validity.
        not_before: Timestamp,
        /// Validation instant.
        as_of: Timestamp,
    },

    /// Signature over the to-be-signed bytes does not verify.
    #[error("Bad signature on certificate {0}")]
    BadSignature(CertificateId),

    /// Certificate names a different issuer than the next link.
    #[error("Certificate {child} is not issued by {parent}")]
    IssuerMismatch {
        /// Certificate being checked.
        child: CertificateId,
        /// The link that was expected to be its issuer.
        parent: CertificateId,
    },

    /// A non-issuing subject appears above the leaf.
    #[error("Certificate {0} is not allowed to issue")]
    NotAnIssuer(CertificateId),

    /// The chain does not end at, or directly under, an active root.
    #[error("Certificate {0} does not anchor at an active root")]
    UntrustedRoot(CertificateId),

    /// Stored id does not match the certificate body.
    #[error("Malformed certificate: {0}")]
    Malformed(String),

    /// Rotation version is not `current + 1`.
    #[error("Stale root rotation: current version {current}, proposed {proposed}")]
    StaleRotation {
        /// Active version.
        current: u64,
        /// Version carried by the rotation.
        proposed: u64,
    },

    /// Rotation content rejected.
    #[error("Invalid root rotation: {0}")]
    InvalidRotation(String),

    /// BCDNS refused or failed a request.
    #[error("BCDNS error: {0}")]
    Bcdns(String),

    /// BCDNS call exceeded its deadline.
    #[error("BCDNS request timed out after {0} ms")]
    Timeout(u64),

    /// Canonical encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<bincode::Error> for TrustError {
    fn from(err: bincode::Error) -> Self {
        TrustError::Encoding(err.to_string())
    }
}
