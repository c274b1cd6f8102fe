//! # XC-01 Certificate Trust Store
//!
//! Validates BCDNS certificate chains against the active root set.
//!
//! **Subsystem ID:** 1  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every committee verdict carries the certificate chain of the member that
//! signed it. The trust store answers one question: does this chain walk,
//! link by link, to a root that BCDNS currently vouches for?
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Linkage | each certificate signed by its parent's key |
//! | Validity window | `not_before <= as_of <= not_after` on every link |
//! | Revocation | any revoked certificate fails immediately |
//! | Root rotation | only versioned `RootRotation` events, `version = current + 1` |
//! | Snapshot reads | validations hold one `Arc<RootSet>` for their whole walk |
//!
//! ## Module Structure
//!
//! ```text
//! xc-01-trust-store/
//! ├── domain/     # certificates, root sets, revocations, chain validation
//! ├── ports/      # TrustStoreApi (inbound), BcdnsClient (outbound)
//! ├── adapters/   # InMemoryBcdns
//! └── service.rs  # TrustStore
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryBcdns;
pub use config::TrustStoreConfig;
pub use domain::{
    validate_chain, CertificateAuthority, CertificateBody, CertificateChain, CertificateId,
    CertificateSigningRequest, IdentityCertificate, RevocationEntry, RevocationSet, RootRotation,
    RootSet, Subject, SubjectKind, TrustError, TrustResult, TrustedIdentity, MAX_CHAIN_DEPTH,
};
pub use ports::{BcdnsClient, TrustStoreApi};
pub use service::TrustStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
