//! # Shared Crypto
//!
//! Cryptographic primitives used by the trust store and the endorsement
//! protocol.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Claim digests, certificate ids |
//! | `signatures` | Ed25519 | Certificate and verdict signing |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **SHA-256**: The digest committee members sign is always
//!   `SHA-256(payload)`, never the payload itself

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Hash};
pub use signatures::{IdentityKeyPair, IdentityPublicKey, IdentitySignature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
