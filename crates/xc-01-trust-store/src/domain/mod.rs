//! # Domain Layer
//!
//! Certificates, root sets, revocations and the pure chain-validation walk.

pub mod certificate;
pub mod errors;
pub mod issuance;
pub mod revocation;
pub mod root_set;
pub mod validation;

pub use certificate::*;
pub use errors::*;
pub use issuance::*;
pub use revocation::*;
pub use root_set::*;
pub use validation::*;
