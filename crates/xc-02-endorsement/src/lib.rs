//! # XC-02 Committee Endorsement
//!
//! Obtains quorum-endorsed proofs for cross-chain claims.
//!
//! **Subsystem ID:** 2  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A claim about an event on chain A is only relayed once a quorum of the
//! current committee has independently endorsed it. Every verdict is signed
//! by a key whose BCDNS certificate chain the trust store accepts.
//!
//! ## Protocol rules
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Quorum | accepted `Endorse` count `>= threshold` |
//! | Fail fast | `(total - responded) < (threshold - endorsed)` |
//! | Timeouts | per member, independent; a timeout counts as `Abstain` |
//! | De-duplication | one counted response per member per round |
//! | Epoch pinning | verdicts must echo the round's epoch |
//!
//! ## Module Structure
//!
//! ```text
//! xc-02-endorsement/
//! ├── domain/     # CommitteeEpoch, verdicts, QuorumAccumulator, EndorsedProof
//! ├── ports/      # EndorsementApi (inbound), CommitteeMemberClient (outbound)
//! ├── adapters/   # LocalCommitteeMember
//! └── service.rs  # EndorsementCoordinator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{ClaimPolicy, LocalCommitteeMember};
pub use config::CoordinatorConfig;
pub use domain::{
    check_verdict, CommitteeEpoch, EndorsedProof, EndorsementError, EndorsementRequest,
    EndorsementResult, EndorsementVerdict, EpochRegistry, MemberClientError, MemberId,
    MemberResponse, QuorumAccumulator, QuorumStatus, Tally, VerdictOutcome, VerdictRejection,
};
pub use ports::{CommitteeMemberClient, EndorsementApi};
pub use service::EndorsementCoordinator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
