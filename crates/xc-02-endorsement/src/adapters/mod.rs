//! # Adapters
//!
//! In-process committee members for dev-nets and tests.

pub mod local_member;

pub use local_member::{ClaimPolicy, LocalCommitteeMember};
