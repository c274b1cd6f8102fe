//! # Adapters
//!
//! In-process BCDNS for dev-nets and tests.

pub mod bcdns;

pub use bcdns::InMemoryBcdns;
