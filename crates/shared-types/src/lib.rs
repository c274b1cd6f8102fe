//! # Shared Types Crate
//!
//! Domain entities shared by every relay subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: chain ids, message keys and the
//!   `CrossChainMessage` entity are defined once, here.
//! - **Stable identity**: a message is identified by the pair
//!   `(source_chain, source_sequence)`; nothing else may mint ids.
//! - **Injectable time**: everything that compares against "now" takes a
//!   [`TimeSource`] so backoff and expiry are deterministic under test.

pub mod clock;
pub mod entities;
pub mod errors;

pub use clock::{ManualClock, SystemTimeSource, TimeSource, Timestamp};
pub use entities::*;
pub use errors::*;
