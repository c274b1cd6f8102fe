//! # Domain Layer
//!
//! Committee epochs, verdicts, the quorum accumulator and endorsed proofs.

pub mod accumulator;
pub mod epoch;
pub mod errors;
pub mod proof;
pub mod verdict;

pub use accumulator::*;
pub use epoch::*;
pub use errors::*;
pub use proof::*;
pub use verdict::*;
