//! # Domain Layer
//!
//! Raw source-chain events, submission outcomes, cycle reports and errors.

pub mod errors;
pub mod event;
pub mod report;

pub use errors::*;
pub use event::*;
pub use report::*;
