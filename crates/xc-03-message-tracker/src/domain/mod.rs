//! # Domain Layer
//!
//! Relay state machine, tracker records, retry policy and errors.

pub mod backoff;
pub mod errors;
pub mod record;
pub mod state;

pub use backoff::*;
pub use errors::*;
pub use record::*;
pub use state::*;
