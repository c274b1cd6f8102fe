//! # Ports Layer
//!
//! Inbound endorsement API and the outbound committee-member transport.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
