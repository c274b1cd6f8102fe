//! # Ports Layer
//!
//! Inbound API used by the endorsement coordinator and outbound BCDNS port.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
