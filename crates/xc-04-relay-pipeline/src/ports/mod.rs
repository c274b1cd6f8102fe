//! # Ports Layer
//!
//! - `inbound`: API the runtime drives
//! - `outbound`: chain access capability and its registry

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
