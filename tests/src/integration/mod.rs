//! Cross-subsystem integration tests.

pub mod end_to_end;
pub mod properties;
