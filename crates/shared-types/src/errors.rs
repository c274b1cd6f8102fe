//! # Error Types
//!
//! Errors raised while constructing shared identifiers.

use thiserror::Error;

/// Maximum length of a chain identifier in bytes.
pub const MAX_CHAIN_ID_LEN: usize = 64;

/// Invalid identifier input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Chain identifier was empty.
    #[error("Chain id must not be empty")]
    EmptyChainId,

    /// Chain identifier exceeded the length limit.
    #[error("Chain id too long: {len} bytes (max {MAX_CHAIN_ID_LEN})")]
    ChainIdTooLong { len: usize },

    /// Chain identifier contains a reserved separator character.
    #[error("Chain id contains reserved character {ch:?}: {id}")]
    ReservedCharacter { id: String, ch: char },

    /// Message key string could not be parsed.
    #[error("Malformed message key: {0}")]
    MalformedKey(String),
}
