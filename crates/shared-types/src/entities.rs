//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `ChainId`, `MessageKey`, `ChainPair`
//! - **Payload**: `CrossChainMessage`, claim digest

use crate::clock::Timestamp;
use crate::errors::{IdError, MAX_CHAIN_ID_LEN};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Characters reserved for storage key layout and display forms.
const RESERVED_CHARS: [char; 2] = ['/', ':'];

// =============================================================================
// IDENTITY
// =============================================================================

/// Chain identifier, e.g. `"eth-mainnet"` or `"antchain-test"`.
///
/// Free-form so new chain families can be wired in without code changes,
/// but validated: non-empty, bounded, and free of the `/` and `:` separators
/// used in storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    /// Validate and wrap a chain identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::EmptyChainId);
        }
        if id.len() > MAX_CHAIN_ID_LEN {
            return Err(IdError::ChainIdTooLong { len: id.len() });
        }
        if let Some(ch) = id.chars().find(|c| RESERVED_CHARS.contains(c)) {
            return Err(IdError::ReservedCharacter { id, ch });
        }
        Ok(Self(id))
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChainId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl FromStr for ChainId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable message identity: unique per `(source_chain, source_sequence)`.
///
/// This is the idempotency key for ingestion and the primary key of every
/// tracker record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageKey {
    /// Chain on which the originating event was emitted.
    pub source_chain: ChainId,
    /// Sequence number assigned by the source chain.
    pub source_sequence: u64,
}

impl MessageKey {
    /// Create a new key.
    pub fn new(source_chain: ChainId, source_sequence: u64) -> Self {
        Self {
            source_chain,
            source_sequence,
        }
    }

    /// Storage suffix `"{chain}/{sequence:020}"`.
    ///
    /// Zero padding keeps lexicographic prefix scans in sequence order.
    pub fn storage_suffix(&self) -> String {
        format!("{}/{:020}", self.source_chain, self.source_sequence)
    }

    /// Stable 32-byte digest of the key, used where a fixed-width id is needed.
    pub fn digest(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.source_chain.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.source_sequence.to_be_bytes());
        hasher.finalize().into()
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_chain, self.source_sequence)
    }
}

impl FromStr for MessageKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain, seq) = s
            .rsplit_once(':')
            .ok_or_else(|| IdError::MalformedKey(s.to_string()))?;
        let source_sequence = seq
            .parse::<u64>()
            .map_err(|_| IdError::MalformedKey(s.to_string()))?;
        Ok(Self::new(ChainId::new(chain)?, source_sequence))
    }
}

/// Directed `(source, destination)` chain pair.
///
/// Sequence ordering guarantees are scoped to a pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainPair {
    pub source: ChainId,
    pub dest: ChainId,
}

impl fmt::Display for ChainPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.dest)
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// A claim observed on a source chain that must be relayed to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessage {
    /// Stable identity (`source_chain`, `source_sequence`).
    pub key: MessageKey,
    /// Destination chain.
    pub dest_chain: ChainId,
    /// Opaque claim bytes (an event or log from the source chain).
    pub payload: Vec<u8>,
    /// Optional ordering key; delivery per chain pair is non-decreasing in it.
    pub sequence_hint: Option<u64>,
    /// When the relayer first observed the event.
    pub observed_at: Timestamp,
}

impl CrossChainMessage {
    /// Build a message.
    pub fn new(
        key: MessageKey,
        dest_chain: ChainId,
        payload: Vec<u8>,
        sequence_hint: Option<u64>,
        observed_at: Timestamp,
    ) -> Self {
        Self {
            key,
            dest_chain,
            payload,
            sequence_hint,
            observed_at,
        }
    }

    /// Message identifier.
    pub fn id(&self) -> &MessageKey {
        &self.key
    }

    /// Source chain shortcut.
    pub fn source_chain(&self) -> &ChainId {
        &self.key.source_chain
    }

    /// The `(source, destination)` pair this message travels on.
    pub fn chain_pair(&self) -> ChainPair {
        ChainPair {
            source: self.key.source_chain.clone(),
            dest: self.dest_chain.clone(),
        }
    }

    /// `claimDigest = SHA-256(payload)`; the exact bytes committee members sign.
    pub fn claim_digest(&self) -> Hash {
        claim_digest(&self.payload)
    }
}

/// SHA-256 over the raw claim payload.
pub fn claim_digest(payload: &[u8]) -> Hash {
    Sha256::digest(payload).into()
}

/// First eight hex characters of a hash, for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}
