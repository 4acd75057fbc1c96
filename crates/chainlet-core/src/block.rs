//! Block: one immutable ledger entry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::fingerprint;

/// Sentinel previous hash of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Creation time of the genesis block (Unix ms).
pub const GENESIS_TIMESTAMP: i64 = 1_523_232_000_000;

/// Payload of the genesis block.
pub const GENESIS_DATA: &str = "chainlet genesis";

/// Fixed hash of the genesis block.
///
/// This is a well-known constant, not a fingerprint. Genesis is never
/// re-hashed; chains are checked against it by equality.
pub const GENESIS_HASH: &str = "816534932c2b7154836da6afc367695e6337db8a921823784c14378abed4f7d7";

/// A single block of the chain.
///
/// Field names follow the wire format (`previousHash`), so a `Block`
/// serializes to exactly what peers exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain; genesis is 0.
    pub index: u64,
    /// Hash of the preceding block, or `"0"` for genesis.
    pub previous_hash: String,
    /// Creation time (Unix ms). Advisory only, never checked against the clock.
    pub timestamp: i64,
    /// Arbitrary payload.
    pub data: String,
    /// Fingerprint of the four fields above.
    pub hash: String,
}

impl Block {
    /// Build a block and seal it with its fingerprint.
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        timestamp: i64,
        data: impl Into<String>,
    ) -> Self {
        let previous_hash = previous_hash.into();
        let data = data.into();
        let hash = fingerprint(index, &previous_hash, timestamp, &data);
        Self {
            index,
            previous_hash,
            timestamp,
            data,
            hash,
        }
    }

    /// The canonical genesis block every valid chain starts with.
    pub fn genesis() -> Self {
        Self {
            index: 0,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            timestamp: GENESIS_TIMESTAMP,
            data: GENESIS_DATA.to_string(),
            hash: GENESIS_HASH.to_string(),
        }
    }

    /// Whether this block is structurally identical to the canonical genesis.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
            && self.previous_hash == GENESIS_PREVIOUS_HASH
            && self.timestamp == GENESIS_TIMESTAMP
            && self.data == GENESIS_DATA
            && self.hash == GENESIS_HASH
    }

    /// Recompute the fingerprint from the content fields.
    pub fn compute_hash(&self) -> String {
        fingerprint(self.index, &self.previous_hash, self.timestamp, &self.data)
    }

    /// Whether the stored hash matches the recomputed fingerprint.
    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// First 16 characters of the hash, for logs.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..16).unwrap_or(&self.hash)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.index, self.short_hash())
    }
}
