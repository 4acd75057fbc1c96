//! Error types for Chainlet Core.

use thiserror::Error;

/// Why a candidate block or chain was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid index: expected {expected}, got {got}")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("invalid previous hash: expected {expected}, got {got}")]
    InvalidPreviousHash { expected: String, got: String },

    #[error("invalid hash: computed {computed}, got {got}")]
    InvalidHash { computed: String, got: String },

    #[error("first block is not the canonical genesis block")]
    GenesisMismatch,

    #[error("chain is empty")]
    EmptyChain,

    /// A pair deep inside a candidate chain failed.
    #[error("block at position {position} rejected: {source}")]
    InvalidLink {
        position: usize,
        #[source]
        source: Box<ValidationError>,
    },
}
