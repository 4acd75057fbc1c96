//! Ledger: the in-memory chain and its mutation rules.
//!
//! The ledger always holds at least the genesis block. It grows one block at
//! a time through [`Ledger::append`] or is swapped wholesale for a strictly
//! longer valid chain through [`Ledger::try_replace`]. Individual blocks are
//! never edited or removed.

use tracing::{debug, info, warn};

use crate::block::Block;
use crate::error::ValidationError;
use crate::validation::{anchor_to_genesis, validate_chain, validate_next};

/// Outcome of [`Ledger::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendResult {
    /// The block extended the chain.
    Appended {
        /// Index of the new tip.
        index: u64,
    },
    /// The block was discarded; the chain is unchanged.
    Rejected(ValidationError),
}

impl AppendResult {
    /// Whether the chain grew.
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendResult::Appended { .. })
    }
}

/// Outcome of [`Ledger::try_replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceResult {
    /// The candidate replaced the local chain.
    Replaced { old_len: usize, new_len: usize },
    /// The candidate was not strictly longer; nothing changed.
    NotLonger { current: usize, candidate: usize },
    /// The candidate failed validation; nothing changed.
    Invalid(ValidationError),
}

impl ReplaceResult {
    /// Whether the local chain was swapped.
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReplaceResult::Replaced { .. })
    }
}

/// The chain owned by one node.
#[derive(Debug, Clone)]
pub struct Ledger {
    blocks: Vec<Block>,
}

#[allow(clippy::len_without_is_empty)]
impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// Create a ledger from an existing chain.
    ///
    /// The chain must pass [`validate_chain`].
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, ValidationError> {
        validate_chain(&blocks)?;
        Ok(Self { blocks })
    }

    /// The tip of the chain. Never fails: genesis is always present.
    pub fn latest(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Build the successor of the current tip, stamped with the current time.
    ///
    /// Does not modify the chain.
    pub fn generate_next(&self, data: impl Into<String>) -> Block {
        self.generate_next_at(data, now_millis())
    }

    /// Build the successor of the current tip with an explicit timestamp.
    pub fn generate_next_at(&self, data: impl Into<String>, timestamp: i64) -> Block {
        let previous = self.latest();
        Block::new(previous.index + 1, previous.hash.clone(), timestamp, data)
    }

    /// Append a block if it validly extends the tip.
    ///
    /// Invalid blocks are dropped and logged; the caller learns the outcome
    /// from the returned value and should re-read [`Ledger::latest`].
    pub fn append(&mut self, candidate: Block) -> AppendResult {
        match validate_next(&candidate, self.latest()) {
            Ok(()) => {
                let index = candidate.index;
                debug!(block = %candidate, "appended block");
                self.blocks.push(candidate);
                AppendResult::Appended { index }
            }
            Err(e) => {
                warn!(block = %candidate, error = %e, "rejected block");
                AppendResult::Rejected(e)
            }
        }
    }

    /// Replace the chain with `candidate` if it is valid and strictly longer.
    ///
    /// A candidate sent without its genesis block is anchored first (see
    /// [`anchor_to_genesis`]). Equal-length and shorter chains never mutate
    /// the ledger, whatever their content.
    pub fn try_replace(&mut self, candidate: Vec<Block>) -> ReplaceResult {
        let candidate = anchor_to_genesis(candidate);
        let current = self.blocks.len();

        if candidate.len() <= current {
            warn!(
                current,
                candidate = candidate.len(),
                "received chain is not longer than ours"
            );
            return ReplaceResult::NotLonger {
                current,
                candidate: candidate.len(),
            };
        }

        if let Err(e) = validate_chain(&candidate) {
            warn!(error = %e, "received chain is invalid");
            return ReplaceResult::Invalid(e);
        }

        let new_len = candidate.len();
        self.blocks = candidate;
        info!(old_len = current, new_len, tip = %self.latest(), "replaced chain");
        ReplaceResult::Replaced {
            old_len: current,
            new_len,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(data: &[&str]) -> Ledger {
        let mut ledger = Ledger::new();
        for (i, d) in data.iter().enumerate() {
            let block = ledger.generate_next_at(*d, 1000 + i as i64);
            assert!(ledger.append(block).is_appended());
        }
        ledger
    }

    #[test]
    fn test_new_ledger_has_genesis() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.latest().is_genesis());
    }

    #[test]
    fn test_generate_next_is_pure() {
        let ledger = Ledger::new();
        let block = ledger.generate_next("hello");
        assert_eq!(ledger.len(), 1);
        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, ledger.latest().hash);
        assert!(block.has_valid_hash());
    }

    #[test]
    fn test_generate_then_append() {
        let mut ledger = Ledger::new();
        let previous = ledger.latest().clone();
        let block = ledger.generate_next("payload");

        assert_eq!(ledger.append(block), AppendResult::Appended { index: 1 });
        assert_eq!(ledger.latest().data, "payload");
        assert_eq!(ledger.latest().index, previous.index + 1);
    }

    #[test]
    fn test_append_rejects_stale_block() {
        let mut ledger = Ledger::new();
        let first = ledger.generate_next_at("a", 1000);
        let competing = ledger.generate_next_at("b", 1001);

        assert!(ledger.append(first).is_appended());
        let result = ledger.append(competing);
        assert!(matches!(
            result,
            AppendResult::Rejected(ValidationError::InvalidIndex { .. })
        ));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest().data, "a");
    }

    #[test]
    fn test_append_rejects_tampered_block() {
        let mut ledger = Ledger::new();
        let mut block = ledger.generate_next_at("a", 1000);
        block.data = "b".into();

        assert!(!ledger.append(block).is_appended());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_replace_with_longer_chain() {
        let mut local = ledger_with(&["a1"]);
        let remote = ledger_with(&["b1", "b2"]);

        let result = local.try_replace(remote.blocks().to_vec());
        assert_eq!(result, ReplaceResult::Replaced { old_len: 2, new_len: 3 });
        assert_eq!(local.blocks(), remote.blocks());
    }

    #[test]
    fn test_replace_tie_is_noop() {
        let mut local = ledger_with(&["a1", "a2"]);
        let before = local.blocks().to_vec();
        let remote = ledger_with(&["b1", "b2"]);

        let result = local.try_replace(remote.blocks().to_vec());
        assert_eq!(result, ReplaceResult::NotLonger { current: 3, candidate: 3 });
        assert_eq!(local.blocks(), &before[..]);
    }

    #[test]
    fn test_replace_shorter_is_noop() {
        let mut local = ledger_with(&["a1", "a2", "a3"]);
        let before = local.blocks().to_vec();
        let remote = ledger_with(&["b1"]);

        assert!(!local.try_replace(remote.blocks().to_vec()).is_replaced());
        assert_eq!(local.blocks(), &before[..]);
    }

    #[test]
    fn test_replace_invalid_longer_chain_is_noop() {
        let mut local = ledger_with(&["a1"]);
        let before = local.blocks().to_vec();
        let mut remote = ledger_with(&["b1", "b2", "b3"]).blocks().to_vec();
        remote[2].data = "tampered".into();

        let result = local.try_replace(remote);
        assert!(matches!(result, ReplaceResult::Invalid(_)));
        assert_eq!(local.blocks(), &before[..]);
    }

    #[test]
    fn test_replace_rejects_foreign_genesis() {
        let mut local = Ledger::new();
        let mut forged_genesis = Block::genesis();
        forged_genesis.data = "mine".into();
        let next = Block::new(1, forged_genesis.hash.clone(), 1000, "x");

        let result = local.try_replace(vec![forged_genesis, next]);
        assert_eq!(result, ReplaceResult::Invalid(ValidationError::GenesisMismatch));
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn test_replace_with_chain_missing_genesis() {
        let mut local = ledger_with(&["a1"]);
        let remote = ledger_with(&["b1", "b2"]);
        let without_genesis = remote.blocks()[1..].to_vec();

        let result = local.try_replace(without_genesis);
        assert_eq!(result, ReplaceResult::Replaced { old_len: 2, new_len: 3 });
        assert_eq!(local.blocks(), remote.blocks());
    }

    #[test]
    fn test_from_blocks_validates() {
        let chain = ledger_with(&["a", "b"]).blocks().to_vec();
        assert_eq!(Ledger::from_blocks(chain.clone()).unwrap().blocks(), &chain[..]);

        let mut broken = chain;
        broken[1].index = 7;
        assert!(Ledger::from_blocks(broken).is_err());
        assert!(Ledger::from_blocks(vec![]).is_err());
    }
}
