//! Block and chain validation: index continuity, hash linkage, content hashes.

use crate::block::{Block, GENESIS_HASH};
use crate::error::ValidationError;

/// Validate `candidate` as the direct successor of `previous`.
///
/// Checks, in order:
/// 1. `candidate.index == previous.index + 1`
/// 2. `candidate.previous_hash == previous.hash`
/// 3. `candidate.hash` equals the recomputed fingerprint
pub fn validate_next(candidate: &Block, previous: &Block) -> Result<(), ValidationError> {
    // 1. Index continuity
    if previous.index.checked_add(1) != Some(candidate.index) {
        return Err(ValidationError::InvalidIndex {
            expected: previous.index.saturating_add(1),
            got: candidate.index,
        });
    }

    // 2. Hash linkage
    if candidate.previous_hash != previous.hash {
        return Err(ValidationError::InvalidPreviousHash {
            expected: previous.hash.clone(),
            got: candidate.previous_hash.clone(),
        });
    }

    // 3. Content hash
    let computed = candidate.compute_hash();
    if computed != candidate.hash {
        return Err(ValidationError::InvalidHash {
            computed,
            got: candidate.hash.clone(),
        });
    }

    Ok(())
}

/// Validate a whole chain.
///
/// The first block must equal the canonical genesis block exactly; every
/// following block must pass [`validate_next`] against its predecessor.
pub fn validate_chain(blocks: &[Block]) -> Result<(), ValidationError> {
    let first = blocks.first().ok_or(ValidationError::EmptyChain)?;
    if !first.is_genesis() {
        return Err(ValidationError::GenesisMismatch);
    }

    for (position, pair) in blocks.windows(2).enumerate() {
        validate_next(&pair[1], &pair[0]).map_err(|e| ValidationError::InvalidLink {
            position: position + 1,
            source: Box::new(e),
        })?;
    }

    Ok(())
}

/// Prepend the canonical genesis block when a chain was sent without it.
///
/// Peers may ship the blocks after genesis only. A chain whose first block
/// is index 1 and points at [`GENESIS_HASH`] is anchored by restoring
/// genesis in front. Anything else is returned untouched, so a chain that
/// starts with a foreign block still fails [`validate_chain`].
pub fn anchor_to_genesis(mut blocks: Vec<Block>) -> Vec<Block> {
    let needs_anchor = matches!(
        blocks.first(),
        Some(first) if first.index == 1 && first.previous_hash == GENESIS_HASH
    );
    if needs_anchor {
        blocks.insert(0, Block::genesis());
    }
    blocks
}
