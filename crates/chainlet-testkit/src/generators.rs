//! Proptest generators for property-based testing.

use proptest::prelude::*;

use chainlet_core::Block;

use crate::fixtures::ChainFixture;

/// Generate block data: printable ASCII plus a sprinkle of unicode.
pub fn block_data() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[ -~]{0,64}",
        1 => "\\PC{0,16}",
    ]
    .prop_map(String::from)
}

/// Generate payloads for a chain of 1 to `max_blocks` mined blocks.
pub fn chain_payloads(max_blocks: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(block_data(), 1..=max_blocks)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Build a valid chain (genesis first) from payloads.
pub fn chain_from_payloads(payloads: &[String]) -> Vec<Block> {
    ChainFixture::with_payloads(payloads).blocks()
}

/// A single-field change that must make a chain invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Bump the index.
    IndexSkip,
    /// Point at a hash that is not the predecessor's.
    WrongPreviousHash,
    /// Change the data without resealing.
    TamperedData,
    /// Replace the stored hash.
    TamperedHash,
}

impl Corruption {
    pub fn apply(self, block: &mut Block) {
        match self {
            Corruption::IndexSkip => block.index += 1,
            Corruption::WrongPreviousHash => block.previous_hash = format!("{}x", block.previous_hash),
            Corruption::TamperedData => block.data.push('!'),
            Corruption::TamperedHash => block.hash = format!("{}x", block.hash),
        }
    }
}

/// Generate a corruption kind.
pub fn corruption() -> impl Strategy<Value = Corruption> {
    prop_oneof![
        Just(Corruption::IndexSkip),
        Just(Corruption::WrongPreviousHash),
        Just(Corruption::TamperedData),
        Just(Corruption::TamperedHash),
    ]
}

/// A valid chain plus a position and a corruption to apply there.
pub fn corrupted_chain(max_blocks: usize) -> impl Strategy<Value = (Vec<Block>, usize, Corruption)> {
    chain_payloads(max_blocks)
        .prop_map(|payloads| chain_from_payloads(&payloads))
        .prop_flat_map(|chain| {
            let len = chain.len();
            (Just(chain), 0..len, corruption())
        })
}
