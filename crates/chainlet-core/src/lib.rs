//! # Chainlet Core
//!
//! Pure primitives for a Chainlet node: blocks, fingerprints, and the
//! append-only ledger with its validation rules.
//!
//! This crate contains no networking. Validation failures are values, not
//! faults: [`Ledger::append`] and [`Ledger::try_replace`] report what happened
//! through [`AppendResult`] and [`ReplaceResult`] and log the rejection.
//!
//! ## Key Types
//!
//! - [`Block`] - One immutable ledger entry
//! - [`Ledger`] - The in-memory chain, always starting at the genesis block
//! - [`ValidationError`] - Why a block or chain was rejected
//!
//! ## Chain Rules
//!
//! For every adjacent pair `(prev, cur)`:
//!
//! - `cur.index == prev.index + 1`
//! - `cur.previous_hash == prev.hash`
//! - `cur.hash == fingerprint(cur)`
//!
//! and the first block must equal [`Block::genesis`].

pub mod block;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod validation;

pub use block::{Block, GENESIS_DATA, GENESIS_HASH, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
pub use crypto::fingerprint;
pub use error::ValidationError;
pub use ledger::{now_millis, AppendResult, Ledger, ReplaceResult};
pub use validation::{anchor_to_genesis, validate_chain, validate_next};
