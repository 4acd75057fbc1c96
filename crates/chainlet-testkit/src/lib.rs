//! # Chainlet Testkit
//!
//! Testing utilities for Chainlet.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Deterministic chains, forks and in-process node meshes
//! - **Generators**: Proptest strategies for chains and single-field corruptions
//!
//! ## Test Fixtures
//!
//! ```rust
//! use chainlet_testkit::fixtures::ChainFixture;
//!
//! let trunk = ChainFixture::with_len("a", 3);
//! let mut fork = trunk.fork(2);
//! fork.extend("b", 3);
//! assert!(fork.len() > trunk.len());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use chainlet_testkit::generators::corrupted_chain;
//!
//! proptest! {
//!     #[test]
//!     fn corruption_is_detected((mut chain, at, corruption) in corrupted_chain(8)) {
//!         corruption.apply(&mut chain[at]);
//!         prop_assert!(chainlet_core::validate_chain(&chain).is_err());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{wait_until, ChainFixture, MemoryMesh, BASE_TIMESTAMP};
pub use generators::{chain_from_payloads, Corruption};
