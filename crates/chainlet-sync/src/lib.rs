//! # Chainlet Sync
//!
//! Gossip protocol that keeps every node on the longest valid chain.
//!
//! ## Overview
//!
//! Nodes hold bidirectional peer links. Each link starts by asking for the
//! peer's tip; every newly mined or newly adopted tip is announced to all
//! links. A node that hears about a tip it cannot link to asks for the full
//! chain and replaces its own if the received one is longer and valid.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainlet_core::Ledger;
//! use chainlet_sync::{SyncCoordinator, Transport, WsTransport};
//!
//! async fn example() -> chainlet_sync::Result<()> {
//!     let coordinator = SyncCoordinator::shared(Ledger::new());
//!     let transport = WsTransport::default();
//!
//!     transport.connect(&coordinator, "ws://127.0.0.1:6001").await?;
//!     coordinator.mine_block("hello").await;
//!     Ok(())
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Node A                              Node B
//!   |-------- QueryLatest ------------>|   (on link open, both ways)
//!   |<------- ChainResponse [tip] -----|
//!   |                                  |
//!   |  tip extends ours: append, announce ChainResponse [tip] to all
//!   |  single unrelated tip:
//!   |-------- QueryAll --------------->|
//!   |<------- ChainResponse [chain] ---|
//!   |  longer and valid: replace
//! ```

pub mod coordinator;
pub mod error;
pub mod link;
pub mod messages;
pub mod peers;
pub mod transport;

pub use coordinator::{Handled, Reconciliation, SyncCoordinator};
pub use error::{Result, SyncError};
pub use link::{Direction, LinkHandle, LinkId, LinkState, PeerInfo, PeerLink};
pub use messages::{MessageType, SyncMessage, WireMessage};
pub use peers::{BroadcastReport, PeerSet};
pub use transport::{memory::MemoryNetwork, SyncConfig, Transport, WsTransport};
