//! # Chainlet
//!
//! A minimal distributed ledger node: a hash-linked chain of blocks kept
//! consistent across peers by gossip and longest-valid-chain adoption.
//!
//! ## Overview
//!
//! - **Ledger**: an in-memory chain rooted at a fixed genesis block
//! - **Peer links**: WebSocket connections carrying JSON sync messages
//! - **Sync**: tip announcements, full-chain queries and chain replacement
//! - **Operator API**: HTTP endpoints to inspect the chain, mine and dial peers
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainlet::{api, Node, NodeConfig};
//! use chainlet::sync::WsTransport;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = NodeConfig::default();
//!     let node = Arc::new(Node::new(WsTransport::new(config.sync.clone())));
//!
//!     node.mine("hello").await;
//!     node.connect("ws://127.0.0.1:6002").await?;
//!
//!     let app = api::router(Arc::clone(&node));
//!     let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `chainlet::core` - Blocks, ledger and validation
//! - `chainlet::sync` - Messages, peer links, coordinator and transports

pub mod api;
pub mod config;
pub mod error;
pub mod node;

// Re-export component crates
pub use chainlet_core as core;
pub use chainlet_sync as sync;

pub use config::NodeConfig;
pub use error::{NodeError, Result};
pub use node::Node;

pub use chainlet_core::{Block, Ledger, ValidationError};
pub use chainlet_sync::{SyncConfig, SyncCoordinator, Transport};
