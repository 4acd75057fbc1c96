//! The Node: a sync coordinator bound to a transport.

use std::sync::Arc;

use tracing::{info, warn};

use chainlet_core::{Block, Ledger};
use chainlet_sync::{LinkId, PeerInfo, SyncCoordinator, Transport};

use crate::error::Result;

/// A running ledger node.
///
/// Owns the coordinator (ledger plus peer set) and the transport used to
/// dial peers. Inbound listening is transport specific and driven by the
/// caller, see [`chainlet_sync::WsTransport::serve`].
pub struct Node<T: Transport> {
    coordinator: Arc<SyncCoordinator>,
    transport: T,
}

impl<T: Transport> Node<T> {
    /// Create a node holding only the genesis block.
    pub fn new(transport: T) -> Self {
        Self::with_ledger(Ledger::new(), transport)
    }

    /// Create a node around an existing ledger.
    pub fn with_ledger(ledger: Ledger, transport: T) -> Self {
        Self {
            coordinator: SyncCoordinator::shared(ledger),
            transport,
        }
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Chain Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The full chain, genesis first.
    pub async fn blocks(&self) -> Vec<Block> {
        self.coordinator.chain().await
    }

    /// The tip.
    pub async fn latest(&self) -> Block {
        self.coordinator.latest().await
    }

    /// Mine a block carrying `data` and announce it to every peer.
    pub async fn mine(&self, data: impl Into<String>) -> Block {
        self.coordinator.mine_block(data).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Peer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Dial a peer.
    pub async fn connect(&self, peer: &str) -> Result<LinkId> {
        let id = self.transport.connect(&self.coordinator, peer).await?;
        Ok(id)
    }

    /// Dial every peer in turn. Failures are logged and skipped.
    ///
    /// Returns the number of links opened.
    pub async fn connect_all(&self, peers: &[String]) -> usize {
        let mut opened = 0;
        for peer in peers {
            match self.connect(peer).await {
                Ok(id) => {
                    info!(%peer, link = %id, "connected to peer");
                    opened += 1;
                }
                Err(e) => warn!(%peer, error = %e, "failed to connect to peer"),
            }
        }
        opened
    }

    /// Close a link.
    pub async fn disconnect(&self, id: LinkId) -> bool {
        self.coordinator.disconnect(id).await
    }

    /// Registered links.
    pub async fn peers(&self) -> Vec<PeerInfo> {
        self.coordinator.peers().await
    }
}
