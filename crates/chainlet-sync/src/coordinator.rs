//! Sync coordinator: owns the ledger and the peer set, dispatches inbound
//! messages and drives longest-chain reconciliation.
//!
//! All ledger access goes through one `RwLock`. Reconciliation holds the
//! write lock from reading the local tip until the chain is extended or
//! replaced, so two peers racing to extend the chain never interleave; the
//! loser sees the winner's tip on its next read. Broadcasts are sent after
//! the lock is released.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use chainlet_core::{AppendResult, Block, Ledger, ReplaceResult, ValidationError};

use crate::error::Result;
use crate::link::{Direction, LinkId, LinkState, PeerInfo, PeerLink};
use crate::messages::SyncMessage;
use crate::peers::{BroadcastReport, PeerSet};

/// What reconciliation did with a received chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was received.
    Empty,
    /// Our tip is at least as high as theirs.
    AlreadyCurrent { local_index: u64, remote_index: u64 },
    /// Their tip extended ours and was appended, then announced.
    Extended { index: u64 },
    /// Their tip linked to ours but failed validation.
    AppendRejected(ValidationError),
    /// A single unrelated block: we asked every peer for its full chain.
    RequestedFullChain,
    /// A longer divergent chain was offered for replacement.
    Replacement(ReplaceResult),
}

/// How an inbound message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Replied with our tip.
    RepliedLatest,
    /// Replied with our full chain.
    RepliedAll,
    /// Ran reconciliation on a chain response.
    Reconciled(Reconciliation),
    /// Malformed or unknown message, dropped.
    Ignored,
}

/// The sync coordinator of one node.
#[derive(Debug)]
pub struct SyncCoordinator {
    ledger: RwLock<Ledger>,
    peers: PeerSet,
}

impl SyncCoordinator {
    /// Create a coordinator around an existing ledger.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            peers: PeerSet::new(),
        }
    }

    /// Create a coordinator in an `Arc`, ready to hand to transports.
    pub fn shared(ledger: Ledger) -> Arc<Self> {
        Arc::new(Self::new(ledger))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger access
    // ─────────────────────────────────────────────────────────────────────────

    /// Current tip.
    pub async fn latest(&self) -> Block {
        self.ledger.read().await.latest().clone()
    }

    /// Copy of the full chain.
    pub async fn chain(&self) -> Vec<Block> {
        self.ledger.read().await.blocks().to_vec()
    }

    /// Number of blocks, genesis included.
    pub async fn chain_len(&self) -> usize {
        self.ledger.read().await.len()
    }

    /// Create a block from `data`, append it and announce the new tip.
    pub async fn mine_block(&self, data: impl Into<String>) -> Block {
        let tip = {
            let mut ledger = self.ledger.write().await;
            let candidate = ledger.generate_next(data);
            ledger.append(candidate);
            ledger.latest().clone()
        };
        info!(block = %tip, "mined block");
        self.announce(tip.clone()).await;
        tip
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Link lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a new link in `Connecting`.
    pub fn new_link(&self, remote: impl Into<Arc<str>>, direction: Direction) -> PeerLink {
        PeerLink::new(self.peers.allocate_id(), remote, direction)
    }

    /// Open a link: query the peer's tip and register the link.
    pub async fn attach(
        &self,
        link: &mut PeerLink,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Result<LinkId> {
        let handle = link.open(outbound)?;
        let id = handle.id();

        if let Err(e) = handle.send(SyncMessage::QueryLatest.encode()?) {
            link.close();
            return Err(e);
        }

        self.peers.register(handle).await;
        info!(link = %id, remote = link.remote(), direction = ?link.direction(), "peer link open");
        Ok(id)
    }

    /// Close a link and drop it from the peer set.
    ///
    /// Returns true the one time an open link is closed.
    pub async fn detach(&self, link: &mut PeerLink) -> bool {
        match link.close() {
            LinkState::Open => {
                self.peers.remove(link.id()).await;
                info!(link = %link.id(), remote = link.remote(), "peer link closed");
                true
            }
            LinkState::Connecting => {
                debug!(remote = link.remote(), "peer link failed before opening");
                false
            }
            LinkState::Closed => false,
        }
    }

    /// Locally close a link. Its driver observes the close and detaches it.
    pub async fn disconnect(&self, id: LinkId) -> bool {
        let removed = self.peers.remove(id).await;
        if removed {
            info!(link = %id, "disconnecting peer");
        }
        removed
    }

    /// Registered links.
    pub async fn peers(&self) -> Vec<PeerInfo> {
        self.peers.infos().await
    }

    /// Number of registered links.
    pub async fn peer_count(&self) -> usize {
        self.peers.len().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inbound messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Decode and handle a text frame from a link.
    ///
    /// Undecodable frames are logged and dropped; the link stays open.
    pub async fn handle_text(&self, from: LinkId, text: &str) -> Handled {
        match SyncMessage::decode(text) {
            Ok(message) => self.handle_message(from, message).await,
            Err(e) => {
                warn!(link = %from, error = %e, "dropping malformed message");
                Handled::Ignored
            }
        }
    }

    /// Handle a decoded message from a link.
    pub async fn handle_message(&self, from: LinkId, message: SyncMessage) -> Handled {
        debug!(link = %from, kind = ?message.message_type(), "received message");
        match message {
            SyncMessage::QueryLatest => {
                let tip = self.latest().await;
                self.reply(from, SyncMessage::ChainResponse(vec![tip])).await;
                Handled::RepliedLatest
            }
            SyncMessage::QueryAll => {
                let chain = self.chain().await;
                self.reply(from, SyncMessage::ChainResponse(chain)).await;
                Handled::RepliedAll
            }
            SyncMessage::ChainResponse(blocks) => Handled::Reconciled(self.reconcile(blocks).await),
        }
    }

    /// Reconcile our chain with blocks received from a peer.
    ///
    /// 1. Sort by index.
    /// 2. Ignore if their tip is not above ours.
    /// 3. If their tip extends ours, append it and announce the new tip.
    /// 4. If they sent a single unrelated block, ask every peer for its chain.
    /// 5. Otherwise offer the received chain for replacement. Replacement
    ///    is not announced; peers learn of it from their next query.
    pub async fn reconcile(&self, mut received: Vec<Block>) -> Reconciliation {
        received.sort_by_key(|block| block.index);
        let Some(remote_tip) = received.last().cloned() else {
            return Reconciliation::Empty;
        };

        let mut ledger = self.ledger.write().await;
        let local_index = ledger.latest().index;

        if remote_tip.index <= local_index {
            debug!(
                local_index,
                remote_index = remote_tip.index,
                "received chain is not ahead of ours"
            );
            return Reconciliation::AlreadyCurrent {
                local_index,
                remote_index: remote_tip.index,
            };
        }

        if ledger.latest().hash == remote_tip.previous_hash {
            let result = ledger.append(remote_tip);
            let tip = ledger.latest().clone();
            drop(ledger);

            return match result {
                AppendResult::Appended { index } => {
                    info!(block = %tip, "appended block from peer");
                    self.announce(tip).await;
                    Reconciliation::Extended { index }
                }
                AppendResult::Rejected(e) => Reconciliation::AppendRejected(e),
            };
        }

        if received.len() == 1 {
            drop(ledger);
            info!(remote_index = remote_tip.index, "peer is ahead, querying full chain");
            self.broadcast(&SyncMessage::QueryAll).await;
            return Reconciliation::RequestedFullChain;
        }

        Reconciliation::Replacement(ledger.try_replace(received))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outbound messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a message to every registered link, best-effort.
    pub async fn broadcast(&self, message: &SyncMessage) -> BroadcastReport {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode broadcast");
                return BroadcastReport::default();
            }
        };

        let report = self.peers.broadcast(&text).await;
        debug!(
            kind = ?message.message_type(),
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "broadcast"
        );
        report
    }

    /// Announce a tip block to every peer.
    async fn announce(&self, tip: Block) -> BroadcastReport {
        self.broadcast(&SyncMessage::ChainResponse(vec![tip])).await
    }

    /// Reply on a single link. Failure only drops that link.
    async fn reply(&self, to: LinkId, message: SyncMessage) {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(link = %to, error = %e, "failed to encode reply");
                return;
            }
        };
        if let Err(e) = self.peers.send_to(to, text).await {
            warn!(link = %to, error = %e, "failed to reply");
        }
    }
}
