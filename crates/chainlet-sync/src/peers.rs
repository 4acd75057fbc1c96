//! The peer set: every currently open link, keyed by [`LinkId`].
//!
//! Broadcast iterates over a snapshot taken under the read lock, so links
//! may register or close concurrently without blocking delivery. Links whose
//! send fails are removed afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::link::{LinkHandle, LinkId, PeerInfo};

/// Result of a broadcast.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Links the message was queued on.
    pub delivered: usize,
    /// Links found dead and removed.
    pub dropped: Vec<LinkId>,
}

/// Registered links.
#[derive(Debug, Default)]
pub struct PeerSet {
    links: RwLock<HashMap<LinkId, LinkHandle>>,
    next_id: AtomicU64,
}

impl PeerSet {
    /// Create an empty peer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh link identity.
    pub fn allocate_id(&self) -> LinkId {
        LinkId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register an open link.
    pub async fn register(&self, handle: LinkHandle) {
        self.links.write().await.insert(handle.id(), handle);
    }

    /// Remove a link. Returns true if it was registered.
    pub async fn remove(&self, id: LinkId) -> bool {
        self.links.write().await.remove(&id).is_some()
    }

    /// Whether a link is registered.
    pub async fn contains(&self, id: LinkId) -> bool {
        self.links.read().await.contains_key(&id)
    }

    /// Number of registered links.
    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    /// Whether no link is registered.
    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }

    /// Info on every registered link, ordered by id.
    pub async fn infos(&self) -> Vec<PeerInfo> {
        let mut infos: Vec<PeerInfo> = self
            .links
            .read()
            .await
            .values()
            .map(LinkHandle::info)
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Send to a single link. A failed send removes the link.
    pub async fn send_to(&self, id: LinkId, text: String) -> Result<()> {
        let handle = self
            .links
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SyncError::PeerNotConnected(id))?;

        if let Err(e) = handle.send(text) {
            self.remove(id).await;
            return Err(e);
        }
        Ok(())
    }

    /// Send the same text to every registered link, best-effort.
    pub async fn broadcast(&self, text: &str) -> BroadcastReport {
        let snapshot: Vec<LinkHandle> = self.links.read().await.values().cloned().collect();

        let mut report = BroadcastReport::default();
        for handle in snapshot {
            match handle.send(text.to_owned()) {
                Ok(()) => report.delivered += 1,
                Err(_) => report.dropped.push(handle.id()),
            }
        }

        if !report.dropped.is_empty() {
            let mut links = self.links.write().await;
            for id in &report.dropped {
                links.remove(id);
                debug!(link = %id, "dropped dead link during broadcast");
            }
        }

        report
    }
}
