//! Peer links: one bidirectional connection to a remote node.
//!
//! A [`PeerLink`] is the lifecycle owned by the task driving a connection:
//!
//! ```text
//! Connecting --open()--> Open --close()--> Closed
//!      \____________close()____________/
//! ```
//!
//! `Closed` is terminal; reconnecting needs a fresh link. Opening a link
//! yields a [`LinkHandle`], the cloneable sending half that the coordinator
//! keeps in its peer set.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{Result, SyncError};

/// Connection identity within one node. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// Who initiated the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Accepted by our listener.
    Inbound,
    /// Dialed by us.
    Outbound,
}

/// Lifecycle state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Handshake in progress.
    Connecting,
    /// Registered and exchanging messages.
    Open,
    /// Terminal.
    Closed,
}

/// The lifecycle of one connection.
#[derive(Debug)]
pub struct PeerLink {
    id: LinkId,
    remote: Arc<str>,
    direction: Direction,
    state: LinkState,
}

impl PeerLink {
    /// Start a link in `Connecting`.
    pub(crate) fn new(id: LinkId, remote: impl Into<Arc<str>>, direction: Direction) -> Self {
        Self {
            id,
            remote: remote.into(),
            direction,
            state: LinkState::Connecting,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Handshake done: move to `Open` and bind the outbound queue.
    pub fn open(&mut self, outbound: mpsc::UnboundedSender<String>) -> Result<LinkHandle> {
        if self.state != LinkState::Connecting {
            return Err(SyncError::InvalidTransition {
                from: self.state,
                to: LinkState::Open,
            });
        }
        self.state = LinkState::Open;
        Ok(LinkHandle {
            id: self.id,
            remote: Arc::clone(&self.remote),
            direction: self.direction,
            outbound,
        })
    }

    /// Move to `Closed`, returning the state the link was in.
    ///
    /// Calling it again returns `Closed` and has no effect.
    pub fn close(&mut self) -> LinkState {
        std::mem::replace(&mut self.state, LinkState::Closed)
    }
}

/// Sending half of an open link.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    id: LinkId,
    remote: Arc<str>,
    direction: Direction,
    outbound: mpsc::UnboundedSender<String>,
}

impl LinkHandle {
    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Queue an encoded message. Fails immediately if the link's writer is gone.
    pub fn send(&self, text: String) -> Result<()> {
        self.outbound
            .send(text)
            .map_err(|_| SyncError::PeerNotConnected(self.id))
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Snapshot for operators.
    pub fn info(&self) -> PeerInfo {
        PeerInfo {
            id: self.id,
            remote: self.remote.to_string(),
            direction: self.direction,
        }
    }
}

/// Description of a registered link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerInfo {
    pub id: LinkId,
    pub remote: String,
    pub direction: Direction,
}
