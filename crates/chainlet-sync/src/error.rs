//! Error types for the sync module.

use thiserror::Error;

use crate::link::{LinkId, LinkState};

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message could not be decoded or violates the protocol.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Message carried a type discriminant we do not know.
    #[error("unknown message type: {0}")]
    UnknownMessageType(i64),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// WebSocket protocol or I/O failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Timeout waiting for a connection.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Link is not (or no longer) registered.
    #[error("peer not connected: {0}")]
    PeerNotConnected(LinkId),

    /// Link lifecycle was driven out of order.
    #[error("invalid link transition: {from:?} -> {to:?}")]
    InvalidTransition { from: LinkState, to: LinkState },
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
