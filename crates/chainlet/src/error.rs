//! Error types for the node.

use chainlet_sync::SyncError;
use thiserror::Error;

/// Errors that can occur running a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Sync or transport error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
