//! Sync protocol message types.
//!
//! On the wire every message is a JSON object
//! `{ "type": <int>, "data": <string, optional> }`. For chain responses the
//! `data` string is itself a JSON array of blocks.

use serde::{Deserialize, Serialize};

use chainlet_core::Block;

use crate::error::{Result, SyncError};

/// Wire discriminant of each message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum MessageType {
    /// "Send me your tip block."
    QueryLatest = 0,
    /// "Send me your full chain."
    QueryAll = 1,
    /// A tip announcement or a full chain.
    ChainResponse = 2,
}

impl TryFrom<i64> for MessageType {
    type Error = SyncError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(MessageType::QueryLatest),
            1 => Ok(MessageType::QueryAll),
            2 => Ok(MessageType::ChainResponse),
            other => Err(SyncError::UnknownMessageType(other)),
        }
    }
}

/// The raw JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Message discriminant.
    #[serde(rename = "type")]
    pub kind: i64,
    /// Payload, present only for chain responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Sync protocol messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Ask the peer for its tip.
    QueryLatest,

    /// Ask the peer for its whole chain.
    QueryAll,

    /// Blocks from the peer: a singleton tip or a full chain.
    ChainResponse(Vec<Block>),
}

impl SyncMessage {
    /// The wire discriminant of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            SyncMessage::QueryLatest => MessageType::QueryLatest,
            SyncMessage::QueryAll => MessageType::QueryAll,
            SyncMessage::ChainResponse(_) => MessageType::ChainResponse,
        }
    }

    /// Encode into the JSON text sent over a link.
    pub fn encode(&self) -> Result<String> {
        let data = match self {
            SyncMessage::QueryLatest | SyncMessage::QueryAll => None,
            SyncMessage::ChainResponse(blocks) => Some(serde_json::to_string(blocks)?),
        };
        let wire = WireMessage {
            kind: self.message_type() as i64,
            data,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Decode JSON text received from a link.
    pub fn decode(text: &str) -> Result<Self> {
        let wire: WireMessage = serde_json::from_str(text)?;
        match MessageType::try_from(wire.kind)? {
            MessageType::QueryLatest => Ok(SyncMessage::QueryLatest),
            MessageType::QueryAll => Ok(SyncMessage::QueryAll),
            MessageType::ChainResponse => {
                let data = wire.data.ok_or_else(|| {
                    SyncError::InvalidMessage("chain response without data".into())
                })?;
                let blocks: Vec<Block> = serde_json::from_str(&data)?;
                Ok(SyncMessage::ChainResponse(blocks))
            }
        }
    }
}
