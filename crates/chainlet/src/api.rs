//! Operator HTTP API.
//!
//! ```text
//! GET  /blocks          full chain
//! GET  /blocks/latest   tip
//! POST /mine_block      {"data": "..."} -> new block
//! GET  /peers           registered links
//! POST /add_peer        {"peer": "ws://host:port"} -> link id
//! GET  /health
//! ```

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use chainlet_core::Block;
use chainlet_sync::{LinkId, PeerInfo, Transport};

use crate::node::Node;

/// Body of `POST /mine_block`.
#[derive(Debug, Deserialize)]
pub struct MineRequest {
    pub data: String,
}

/// Body of `POST /add_peer`.
#[derive(Debug, Deserialize)]
pub struct AddPeerRequest {
    pub peer: String,
}

/// Response of `POST /add_peer`.
#[derive(Debug, Serialize)]
pub struct PeerAdded {
    pub id: LinkId,
    pub peer: String,
}

/// Build the router for a node.
pub fn router<T: Transport + 'static>(node: Arc<Node<T>>) -> Router {
    Router::new()
        .route("/blocks", get(blocks::<T>))
        .route("/blocks/latest", get(latest::<T>))
        .route("/mine_block", post(mine_block::<T>))
        .route("/peers", get(peers::<T>))
        .route("/add_peer", post(add_peer::<T>))
        .route("/health", get(health))
        .with_state(node)
}

async fn blocks<T: Transport>(State(node): State<Arc<Node<T>>>) -> Json<Vec<Block>> {
    Json(node.blocks().await)
}

async fn latest<T: Transport>(State(node): State<Arc<Node<T>>>) -> Json<Block> {
    Json(node.latest().await)
}

async fn mine_block<T: Transport>(
    State(node): State<Arc<Node<T>>>,
    Json(request): Json<MineRequest>,
) -> Json<Block> {
    Json(node.mine(request.data).await)
}

async fn peers<T: Transport>(State(node): State<Arc<Node<T>>>) -> Json<Vec<PeerInfo>> {
    Json(node.peers().await)
}

async fn add_peer<T: Transport>(
    State(node): State<Arc<Node<T>>>,
    Json(request): Json<AddPeerRequest>,
) -> Result<Json<PeerAdded>, (StatusCode, String)> {
    match node.connect(&request.peer).await {
        Ok(id) => {
            info!(peer = %request.peer, link = %id, "peer added");
            Ok(Json(PeerAdded {
                id,
                peer: request.peer,
            }))
        }
        Err(e) => Err((StatusCode::BAD_GATEWAY, e.to_string())),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
