//! Operator HTTP API.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use chainlet::core::{Block, GENESIS_HASH};
use chainlet::sync::MemoryNetwork;
use chainlet::{api, Node};
use chainlet_testkit::ChainFixture;

type MemoryNode = Node<Arc<MemoryNetwork>>;

fn app(node: &Arc<MemoryNode>) -> Router {
    api::router(Arc::clone(node))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, body) = call(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(app, request).await
}

#[tokio::test]
async fn test_health() {
    let node = Arc::new(Node::new(MemoryNetwork::new()));
    let (status, body) = get(app(&node), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_blocks_starts_with_genesis() {
    let node = Arc::new(Node::new(MemoryNetwork::new()));

    let (status, body) = get(app(&node), "/blocks").await;
    assert_eq!(status, StatusCode::OK);
    let blocks = body.as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["index"], 0);
    assert_eq!(blocks[0]["previousHash"], "0");
    assert_eq!(blocks[0]["hash"], GENESIS_HASH);
}

#[tokio::test]
async fn test_mine_block() {
    let node = Arc::new(Node::new(MemoryNetwork::new()));

    let (status, body) = post(app(&node), "/mine_block", json!({ "data": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    let mined: Block = serde_json::from_slice(&body).unwrap();
    assert_eq!(mined.index, 1);
    assert_eq!(mined.data, "hello");
    assert_eq!(mined.previous_hash, GENESIS_HASH);
    assert!(mined.has_valid_hash());

    let (_, latest) = get(app(&node), "/blocks/latest").await;
    assert_eq!(latest["hash"], mined.hash.as_str());

    let (_, blocks) = get(app(&node), "/blocks").await;
    assert_eq!(blocks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_mine_block_requires_data() {
    let node = Arc::new(Node::new(MemoryNetwork::new()));

    let (status, _) = post(app(&node), "/mine_block", json!({ "payload": "x" })).await;
    assert!(status.is_client_error());
    assert_eq!(node.blocks().await.len(), 1);
}

#[tokio::test]
async fn test_add_peer_and_list() {
    let network = MemoryNetwork::new();
    let node = Arc::new(Node::new(Arc::clone(&network)));
    let other = Node::with_ledger(
        ChainFixture::with_len("o", 2).into_ledger(),
        Arc::clone(&network),
    );
    network.register("other", Arc::clone(other.coordinator())).await;

    let (status, body) = post(app(&node), "/add_peer", json!({ "peer": "other" })).await;
    assert_eq!(status, StatusCode::OK);
    let added: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(added["peer"], "other");

    let (status, peers) = get(app(&node), "/peers").await;
    assert_eq!(status, StatusCode::OK);
    let peers = peers.as_array().unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0]["id"], added["id"]);
    assert_eq!(peers[0]["remote"], "other");
    assert_eq!(peers[0]["direction"], "outbound");

    let synced = chainlet_testkit::wait_until(std::time::Duration::from_secs(5), || {
        let node = Arc::clone(&node);
        async move { node.blocks().await.len() == 3 }
    })
    .await;
    assert!(synced);
}

#[tokio::test]
async fn test_add_unreachable_peer_is_bad_gateway() {
    let node = Arc::new(Node::new(MemoryNetwork::new()));

    let (status, body) = post(app(&node), "/add_peer", json!({ "peer": "nobody" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(String::from_utf8_lossy(&body).contains("nobody"));

    let (_, peers) = get(app(&node), "/peers").await;
    assert_eq!(peers, json!([]));
}
