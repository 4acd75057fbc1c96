use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chainlet::sync::WsTransport;
use chainlet::{api, Node, NodeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NodeConfig::load()?;
    let node = Arc::new(Node::new(WsTransport::new(config.sync.clone())));

    let p2p = TcpListener::bind(config.p2p_addr)
        .await
        .with_context(|| format!("failed to bind peer listener on {}", config.p2p_addr))?;
    tokio::spawn({
        let node = Arc::clone(&node);
        async move {
            node.transport()
                .serve(p2p, Arc::clone(node.coordinator()))
                .await
        }
    });

    node.connect_all(&config.peers).await;

    let http = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", config.http_addr))?;
    info!(addr = %config.http_addr, "http api listening");

    axum::serve(http, api::router(node)).await?;
    Ok(())
}
