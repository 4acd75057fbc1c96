//! Transports that establish peer links.
//!
//! A transport only connects bytes to a coordinator: it opens a
//! [`PeerLink`], attaches it, then drives one reader and one writer until
//! either side closes, at which point it detaches the link. All protocol
//! decisions stay in [`SyncCoordinator`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async_with_config, connect_async_with_config, WebSocketStream};
use tracing::{debug, error, info, instrument, warn};

use crate::coordinator::SyncCoordinator;
use crate::error::{Result, SyncError};
use crate::link::{Direction, LinkId, PeerLink};

/// Configuration for link transports.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Largest WebSocket message accepted, in bytes.
    pub max_message_bytes: usize,
    /// How long to wait for an outbound handshake.
    pub connect_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: 16 * 1024 * 1024,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Something that can dial a peer and attach the resulting link.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dial `peer` and attach the link to `coordinator`.
    ///
    /// On success the link is open and registered, and a `QueryLatest` has
    /// been queued on it.
    async fn connect(&self, coordinator: &Arc<SyncCoordinator>, peer: &str) -> Result<LinkId>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn connect(&self, coordinator: &Arc<SyncCoordinator>, peer: &str) -> Result<LinkId> {
        (**self).connect(coordinator, peer).await
    }
}

/// WebSocket transport.
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    config: SyncConfig,
}

impl WsTransport {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn ws_config(&self) -> WebSocketConfig {
        let mut ws = WebSocketConfig::default();
        ws.max_message_size = Some(self.config.max_message_bytes);
        ws
    }

    /// Accept inbound links forever.
    ///
    /// Each accepted socket is upgraded and driven on its own task; a failed
    /// upgrade only affects that socket.
    pub async fn serve(&self, listener: TcpListener, coordinator: Arc<SyncCoordinator>) {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening for peers");
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let coordinator = Arc::clone(&coordinator);
                    let ws_config = self.ws_config();
                    tokio::spawn(accept_link(coordinator, stream, addr, ws_config));
                }
                Err(e) => {
                    error!(error = %e, "failed to accept peer connection");
                }
            }
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[instrument(skip(self, coordinator))]
    async fn connect(&self, coordinator: &Arc<SyncCoordinator>, peer: &str) -> Result<LinkId> {
        let mut link = coordinator.new_link(peer, Direction::Outbound);
        let dial = connect_async_with_config(peer, Some(self.ws_config()), false);

        let ws = match tokio::time::timeout(self.config.connect_timeout, dial).await {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                coordinator.detach(&mut link).await;
                warn!(error = %e, "failed to connect to peer");
                return Err(e.into());
            }
            Err(_) => {
                coordinator.detach(&mut link).await;
                warn!("timed out connecting to peer");
                return Err(SyncError::Timeout(format!("connecting to {peer}")));
            }
        };

        establish(Arc::clone(coordinator), link, ws).await
    }
}

async fn accept_link(
    coordinator: Arc<SyncCoordinator>,
    stream: TcpStream,
    addr: SocketAddr,
    ws_config: WebSocketConfig,
) {
    let mut link = coordinator.new_link(addr.to_string(), Direction::Inbound);

    match accept_async_with_config(stream, Some(ws_config)).await {
        Ok(ws) => {
            if let Err(e) = establish(coordinator, link, ws).await {
                warn!(%addr, error = %e, "failed to open inbound link");
            }
        }
        Err(e) => {
            coordinator.detach(&mut link).await;
            warn!(%addr, error = %e, "websocket handshake failed");
        }
    }
}

/// Attach an upgraded socket and spawn its reader and writer.
async fn establish<S>(
    coordinator: Arc<SyncCoordinator>,
    mut link: PeerLink,
    ws: WebSocketStream<S>,
) -> Result<LinkId>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let id = coordinator.attach(&mut link, tx).await?;

    // Ends when every handle is dropped (link removed) or the socket fails.
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!(link = %id, error = %e, "write failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    coordinator.handle_text(id, &text).await;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(link = %id, error = %e, "read failed");
                    break;
                }
            }
        }
        coordinator.detach(&mut link).await;
        writer.abort();
    });

    Ok(id)
}

/// In-process transport for tests and simulations.
///
/// Nodes register under a name; connecting creates a pair of links joined by
/// channels, one on each coordinator, with the same lifecycle as a socket.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    /// Named coordinators reachable over channels.
    #[derive(Debug, Default)]
    pub struct MemoryNetwork {
        nodes: RwLock<HashMap<String, Arc<SyncCoordinator>>>,
    }

    impl MemoryNetwork {
        /// Create a new memory network.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Make a coordinator reachable under `name`.
        pub async fn register(&self, name: impl Into<String>, coordinator: Arc<SyncCoordinator>) {
            self.nodes.write().await.insert(name.into(), coordinator);
        }
    }

    #[async_trait]
    impl Transport for MemoryNetwork {
        async fn connect(&self, coordinator: &Arc<SyncCoordinator>, peer: &str) -> Result<LinkId> {
            let remote = self
                .nodes
                .read()
                .await
                .get(peer)
                .cloned()
                .ok_or_else(|| SyncError::TransportError(format!("unknown node: {peer}")))?;

            let mut local_link = coordinator.new_link(peer, Direction::Outbound);
            let mut remote_link =
                remote.new_link(format!("memory:{}", local_link.id()), Direction::Inbound);

            let (to_remote, from_local) = mpsc::unbounded_channel();
            let (to_local, from_remote) = mpsc::unbounded_channel();

            let local_id = coordinator.attach(&mut local_link, to_remote).await?;
            let remote_id = match remote.attach(&mut remote_link, to_local).await {
                Ok(id) => id,
                Err(e) => {
                    coordinator.detach(&mut local_link).await;
                    return Err(e);
                }
            };

            tokio::spawn(pump(Arc::clone(&remote), remote_link, remote_id, from_local));
            tokio::spawn(pump(Arc::clone(coordinator), local_link, local_id, from_remote));

            Ok(local_id)
        }
    }

    /// Feed one direction of a pair into its coordinator until the far side
    /// drops its sender.
    async fn pump(
        coordinator: Arc<SyncCoordinator>,
        mut link: PeerLink,
        id: LinkId,
        mut inbound: mpsc::UnboundedReceiver<String>,
    ) {
        while let Some(text) = inbound.recv().await {
            coordinator.handle_text(id, &text).await;
        }
        coordinator.detach(&mut link).await;
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryNetwork;
    use super::*;
    use chainlet_core::Ledger;

    async fn eventually<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.max_message_bytes, 16 * 1024 * 1024);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));

        let transport = WsTransport::new(config);
        assert_eq!(transport.ws_config().max_message_size, Some(16 * 1024 * 1024));
    }

    #[tokio::test]
    async fn test_memory_connect_registers_both_sides() {
        let network = MemoryNetwork::new();
        let a = SyncCoordinator::shared(Ledger::new());
        let b = SyncCoordinator::shared(Ledger::new());
        network.register("b", Arc::clone(&b)).await;

        network.connect(&a, "b").await.unwrap();

        assert_eq!(a.peer_count().await, 1);
        assert_eq!(b.peer_count().await, 1);
        assert_eq!(a.peers().await[0].direction, Direction::Outbound);
        assert_eq!(b.peers().await[0].direction, Direction::Inbound);
    }

    #[tokio::test]
    async fn test_memory_unknown_node() {
        let network = MemoryNetwork::new();
        let a = SyncCoordinator::shared(Ledger::new());

        assert!(matches!(
            network.connect(&a, "nowhere").await,
            Err(SyncError::TransportError(_))
        ));
        assert_eq!(a.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_memory_disconnect_closes_both_sides() {
        let network = MemoryNetwork::new();
        let a = SyncCoordinator::shared(Ledger::new());
        let b = SyncCoordinator::shared(Ledger::new());
        network.register("b", Arc::clone(&b)).await;

        let id = network.connect(&a, "b").await.unwrap();
        assert!(a.disconnect(id).await);

        let b_closed = eventually(|| {
            let b = Arc::clone(&b);
            async move { b.peer_count().await == 0 }
        })
        .await;
        assert!(b_closed);
        assert_eq!(a.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_memory_link_syncs_tip() {
        let network = MemoryNetwork::new();
        let a = SyncCoordinator::shared(Ledger::new());
        let b = SyncCoordinator::shared(Ledger::new());
        network.register("b", Arc::clone(&b)).await;
        b.mine_block("from b").await;

        network.connect(&a, "b").await.unwrap();

        let synced = eventually(|| {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            async move { a.chain().await == b.chain().await }
        })
        .await;
        assert!(synced);
        assert_eq!(a.latest().await.data, "from b");
    }

    #[tokio::test]
    async fn test_ws_connect_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let a = SyncCoordinator::shared(Ledger::new());
        let transport = WsTransport::new(SyncConfig {
            connect_timeout: Duration::from_secs(2),
            ..SyncConfig::default()
        });

        assert!(transport.connect(&a, &format!("ws://{addr}")).await.is_err());
        assert_eq!(a.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_ws_link_syncs_tip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let b = SyncCoordinator::shared(Ledger::new());
        b.mine_block("over the wire").await;
        let server = WsTransport::default();
        tokio::spawn({
            let b = Arc::clone(&b);
            async move { server.serve(listener, b).await }
        });

        let a = SyncCoordinator::shared(Ledger::new());
        WsTransport::default()
            .connect(&a, &format!("ws://{addr}"))
            .await
            .unwrap();

        let synced = eventually(|| {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            async move { a.chain().await == b.chain().await }
        })
        .await;
        assert!(synced);
        assert_eq!(b.peer_count().await, 1);
    }
}
