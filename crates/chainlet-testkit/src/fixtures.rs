//! Test fixtures and helpers.
//!
//! Deterministic chains for unit tests and in-process networks for
//! integration tests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chainlet_core::{Block, Ledger};
use chainlet_sync::{MemoryNetwork, SyncCoordinator, Transport};

/// Timestamp of the first block a fixture mines.
pub const BASE_TIMESTAMP: i64 = 1_600_000_000_000;

/// Spacing between fork timestamps, so forks never collide with the trunk.
const FORK_OFFSET: i64 = 1_000_000;

/// A chain built with deterministic timestamps.
#[derive(Debug, Clone)]
pub struct ChainFixture {
    ledger: Ledger,
    next_timestamp: i64,
}

#[allow(clippy::len_without_is_empty)]
impl ChainFixture {
    /// Genesis only.
    pub fn new() -> Self {
        Self::starting_at(BASE_TIMESTAMP)
    }

    /// Genesis only, with mined blocks stamped from `timestamp` upward.
    pub fn starting_at(timestamp: i64) -> Self {
        Self {
            ledger: Ledger::new(),
            next_timestamp: timestamp,
        }
    }

    /// Genesis followed by one block per payload.
    pub fn with_payloads<S: AsRef<str>>(payloads: &[S]) -> Self {
        let mut fixture = Self::new();
        for data in payloads {
            fixture.push(data.as_ref());
        }
        fixture
    }

    /// Genesis followed by `count` blocks named `{prefix}{n}`.
    pub fn with_len(prefix: &str, count: usize) -> Self {
        let mut fixture = Self::new();
        fixture.extend(prefix, count);
        fixture
    }

    /// Mine one block onto the tip.
    pub fn push(&mut self, data: impl Into<String>) -> Block {
        let block = self.ledger.generate_next_at(data, self.next_timestamp);
        self.next_timestamp += 1;
        self.ledger.append(block.clone());
        block
    }

    /// Mine `count` blocks named `{prefix}{n}`.
    pub fn extend(&mut self, prefix: &str, count: usize) -> &mut Self {
        for _ in 0..count {
            let n = self.ledger.len();
            self.push(format!("{prefix}{n}"));
        }
        self
    }

    /// A divergent copy sharing the first `keep` blocks (genesis counts).
    ///
    /// Blocks mined on the fork get later timestamps than anything on this
    /// chain, so they never hash the same as the trunk's.
    pub fn fork(&self, keep: usize) -> Self {
        let keep = keep.clamp(1, self.ledger.len());
        let ledger = Ledger::from_blocks(self.ledger.blocks()[..keep].to_vec())
            .expect("prefix of a valid chain is valid");
        Self {
            ledger,
            next_timestamp: self.next_timestamp + FORK_OFFSET,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    /// The full chain, genesis first.
    pub fn blocks(&self) -> Vec<Block> {
        self.ledger.blocks().to_vec()
    }

    /// Every block after genesis.
    pub fn tail(&self) -> Vec<Block> {
        self.ledger.blocks()[1..].to_vec()
    }

    pub fn tip(&self) -> Block {
        self.ledger.latest().clone()
    }

    pub fn len(&self) -> usize {
        self.ledger.len()
    }
}

impl Default for ChainFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes sharing one in-process network, registered as `node-0`, `node-1`, ...
pub struct MemoryMesh {
    pub network: Arc<MemoryNetwork>,
    pub nodes: Vec<Arc<SyncCoordinator>>,
}

impl MemoryMesh {
    /// One node per ledger, no links yet.
    pub async fn new(ledgers: Vec<Ledger>) -> Self {
        let network = MemoryNetwork::new();
        let mut nodes = Vec::with_capacity(ledgers.len());
        for (i, ledger) in ledgers.into_iter().enumerate() {
            let node = SyncCoordinator::shared(ledger);
            network.register(Self::name(i), Arc::clone(&node)).await;
            nodes.push(node);
        }
        Self { network, nodes }
    }

    /// `count` nodes holding only genesis.
    pub async fn fresh(count: usize) -> Self {
        Self::new((0..count).map(|_| Ledger::new()).collect()).await
    }

    pub fn name(i: usize) -> String {
        format!("node-{i}")
    }

    /// Link node `from` to node `to`.
    pub async fn link(&self, from: usize, to: usize) {
        self.network
            .connect(&self.nodes[from], &Self::name(to))
            .await
            .expect("memory link");
    }

    /// Link consecutive nodes: 0-1, 1-2, ...
    pub async fn link_line(&self) {
        for i in 1..self.nodes.len() {
            self.link(i - 1, i).await;
        }
    }

    /// Whether every node holds the same chain.
    pub async fn converged(&self) -> bool {
        let Some(first) = self.nodes.first() else {
            return true;
        };
        let reference = first.chain().await;
        for node in &self.nodes[1..] {
            if node.chain().await != reference {
                return false;
            }
        }
        true
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
