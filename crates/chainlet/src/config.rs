//! Node configuration.
//!
//! Defaults are overridden first by environment variables, then by
//! positional arguments:
//!
//! ```text
//! CHAINLET_HTTP_ADDR   HTTP listen address      (default 0.0.0.0:8080)
//! CHAINLET_P2P_ADDR    peer listen address      (default 0.0.0.0:6001)
//! CHAINLET_PEERS       comma-separated peer URLs to dial at startup
//!
//! chainlet <http_port> <p2p_port> [peer_url]
//! ```

use std::env;
use std::net::SocketAddr;

use chainlet_sync::SyncConfig;

use crate::error::{NodeError, Result};

pub const USAGE: &str = "usage: chainlet <http_port> <p2p_port> [peer_url]";

/// Configuration for a node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Operator HTTP API listen address.
    pub http_addr: SocketAddr,
    /// Peer WebSocket listen address.
    pub p2p_addr: SocketAddr,
    /// Peers dialed at startup.
    pub peers: Vec<String>,
    /// Transport configuration.
    pub sync: SyncConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            p2p_addr: SocketAddr::from(([0, 0, 0, 0], 6001)),
            peers: Vec::new(),
            sync: SyncConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Defaults, then environment, then process arguments.
    pub fn load() -> Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_env()?.with_args(&args)
    }

    /// Defaults overridden by `CHAINLET_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("CHAINLET_HTTP_ADDR") {
            config.http_addr = parse_addr("CHAINLET_HTTP_ADDR", &addr)?;
        }
        if let Some(addr) = lookup("CHAINLET_P2P_ADDR") {
            config.p2p_addr = parse_addr("CHAINLET_P2P_ADDR", &addr)?;
        }
        if let Some(peers) = lookup("CHAINLET_PEERS") {
            config.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }

    /// Apply positional arguments: `<http_port> <p2p_port> [peer_url]`.
    ///
    /// No arguments leaves the configuration unchanged.
    pub fn with_args(mut self, args: &[String]) -> Result<Self> {
        match args {
            [] => Ok(self),
            [http, p2p, rest @ ..] if rest.len() <= 1 => {
                self.http_addr.set_port(parse_port(http)?);
                self.p2p_addr.set_port(parse_port(p2p)?);
                if let Some(peer) = rest.first() {
                    self.peers.push(peer.clone());
                }
                Ok(self)
            }
            _ => Err(NodeError::Config(USAGE.into())),
        }
    }
}

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse()
        .map_err(|e| NodeError::Config(format!("{key}={value}: {e}")))
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .parse()
        .map_err(|_| NodeError::Config(format!("invalid port {value:?}; {USAGE}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.p2p_addr.port(), 6001);
        assert!(config.peers.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("CHAINLET_HTTP_ADDR", "127.0.0.1:3001"),
            ("CHAINLET_P2P_ADDR", "127.0.0.1:6005"),
            ("CHAINLET_PEERS", "ws://a:6001, ws://b:6001,,"),
        ]))
        .unwrap();

        assert_eq!(config.http_addr, "127.0.0.1:3001".parse().unwrap());
        assert_eq!(config.p2p_addr, "127.0.0.1:6005".parse().unwrap());
        assert_eq!(config.peers, vec!["ws://a:6001", "ws://b:6001"]);
    }

    #[test]
    fn test_bad_env_addr() {
        let result = NodeConfig::from_lookup(lookup(&[("CHAINLET_P2P_ADDR", "nowhere")]));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn test_positional_args() {
        let config = NodeConfig::default()
            .with_args(&args(&["3001", "6002", "ws://localhost:6001"]))
            .unwrap();
        assert_eq!(config.http_addr.port(), 3001);
        assert_eq!(config.p2p_addr.port(), 6002);
        assert_eq!(config.peers, vec!["ws://localhost:6001"]);

        let config = NodeConfig::default().with_args(&args(&["3001", "6002"])).unwrap();
        assert!(config.peers.is_empty());
    }

    #[test]
    fn test_args_keep_env_host() {
        let config = NodeConfig::from_lookup(lookup(&[("CHAINLET_HTTP_ADDR", "127.0.0.1:1")]))
            .unwrap()
            .with_args(&args(&["3001", "6002"]))
            .unwrap();
        assert_eq!(config.http_addr, "127.0.0.1:3001".parse().unwrap());
    }

    #[test]
    fn test_bad_args() {
        for bad in [
            args(&["3001"]),
            args(&["3001", "6002", "ws://a", "ws://b"]),
            args(&["http", "6002"]),
            args(&["3001", "70000"]),
        ] {
            assert!(
                matches!(NodeConfig::default().with_args(&bad), Err(NodeError::Config(_))),
                "{bad:?} accepted"
            );
        }
    }
}
