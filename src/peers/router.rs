//! Peer router
//!
//! Holds the current hash ring together with one fetcher per peer, and serves
//! lookups coming from other nodes.

use super::{normalize_addr, HttpFetcher, PeerFetcher, PeerPicker};
use crate::group::GroupRegistry;
use crate::protocol::{
    parse_request_path, CacheResponse, EnvelopeError, PathError, DEFAULT_BASE_PATH,
};
use crate::ring::{HashRing, RingError};
use bytes::Bytes;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Configuration for a peer router
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Path prefix peers are served under; starts and ends with `/`
    pub base_path: String,

    /// Virtual points per peer on the ring
    pub replicas: usize,

    /// Transport timeout for remote fetches, in milliseconds
    pub fetch_timeout_ms: u64,
}

impl RouterConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: 50,
            fetch_timeout_ms: 3000,
        }
    }
}

/// Errors returned to a peer calling into this node
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("bad request: {0}")]
    BadRequest(#[from] PathError),

    #[error("no such group: {0}")]
    NoSuchGroup(String),

    #[error("{0}")]
    Lookup(String),

    #[error("encoding response: {0}")]
    Encode(#[from] EnvelopeError),
}

/// One installed peer set
///
/// Ring and fetchers are always built from the same peer list and replaced
/// together.
struct PeerSet {
    version: u64,
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

/// Routes keys to peers and answers peer lookups
pub struct PeerRouter {
    /// This node's own address, as it appears in the peer list
    self_addr: String,

    config: RouterConfig,

    /// Groups served by this node
    groups: Arc<GroupRegistry>,

    /// Shared by every fetcher
    client: reqwest::Client,

    state: Mutex<PeerSet>,
}

impl PeerRouter {
    /// Create a router with no peers installed
    ///
    /// `self_addr` is normalized like peer addresses, so `10.0.0.1:8001` and
    /// `http://10.0.0.1:8001` name the same node.
    pub fn new(
        self_addr: impl AsRef<str>,
        groups: Arc<GroupRegistry>,
        config: RouterConfig,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.base_path.starts_with('/') && config.base_path.ends_with('/'),
            "base path must start and end with '/', got {:?}",
            config.base_path
        );

        let ring = HashRing::new(config.replicas)?;
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(PeerRouter {
            self_addr: normalize_addr(self_addr.as_ref()),
            config,
            groups,
            client,
            state: Mutex::new(PeerSet {
                version: 0,
                ring,
                fetchers: HashMap::new(),
            }),
        })
    }

    /// Replace the whole peer set
    ///
    /// Peers missing from `peers` are dropped along with their fetchers.
    /// Addresses are normalized before they go on the ring. Returns the
    /// version of the newly installed set.
    pub fn install_peers<I, S>(&self, peers: I) -> Result<u64, RingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: BTreeSet<String> = peers
            .into_iter()
            .map(|peer| normalize_addr(peer.as_ref()))
            .collect();

        let mut ring = HashRing::new(self.config.replicas)?;
        ring.add(&peers);

        let fetchers: HashMap<String, Arc<HttpFetcher>> = peers
            .iter()
            .map(|peer| {
                let fetcher = HttpFetcher::new(peer, &self.config.base_path, self.client.clone());
                (peer.clone(), Arc::new(fetcher))
            })
            .collect();

        let version = {
            let mut state = self.lock();
            state.version += 1;
            state.ring = ring;
            state.fetchers = fetchers;
            state.version
        };

        info!(
            "[Server {}] Installed peer set v{} with {} peers",
            self.self_addr,
            version,
            peers.len()
        );

        Ok(version)
    }

    /// Node owning `key` on the current ring, local or remote
    pub fn owner(&self, key: &str) -> Option<String> {
        self.lock().ring.get(key).map(str::to_string)
    }

    /// Currently installed peers, sorted
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.lock().fetchers.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Version of the installed peer set; 0 before the first install
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Answer a lookup from a peer
    ///
    /// `path` is the raw request path, still percent-encoded.
    pub async fn serve_path(&self, path: &str) -> Result<Bytes, ServeError> {
        debug!("[Server {}] GET {}", self.self_addr, path);

        let (group_name, key) = parse_request_path(&self.config.base_path, path)?;

        let group = self
            .groups
            .lookup(&group_name)
            .ok_or(ServeError::NoSuchGroup(group_name))?;

        let value = group
            .get(&key)
            .await
            .map_err(|e| ServeError::Lookup(format!("{:#}", e)))?;

        Ok(CacheResponse::new(value).encode()?)
    }

    /// The peer set is replaced whole, so a poisoned lock still guards a
    /// consistent ring/fetchers pair.
    fn lock(&self) -> MutexGuard<'_, PeerSet> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PeerPicker for PeerRouter {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let state = self.lock();

        let owner = state.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }

        match state.fetchers.get(owner) {
            Some(fetcher) => {
                debug!("[Server {}] Pick peer {}", self.self_addr, owner);
                Some(fetcher.clone() as Arc<dyn PeerFetcher>)
            }
            None => {
                error!(
                    "[Server {}] Ring v{} names peer {} with no fetcher",
                    self.self_addr, state.version, owner
                );
                None
            }
        }
    }
}
