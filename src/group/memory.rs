//! In-memory group
//!
//! Keys owned by a remote peer are fetched from that peer first. When the
//! fetch fails the group answers from its own map instead.

use super::Group;
use crate::peers::{PeerFetcher, PeerPicker};
use crate::protocol::CacheResponse;
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

/// Type alias for our hash map with SipHasher
type EntryMap = HashMap<String, Bytes, BuildHasherDefault<SipHasher13>>;

/// Group backed by a plain in-memory map
pub struct MemoryGroup {
    name: String,

    entries: RwLock<EntryMap>,

    /// Set once, after the router owning this group exists
    peers: OnceLock<Arc<dyn PeerPicker>>,
}

impl MemoryGroup {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryGroup {
            name: name.into(),
            entries: RwLock::new(EntryMap::default()),
            peers: OnceLock::new(),
        }
    }

    /// Store a value locally, returns true if the key is new
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
            .is_none()
    }

    /// Number of locally stored keys
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach the picker used to find remote owners; can only be done once
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> anyhow::Result<()> {
        self.peers
            .set(peers)
            .map_err(|_| anyhow!("peers already registered for group '{}'", self.name))
    }

    fn get_local(&self, key: &str) -> anyhow::Result<Bytes> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("key '{}' not found in group '{}'", key, self.name))
    }

    async fn get_from_peer(&self, fetcher: &dyn PeerFetcher, key: &str) -> anyhow::Result<Bytes> {
        let body = fetcher.fetch(&self.name, key).await?;
        let response = CacheResponse::decode(&body)
            .with_context(|| format!("decoding response from {}", fetcher.base_url()))?;
        Ok(response.value)
    }
}

#[async_trait]
impl Group for MemoryGroup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> anyhow::Result<Bytes> {
        if key.is_empty() {
            bail!("key is required");
        }

        let fetcher = self.peers.get().and_then(|peers| peers.pick_peer(key));
        if let Some(fetcher) = fetcher {
            match self.get_from_peer(fetcher.as_ref(), key).await {
                Ok(value) => {
                    debug!("Group '{}': '{}' served by {}", self.name, key, fetcher.base_url());
                    return Ok(value);
                }
                Err(e) => {
                    warn!("Group '{}': failed to get '{}' from peer: {:#}", self.name, key, e);
                }
            }
        }

        self.get_local(key)
    }
}
