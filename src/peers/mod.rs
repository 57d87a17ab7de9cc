//! Peer routing module
//!
//! Decides which cluster member owns a key and fetches values from remote
//! members. The router is also the handler remote members call into, so every
//! node runs both sides.

mod fetcher;
mod router;

pub use fetcher::{normalize_addr, HttpFetcher};
pub use router::{PeerRouter, RouterConfig, ServeError};

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

/// Errors from a remote fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection could not be established, or the transport timed out
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The peer answered with a non-success status
    #[error("peer {url} returned: {status}")]
    Status { url: String, status: String },

    /// The response body could not be read to the end
    #[error("reading response body from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches values for a single remote peer
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    /// Fetch the encoded response body for `key` in `group`
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, FetchError>;

    /// Base address requests are sent to
    fn base_url(&self) -> &str;
}

/// Picks the peer owning a key
pub trait PeerPicker: Send + Sync {
    /// Returns `None` when the key should be served locally
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}
