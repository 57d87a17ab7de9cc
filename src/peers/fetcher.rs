//! HTTP fetcher for one remote peer

use super::{FetchError, PeerFetcher};
use crate::protocol::request_path;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

/// Canonical form of a peer address
///
/// `http://` is assumed when the address carries no scheme, and trailing
/// slashes are dropped. Ring owners and `self_addr` are both stored in this
/// form, so they compare equal however the operator spelled them.
pub fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

/// Fetches values from a single peer over HTTP
///
/// Holds a clone of the router's client, so the transport timeout is the one
/// configured on the router.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Peer address followed by the shared base path
    base_url: String,

    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher for `peer`
    pub fn new(peer: &str, base_path: &str, client: reqwest::Client) -> Self {
        let base_url = format!("{}{}", normalize_addr(peer), base_path);
        HttpFetcher { base_url, client }
    }

    /// Full URL for a lookup
    fn url_for(&self, group: &str, key: &str) -> String {
        request_path(&self.base_url, group, key)
    }
}

#[async_trait]
impl PeerFetcher for HttpFetcher {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, FetchError> {
        let url = self.url_for(group, key);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|source| FetchError::Read { url, source })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
