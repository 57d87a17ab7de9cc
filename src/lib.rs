//! peercache - key routing for a distributed key-value cache
//!
//! Every node runs the same pieces:
//! - `ring` maps keys to owning nodes with consistent hashing
//! - `peers` holds the ring and fetches values from remote owners
//! - `protocol` defines the request paths and response envelope between nodes
//! - `group` is the storage side the router serves lookups from
//! - `web` exposes the peer endpoint and the admin API over HTTP

pub mod config;
pub mod group;
pub mod peers;
pub mod protocol;
pub mod ring;
pub mod web;

/// Re-export commonly used types
pub use config::NodeConfig;
pub use group::{Group, GroupRegistry, MemoryGroup};
pub use peers::{FetchError, HttpFetcher, PeerFetcher, PeerPicker, PeerRouter, RouterConfig, ServeError};
pub use protocol::CacheResponse;
pub use ring::{HashRing, RingError};
