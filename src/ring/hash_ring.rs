//! Hash ring with virtual nodes
//!
//! Routes keys to nodes using consistent hashing over CRC-32 by default.

use super::RingError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hash function used to place nodes and keys on the ring
///
/// Must be deterministic across process restarts: two nodes that disagree on
/// the hash of a key would route it to different owners.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// CRC-32 (IEEE) checksum, the default ring hash
pub fn default_hash(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Consistent hash ring
///
/// Nodes are only ever added. Membership changes are applied by building a
/// fresh ring from the full node list.
pub struct HashRing {
    /// Hash applied to both virtual node labels and keys
    hash: HashFn,

    /// Number of virtual points per real node
    replicas: usize,

    /// Ring points, sorted ascending after every `add`
    points: Vec<u32>,

    /// Owner of each ring point
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Create an empty ring using the default CRC-32 hash
    pub fn new(replicas: usize) -> Result<Self, RingError> {
        Self::with_hasher(replicas, None)
    }

    /// Create an empty ring with an optional custom hash function
    ///
    /// `None` selects [`default_hash`].
    pub fn with_hasher(replicas: usize, hash: Option<HashFn>) -> Result<Self, RingError> {
        if replicas == 0 {
            return Err(RingError::InvalidReplicas(replicas));
        }

        Ok(HashRing {
            hash: hash.unwrap_or_else(|| Arc::new(default_hash)),
            replicas,
            points: Vec::new(),
            owners: HashMap::new(),
        })
    }

    /// Add nodes to the ring
    ///
    /// Each node gets `replicas` points, computed as `hash(i ++ node)` where `i`
    /// is the decimal index of the replica. Adding a node twice duplicates its
    /// points; rebuild the ring instead.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{}{}", i, node).as_bytes());
                self.points.push(point);
                self.owners.insert(point, node.to_string());
            }
        }

        self.points.sort_unstable();
    }

    /// Get the node owning `key`, or `None` if the ring is empty
    ///
    /// The owner is the node of the first point >= hash(key), wrapping around
    /// to the smallest point when the key hashes past the last one.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.points.partition_point(|&point| point < hash);
        let point = self.points[idx % self.points.len()];

        self.owners.get(&point).map(String::as_str)
    }

    /// Check whether any node has been added
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points on the ring (virtual nodes, not real nodes)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Virtual points per real node
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// The sorted ring points
    pub fn points(&self) -> &[u32] {
        &self.points
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish()
    }
}
