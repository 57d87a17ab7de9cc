//! Consistent hashing module
//!
//! Maps arbitrary keys to the node that owns them. Each real node is expanded
//! into several virtual points on a 32-bit circle so that ownership spreads
//! evenly, and adding a node only moves the keys that land on its new points.

mod hash_ring;

pub use hash_ring::{default_hash, HashFn, HashRing};

use thiserror::Error;

/// Errors raised while building a ring
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// A ring needs at least one virtual point per node
    #[error("replica count must be > 0, got {0}")]
    InvalidReplicas(usize),
}
