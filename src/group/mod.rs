//! Cache groups
//!
//! A group is a named cache namespace. The router only needs to look groups up
//! by name and ask them for a key; how a group stores values is its own
//! business.

mod memory;

pub use memory::MemoryGroup;

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A named cache namespace
#[async_trait]
pub trait Group: Send + Sync {
    /// Group name, as used in request paths
    fn name(&self) -> &str;

    /// Get the value for `key`
    async fn get(&self, key: &str) -> anyhow::Result<Bytes>;
}

/// Registry of the groups served by this node
///
/// Populated at startup and shared with the router. Registration after
/// startup is allowed; the map is behind a lock.
#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<dyn Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group under its name, returning any group it replaces
    pub fn register(&self, group: Arc<dyn Group>) -> Option<Arc<dyn Group>> {
        let name = group.name().to_string();
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, group)
    }

    /// Look up a group by name
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Group>> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered group names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
