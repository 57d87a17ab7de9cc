//! Node configuration
//!
//! Loaded from a JSON file; every field has a default so a node can start
//! with no file at all.

use crate::peers::RouterConfig;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Configuration for one cache node
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,

    /// Address other nodes reach this one at; must match this node's entry in `peers`
    pub self_addr: String,

    /// Initial peer set, including this node
    pub peers: Vec<String>,

    pub router: RouterConfig,

    /// Groups served by this node, with optional seed entries
    pub groups: Vec<GroupConfig>,
}

/// A group to create at startup
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub name: String,

    #[serde(default)]
    pub entries: HashMap<String, String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            listen_addr: "127.0.0.1:8001".to_string(),
            self_addr: "http://127.0.0.1:8001".to_string(),
            peers: Vec::new(),
            router: RouterConfig::default(),
            groups: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parse configuration from a JSON string
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
