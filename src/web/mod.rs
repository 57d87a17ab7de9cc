//! HTTP module
//!
//! Exposes the peer endpoint other nodes fetch from, plus a small admin API
//! used by the control plane to install the peer set.

mod handlers;
mod server;

pub use handlers::{InstallPeersRequest, PeersView};
pub use server::{app, run};
