//! HTTP handlers for the peer endpoint and the admin API

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::peers::{PeerRouter, ServeError};
use crate::protocol::CONTENT_TYPE;

/// Request body for installing a peer set
#[derive(Debug, Deserialize)]
pub struct InstallPeersRequest {
    /// Full peer list, including this node
    pub peers: Vec<String>,
}

/// Current peer set as seen by this node
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PeersView {
    pub self_addr: String,
    pub version: u64,
    pub peers: Vec<String>,
}

impl PeersView {
    fn of(router: &PeerRouter) -> Self {
        PeersView {
            self_addr: router.self_addr().to_string(),
            version: router.version(),
            peers: router.peers(),
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = match self {
            ServeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServeError::NoSuchGroup(_) => StatusCode::NOT_FOUND,
            ServeError::Lookup(_) | ServeError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Serve a lookup from a peer: GET {base_path}{group}/{key}
pub async fn cache_handler(
    State(router): State<Arc<PeerRouter>>,
    uri: Uri,
) -> Result<impl IntoResponse, ServeError> {
    let body = router.serve_path(uri.path()).await.map_err(|e| {
        warn!("[Server {}] {} failed: {}", router.self_addr(), uri.path(), e);
        e
    })?;

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}

/// List the installed peer set
pub async fn list_peers(State(router): State<Arc<PeerRouter>>) -> impl IntoResponse {
    Json(PeersView::of(&router))
}

/// Replace the installed peer set
pub async fn install_peers(
    State(router): State<Arc<PeerRouter>>,
    Json(req): Json<InstallPeersRequest>,
) -> Response {
    info!("Installing {} peers via admin API", req.peers.len());

    match router.install_peers(req.peers) {
        Ok(_) => (StatusCode::OK, Json(PeersView::of(&router))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
