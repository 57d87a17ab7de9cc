//! HTTP server implementation

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{cache_handler, install_peers, list_peers};
use crate::peers::PeerRouter;

/// Build the application router
pub fn app(router: Arc<PeerRouter>) -> Router {
    let base_path = router.config().base_path.clone();
    let cache_route = format!("{}*rest", base_path);

    // The bare prefix goes to the same handler so it is rejected as malformed
    Router::new()
        .route(&base_path, get(cache_handler))
        .route(&cache_route, get(cache_handler))
        .route("/_admin/peers", get(list_peers).put(install_peers))
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

/// Run the HTTP server until it fails
pub async fn run(addr: &str, router: Arc<PeerRouter>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "[Server {}] Serving peers on http://{}{}",
        router.self_addr(),
        addr,
        router.config().base_path
    );

    axum::serve(listener, app(router)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Group, GroupRegistry, MemoryGroup};
    use crate::peers::{FetchError, PeerFetcher, PeerPicker, RouterConfig};
    use crate::protocol::CacheResponse;
    use crate::web::PeersView;
    use bytes::Bytes;
    use std::net::SocketAddr;

    /// Start a node on an ephemeral port; `self_addr` is the bound address
    async fn spawn_node(groups: Arc<GroupRegistry>) -> (Arc<PeerRouter>, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Arc::new(
            PeerRouter::new(addr.to_string(), groups, RouterConfig::default()).unwrap(),
        );

        let app = app(router.clone());
        tokio::spawn(async move { axum::serve(listener, app).await });

        (router, addr)
    }

    fn scores_registry() -> Arc<GroupRegistry> {
        let groups = Arc::new(GroupRegistry::new());
        let scores = MemoryGroup::new("scores");
        scores.set("alice", "630");
        groups.register(Arc::new(scores));
        groups
    }

    #[tokio::test]
    async fn test_remote_fetch_roundtrip() {
        let (_remote, remote_addr) = spawn_node(scores_registry()).await;

        // A router whose only peer is the remote node
        let local = PeerRouter::new(
            "127.0.0.1:1",
            Arc::new(GroupRegistry::new()),
            RouterConfig::default(),
        )
        .unwrap();
        local.install_peers([remote_addr.to_string()]).unwrap();

        let fetcher = local.pick_peer("alice").unwrap();
        let body = fetcher.fetch("scores", "alice").await.unwrap();
        assert_eq!(CacheResponse::decode(&body).unwrap().value, Bytes::from("630"));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (_router, addr) = spawn_node(scores_registry()).await;
        let client = reqwest::Client::new();

        let missing_key = client
            .get(format!("http://{}/_cache_/scores", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(missing_key.status(), reqwest::StatusCode::BAD_REQUEST);

        let unknown_group = client
            .get(format!("http://{}/_cache_/players/alice", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown_group.status(), reqwest::StatusCode::NOT_FOUND);

        let bare_prefix = client
            .get(format!("http://{}/_cache_/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(bare_prefix.status(), reqwest::StatusCode::BAD_REQUEST);

        let fetcher = crate::peers::HttpFetcher::new(&addr.to_string(), "/_cache_/", client);
        let result = fetcher.fetch("scores", "bob").await;
        assert!(matches!(result, Err(FetchError::Status { status, .. }) if status.starts_with("500")));
    }

    #[tokio::test]
    async fn test_content_type() {
        let (_router, addr) = spawn_node(scores_registry()).await;

        let response = reqwest::get(format!("http://{}/_cache_/scores/alice", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_admin_install_and_list() {
        let (router, addr) = spawn_node(Arc::new(GroupRegistry::new())).await;
        let client = reqwest::Client::new();
        let url = format!("http://{}/_admin/peers", addr);

        let body = client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(r#"{"peers": ["10.0.0.2:8002", "10.0.0.3:8003"]}"#)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let view: PeersView = serde_json::from_str(&body).unwrap();
        assert_eq!(view.version, 1);
        assert_eq!(view.peers, vec!["http://10.0.0.2:8002", "http://10.0.0.3:8003"]);

        let body = client.get(&url).send().await.unwrap().text().await.unwrap();
        let listed: PeersView = serde_json::from_str(&body).unwrap();
        assert_eq!(listed, view);
        assert_eq!(router.peers(), view.peers);
    }

    #[tokio::test]
    async fn test_single_node_serves_own_keys_locally() {
        let groups = Arc::new(GroupRegistry::new());
        let scores = Arc::new(MemoryGroup::new("scores"));
        scores.set("alice", "630");
        groups.register(scores.clone());

        // Bound as "127.0.0.1:P", listed with a scheme
        let (router, addr) = spawn_node(groups).await;
        router.install_peers([format!("http://{}", addr)]).unwrap();
        scores.register_peers(router.clone()).unwrap();

        assert!(router.pick_peer("alice").is_none());
        let value = tokio::time::timeout(std::time::Duration::from_secs(1), scores.get("alice"))
            .await
            .expect("lookup went through a peer fetch")
            .unwrap();
        assert_eq!(value, Bytes::from("630"));
    }

    #[tokio::test]
    async fn test_group_reads_through_remote_owner() {
        let (_remote, remote_addr) = spawn_node(scores_registry()).await;

        // Local node with an empty copy of the group, owning no keys
        let local_groups = Arc::new(GroupRegistry::new());
        let local_scores = Arc::new(MemoryGroup::new("scores"));
        local_groups.register(local_scores.clone());
        let (local, _local_addr) = spawn_node(local_groups).await;
        local.install_peers([remote_addr.to_string()]).unwrap();
        local_scores.register_peers(local.clone()).unwrap();

        let value = local_scores.get("alice").await.unwrap();
        assert_eq!(value, Bytes::from("630"));
    }
}
