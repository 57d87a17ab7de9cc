use clap::Parser;
use peercache::{web, GroupRegistry, MemoryGroup, NodeConfig, PeerRouter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// A cache node that routes keys to their owner
#[derive(Debug, Parser)]
#[command(name = "peercache", version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides the config file
    #[arg(long)]
    listen: Option<String>,

    /// Address peers reach this node at, overrides the config file
    #[arg(long)]
    self_addr: Option<String>,

    /// Peer address, repeatable; replaces the config file list.
    /// `http://` is assumed when no scheme is given
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Initialize logging (INFO unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!("peercache failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(self_addr) = args.self_addr {
        config.self_addr = self_addr;
    }
    if !args.peers.is_empty() {
        config.peers = args.peers;
    }

    info!("peercache starting as {}", config.self_addr);

    // Groups are created before the router, then given the router as picker
    let registry = Arc::new(GroupRegistry::new());
    let mut groups = Vec::with_capacity(config.groups.len());
    for group_config in &config.groups {
        let group = Arc::new(MemoryGroup::new(group_config.name.clone()));
        for (key, value) in &group_config.entries {
            group.set(key.clone(), value.clone().into_bytes());
        }
        info!("Group '{}' seeded with {} entries", group_config.name, group.len());
        registry.register(group.clone());
        groups.push(group);
    }

    let router = Arc::new(PeerRouter::new(
        config.self_addr.clone(),
        registry,
        config.router.clone(),
    )?);

    if !config.peers.is_empty() {
        router.install_peers(config.peers.clone())?;
    }

    for group in &groups {
        group.register_peers(router.clone())?;
    }

    let listen_addr = config.listen_addr.clone();
    let server = tokio::spawn(async move { web::run(&listen_addr, router).await });

    tokio::select! {
        result = server => match result {
            Ok(Ok(())) => error!("HTTP server stopped"),
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(e.into()),
        },
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
