// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use bazaar_kernel::{NodeId, PeerAddr};
use bazaar_node::bootstrap::bootstrap;
use bazaar_node::config::{NodeConfig, DEFAULT_HOST};
use bazaar_node::engine::Engine;
use bazaar_node::network::PeerClient;
use bazaar_node::replication::Replicator;
use bazaar_node::server::{build_router, serve};
use bazaar_node::telemetry::init_telemetry;
use clap::Parser;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Replicated peer-to-peer marketplace node", long_about = None)]
struct Cli {
    /// Port to listen on
    port: u16,

    /// Existing node to join through, as host:port
    seed: Option<PeerAddr>,

    /// Host other nodes use to reach this one [default: 127.0.0.1]
    #[arg(long)]
    host: Option<String>,

    /// Fixed node id (defaults to host:port plus a per-process tag)
    #[arg(long)]
    node_id: Option<NodeId>,

    /// Seconds between anti-entropy rounds
    #[arg(long, default_value_t = 3)]
    sync_interval_secs: u64,

    /// Timeout for each request to a peer, in milliseconds
    #[arg(long, default_value_t = 2000)]
    peer_timeout_ms: u64,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<NodeConfig> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let mut cfg = NodeConfig::for_address(host, self.port)?
            .with_sync_interval(Duration::from_secs(self.sync_interval_secs));
        cfg.peer_timeout = Duration::from_millis(self.peer_timeout_ms);

        cfg = match self.node_id {
            Some(id) => NodeConfig { node_id: id, ..cfg },
            None => {
                let tag = uuid::Uuid::new_v4().simple().to_string();
                cfg.with_incarnation(&tag[..8])?
            }
        };
        if let Some(seed) = self.seed {
            cfg = cfg.with_seed(seed);
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Without --host the seed registers us under the address it sees.
    let announced_host = cli.host.clone();
    let cfg = cli.into_config()?;

    init_telemetry()?;
    tracing::info!("Initializing marketplace node with config: {:?}", cfg);

    let engine = Engine::new(&cfg).into_shared();
    let client = PeerClient::new(cfg.peer_timeout)?;

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("Listening on {} as {}", cfg.bind_addr, cfg.node_id);

    let shutdown = CancellationToken::new();
    let app = build_router(engine.clone());
    let server = tokio::spawn(serve(listener, app, shutdown.clone()));

    if let Some(seed) = &cfg.seed {
        bootstrap(&engine, &client, seed, cfg.advertise_addr.port(), announced_host).await?;
    }

    let replicator = Replicator::new(
        engine.clone(),
        client,
        cfg.advertise_addr.clone(),
        cfg.sync_interval,
    );
    let replication = tokio::spawn(replicator.run(shutdown.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");
    shutdown.cancel();

    replication.await?;
    server.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_loopback_host_is_announced() {
        let cli = Cli::try_parse_from(["bazaar", "9000", "--host", "127.0.0.1"]).unwrap();
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));

        let cli = Cli::try_parse_from(["bazaar", "9000", "127.0.0.1:8000"]).unwrap();
        assert!(cli.host.is_none());
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.advertise_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.seed.unwrap().to_string(), "127.0.0.1:8000");
        assert!(cfg.node_id.as_str().starts_with("127.0.0.1:9000~"));
    }

    #[test]
    fn test_zero_sync_interval_is_clamped() {
        let cli = Cli::try_parse_from(["bazaar", "9000", "--sync-interval-secs", "0"]).unwrap();
        let cfg = cli.into_config().unwrap();
        assert!(!cfg.sync_interval.is_zero());
    }
}
