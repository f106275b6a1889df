// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const DEFAULT_LOG_FILTER: &str = "bazaar_node=debug,tower_http=debug";

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() -> anyhow::Result<()> {
    // 1. Logs
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    // 2. Metrics
    let handle = PrometheusBuilder::new().install_recorder()?;
    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!(
        "bazaar_events_committed_total",
        "Events appended to the local log, by kind and action"
    );
    metrics::describe_counter!(
        "bazaar_replication_events_applied_total",
        "Events learned from peers"
    );
    metrics::describe_counter!(
        "bazaar_replication_peer_failures_total",
        "Peer pulls that failed or timed out"
    );
    metrics::describe_counter!("bazaar_replication_rounds_total", "Sync rounds started");

    metrics::gauge!("bazaar_node_up", 1.0);
    Ok(())
}

/// Prometheus text exposition of every recorded metric.
pub fn get_metrics() -> String {
    match PROM_HANDLE.get() {
        Some(handle) => handle.render(),
        None => "# metrics not initialized".to_string(),
    }
}
