// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Anti-entropy replication.
//!
//! Every interval the node pulls the full log of each known peer and applies
//! the events it is missing, oldest first. Pulls run without holding the
//! engine lock; each merge takes the write lock once.

use bazaar_kernel::PeerAddr;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::MIN_SYNC_INTERVAL;
use crate::engine::{MergeReport, SharedEngine};
use crate::errors::NodeError;
use crate::network::PeerClient;

pub struct Replicator {
    engine: SharedEngine,
    client: PeerClient,
    self_addr: PeerAddr,
    interval: Duration,
}

impl Replicator {
    pub fn new(
        engine: SharedEngine,
        client: PeerClient,
        self_addr: PeerAddr,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            client,
            self_addr,
            interval: interval.max(MIN_SYNC_INTERVAL),
        }
    }

    /// Runs sync rounds until `shutdown` fires. The first round starts one
    /// interval after the call.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Replication loop started (every {:?})", self.interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sync_round().await;
                }
            }
        }
        tracing::info!("Replication loop stopped");
    }

    /// One pass over every registered peer. Unreachable peers are logged and
    /// skipped; they stay registered.
    pub async fn sync_round(&self) -> MergeReport {
        let peers: Vec<PeerAddr> = {
            let engine = self.engine.read().await;
            engine
                .peers()
                .into_iter()
                .filter(|p| p != &self.self_addr)
                .collect()
        };

        metrics::counter!("bazaar_replication_rounds_total", 1);
        if peers.is_empty() {
            return MergeReport::default();
        }

        let results = join_all(peers.iter().map(|peer| self.sync_with_peer(peer))).await;

        let mut total = MergeReport::default();
        for (peer, result) in peers.iter().zip(results) {
            match result {
                Ok(report) => {
                    total.applied += report.applied;
                    total.already_known += report.already_known;
                    total.rejected += report.rejected;
                }
                Err(e) => {
                    metrics::counter!("bazaar_replication_peer_failures_total", 1);
                    tracing::warn!("Sync with {} failed: {}", peer, e);
                }
            }
        }

        if total.applied > 0 {
            tracing::info!(
                "Sync round applied {} events from {} peers",
                total.applied,
                peers.len()
            );
        }
        total
    }

    /// Pulls `peer`'s log and merges what is missing locally.
    pub async fn sync_with_peer(&self, peer: &PeerAddr) -> Result<MergeReport, NodeError> {
        let remote = self.client.fetch_events(peer).await?;

        let report = self.engine.write().await.merge_remote(remote.events);
        if report.applied > 0 {
            metrics::counter!(
                "bazaar_replication_events_applied_total",
                report.applied as u64
            );
            tracing::debug!("Applied {} events from {}", report.applied, peer);
        }
        Ok(report)
    }
}
