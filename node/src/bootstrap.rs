// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use bazaar_kernel::PeerAddr;

use crate::engine::SharedEngine;
use crate::errors::NodeError;
use crate::network::PeerClient;

/// Joins the network through `seed`.
///
/// Records the seed under its bootstrap time, asks the seed to register us,
/// then pulls its log once so the node starts with the network's state. Only
/// a failure to record the seed locally is fatal; an unreachable seed is
/// picked up again by later sync rounds.
pub async fn bootstrap(
    engine: &SharedEngine,
    client: &PeerClient,
    seed: &PeerAddr,
    port: u16,
    host: Option<String>,
) -> Result<(), NodeError> {
    let recorded = engine.write().await.record_bootstrap(seed.clone())?;
    if recorded {
        tracing::info!("Seed peer {} recorded", seed);
    }

    if let Err(e) = client.announce(seed, port, host).await {
        tracing::warn!("Could not announce to seed {}: {}", seed, e);
        return Ok(());
    }

    match client.fetch_events(seed).await {
        Ok(remote) => {
            let report = engine.write().await.merge_remote(remote.events);
            tracing::info!(
                "Initial sync from {}: {} events applied",
                seed,
                report.applied
            );
        }
        Err(e) => tracing::warn!("Initial sync from {} failed: {}", seed, e),
    }

    Ok(())
}
