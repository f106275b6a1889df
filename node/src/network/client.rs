// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::api::{AnnouncePeerRequest, EventsResponse};
use crate::errors::NodeError;
use bazaar_kernel::PeerAddr;
use reqwest::Client;
use std::time::Duration;

/// Outbound HTTP client for talking to other marketplace nodes.
#[derive(Debug, Clone)]
pub struct PeerClient {
    client: Client,
}

impl PeerClient {
    /// Every request is bounded by `timeout`, so a dead peer cannot stall a
    /// sync round.
    pub fn new(timeout: Duration) -> Result<Self, NodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                NodeError::Internal
            })?;
        Ok(Self { client })
    }

    fn url(peer: &PeerAddr, path: &str) -> String {
        format!("http://{}{}", peer, path)
    }

    /// Full event log of `peer`.
    pub async fn fetch_events(&self, peer: &PeerAddr) -> Result<EventsResponse, NodeError> {
        let resp = self
            .client
            .get(Self::url(peer, "/eventos"))
            .send()
            .await
            .map_err(|e| NodeError::unreachable(peer, e))?;

        if !resp.status().is_success() {
            return Err(NodeError::unreachable(
                peer,
                format!("event request failed: {}", resp.status()),
            ));
        }

        resp.json().await.map_err(|e| NodeError::unreachable(peer, e))
    }

    /// Asks `seed` to register this node as `host:port`. Without a `host` the
    /// seed uses the address it sees on the connection.
    pub async fn announce(
        &self,
        seed: &PeerAddr,
        port: u16,
        host: Option<String>,
    ) -> Result<(), NodeError> {
        let resp = self
            .client
            .post(Self::url(seed, "/peer"))
            .json(&AnnouncePeerRequest { port, host })
            .send()
            .await
            .map_err(|e| NodeError::unreachable(seed, e))?;

        if !resp.status().is_success() {
            return Err(NodeError::unreachable(
                seed,
                format!("announce failed: {}", resp.status()),
            ));
        }
        Ok(())
    }
}
