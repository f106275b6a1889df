// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use bazaar_kernel::{NodeId, PeerAddr};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Legacy anti-entropy period.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Floor for the anti-entropy period; a zero period cannot drive a timer.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Address other nodes use to reach this one; also the default node id.
    pub advertise_addr: PeerAddr,
    pub node_id: NodeId,
    /// Optional peer to join through on startup.
    pub seed: Option<PeerAddr>,
    pub sync_interval: Duration,
    /// Upper bound on each outbound peer request.
    pub peer_timeout: Duration,
}

impl NodeConfig {
    /// Config for a node listening on `host:port`, identified by that address.
    pub fn for_address(host: &str, port: u16) -> Result<Self, bazaar_kernel::KernelError> {
        let advertise_addr = PeerAddr::new(host, port)?;
        Ok(Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            node_id: NodeId::from(&advertise_addr),
            advertise_addr,
            seed: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        })
    }

    pub fn with_seed(mut self, seed: PeerAddr) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval.max(MIN_SYNC_INTERVAL);
        self
    }

    /// Qualifies the node id with a per-process tag (`host:port~tag`), so a
    /// restarted node never re-mints times it used before the restart.
    pub fn with_incarnation(mut self, tag: &str) -> Result<Self, bazaar_kernel::KernelError> {
        self.node_id = NodeId::new(format!("{}~{}", self.advertise_addr, tag))?;
        Ok(self)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        let bind_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT));
        let advertise_addr = PeerAddr::from(bind_addr);
        Self {
            bind_addr,
            node_id: NodeId::from(&advertise_addr),
            advertise_addr,
            seed: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }
}
