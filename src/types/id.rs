//! Identity types.

use crate::error::{KernelError, Result};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Identity of a replica. Qualifies every logical time and product id it mints.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains('@') || raw.chars().any(char::is_whitespace) {
            return Err(KernelError::InvalidInput(format!("invalid node id {raw:?}")));
        }
        Ok(NodeId(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        NodeId::new(s)
    }
}

impl TryFrom<String> for NodeId {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self> {
        NodeId::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl From<&PeerAddr> for NodeId {
    fn from(addr: &PeerAddr) -> Self {
        // A validated address never contains '@' or whitespace.
        NodeId(addr.to_string())
    }
}

/// A peer's `host:port`, which is also its identity in the registry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddr {
    host: String,
    port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.is_empty()
            || host.contains('@')
            || host.contains('/')
            || host.chars().any(char::is_whitespace)
        {
            return Err(KernelError::InvalidInput(format!("invalid peer host {host:?}")));
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddr {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| KernelError::InvalidInput(format!("expected host:port, got {s:?}")))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| KernelError::InvalidInput(format!("invalid port in {s:?}")))?;
        PeerAddr::new(host, port)
    }
}

impl TryFrom<String> for PeerAddr {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// IPv6 hosts are bracketed so the textual form stays `host:port`.
impl From<std::net::SocketAddr> for PeerAddr {
    fn from(addr: std::net::SocketAddr) -> Self {
        let host = match addr.ip() {
            std::net::IpAddr::V4(ip) => ip.to_string(),
            std::net::IpAddr::V6(ip) => format!("[{ip}]"),
        };
        Self {
            host,
            port: addr.port(),
        }
    }
}

impl From<PeerAddr> for String {
    fn from(addr: PeerAddr) -> Self {
        addr.to_string()
    }
}

/// Globally unique product id: a per-origin sequence number qualified by the
/// node that minted it. Textual form is `<seq>@<origin>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId {
    pub seq: u64,
    pub origin: NodeId,
}

impl ProductId {
    pub fn new(seq: u64, origin: NodeId) -> Self {
        Self { seq, origin }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.seq, self.origin)
    }
}

impl FromStr for ProductId {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        let (seq, origin) = s
            .split_once('@')
            .ok_or_else(|| KernelError::InvalidInput(format!("expected <seq>@<origin>, got {s:?}")))?;
        let seq = seq
            .parse::<u64>()
            .map_err(|_| KernelError::InvalidInput(format!("invalid product sequence in {s:?}")))?;
        Ok(ProductId::new(seq, NodeId::new(origin)?))
    }
}

impl TryFrom<String> for ProductId {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.to_string()
    }
}

/// How a client names a product: either the bare sequence number or the
/// fully qualified id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawProductRef")]
pub enum ProductRef {
    Seq(u64),
    Qualified(ProductId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductRef {
    Seq(u64),
    Text(String),
}

impl TryFrom<RawProductRef> for ProductRef {
    type Error = KernelError;

    fn try_from(raw: RawProductRef) -> Result<Self> {
        match raw {
            RawProductRef::Seq(seq) => Ok(ProductRef::Seq(seq)),
            RawProductRef::Text(text) => text.parse(),
        }
    }
}

impl FromStr for ProductRef {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        if s.contains('@') {
            return s.parse().map(ProductRef::Qualified);
        }
        s.parse::<u64>()
            .map(ProductRef::Seq)
            .map_err(|_| KernelError::InvalidInput(format!("invalid product id {s:?}")))
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductRef::Seq(seq) => write!(f, "{seq}"),
            ProductRef::Qualified(id) => write!(f, "{id}"),
        }
    }
}

impl From<ProductId> for ProductRef {
    fn from(id: ProductId) -> Self {
        ProductRef::Qualified(id)
    }
}
