// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Lamport Clock
//!
//! Every event carries a `LogicalTime`. Locally generated events mint a fresh
//! time with [`LamportClock::next`]; events received from a peer keep their
//! original time and the receiver calls [`LamportClock::advance_to`] so that
//! its own later times sort after them.
//!
//! # Ordering
//! - `Bootstrap` times sort before every `Lamport` time.
//! - `Lamport` times compare by counter, then by origin node.
//! - Two nodes can mint the same counter; the origin keeps the keys distinct.

use crate::error::{KernelError, Result};
use crate::types::id::{NodeId, PeerAddr};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

const BOOTSTRAP_TAG: &str = "boot";

/// Key of the event log. Variant order matters: the derived `Ord` puts every
/// bootstrap time before logical time zero.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogicalTime {
    /// Out-of-band time of the peer entry recorded when joining through `seed`.
    Bootstrap { seed: PeerAddr },
    Lamport { counter: u64, origin: NodeId },
}

impl LogicalTime {
    pub fn lamport(counter: u64, origin: NodeId) -> Self {
        LogicalTime::Lamport { counter, origin }
    }

    pub fn bootstrap(seed: PeerAddr) -> Self {
        LogicalTime::Bootstrap { seed }
    }

    /// Raw counter, `None` for bootstrap times.
    pub fn counter(&self) -> Option<u64> {
        match self {
            LogicalTime::Lamport { counter, .. } => Some(*counter),
            LogicalTime::Bootstrap { .. } => None,
        }
    }

    pub fn origin(&self) -> Option<&NodeId> {
        match self {
            LogicalTime::Lamport { origin, .. } => Some(origin),
            LogicalTime::Bootstrap { .. } => None,
        }
    }

    pub fn is_bootstrap(&self) -> bool {
        matches!(self, LogicalTime::Bootstrap { .. })
    }
}

impl fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalTime::Bootstrap { seed } => write!(f, "{BOOTSTRAP_TAG}@{seed}"),
            LogicalTime::Lamport { counter, origin } => write!(f, "{counter}@{origin}"),
        }
    }
}

impl FromStr for LogicalTime {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        let (head, tail) = s
            .split_once('@')
            .ok_or_else(|| KernelError::InvalidInput(format!("invalid logical time {s:?}")))?;
        if head == BOOTSTRAP_TAG {
            return Ok(LogicalTime::bootstrap(tail.parse()?));
        }
        let counter = head
            .parse::<u64>()
            .map_err(|_| KernelError::InvalidInput(format!("invalid logical counter in {s:?}")))?;
        Ok(LogicalTime::lamport(counter, NodeId::new(tail)?))
    }
}

impl TryFrom<String> for LogicalTime {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LogicalTime> for String {
    fn from(time: LogicalTime) -> Self {
        time.to_string()
    }
}

/// Process-local Lamport clock.
///
/// Not internally synchronized: the owner must hold its store-wide lock
/// while calling `next` or `advance_to`.
#[derive(Clone, Debug)]
pub struct LamportClock {
    node: NodeId,
    counter: u64,
}

impl LamportClock {
    pub fn new(node: NodeId) -> Self {
        Self { node, counter: 0 }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Highest counter issued or observed so far.
    pub fn current(&self) -> u64 {
        self.counter
    }

    /// Issues a time strictly greater than everything issued or observed.
    pub fn next(&mut self) -> Result<LogicalTime> {
        self.counter = self
            .counter
            .checked_add(1)
            .ok_or_else(|| KernelError::ClockExhausted(self.node.to_string()))?;
        Ok(LogicalTime::lamport(self.counter, self.node.clone()))
    }

    /// Records an observed time so later `next()` calls sort after it.
    ///
    /// A counter of `u64::MAX` leaves no successor to mint and is refused;
    /// the clock is unchanged on error.
    pub fn advance_to(&mut self, observed: &LogicalTime) -> Result<()> {
        if let Some(counter) = observed.counter() {
            if counter == u64::MAX {
                return Err(KernelError::InvalidInput(format!(
                    "logical time {observed} has no successor"
                )));
            }
            self.counter = self.counter.max(counter);
        }
        Ok(())
    }
}
