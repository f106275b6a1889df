// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Log as Primary Truth
//!
//! This module defines the canonical event representation of the marketplace.
//! Every change to the catalog or the peer registry is expressed as an `Event`.
//!
//! # Invariants
//! - Same event log => Same derived state
//! - Events are immutable once appended
//! - A purchase is recorded as the absolute remaining quantity, so replaying
//!   it never depends on the value it was computed from

use crate::clock::LogicalTime;
use crate::types::id::{PeerAddr, ProductId};
use crate::types::product::Product;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Product,
    Peer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventAction {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Product => "product",
            EventKind::Peer => "peer",
        })
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventAction::Insert => "insert",
            EventAction::Update => "update",
            EventAction::Delete => "delete",
        })
    }
}

/// Payload of an event, one variant per kind/action pair that exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventBody {
    /// A product was listed.
    ProductInserted { product: Product },

    /// Name and/or quantity were overwritten.
    ProductUpdated {
        id: ProductId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantity: Option<u64>,
    },

    /// `quantity` units were sold, leaving `remaining`.
    ProductPurchased {
        id: ProductId,
        quantity: u64,
        remaining: u64,
    },

    PeerInserted { addr: PeerAddr },

    PeerDeleted { addr: PeerAddr },
}

impl EventBody {
    pub fn kind(&self) -> EventKind {
        match self {
            EventBody::ProductInserted { .. }
            | EventBody::ProductUpdated { .. }
            | EventBody::ProductPurchased { .. } => EventKind::Product,
            EventBody::PeerInserted { .. } | EventBody::PeerDeleted { .. } => EventKind::Peer,
        }
    }

    pub fn action(&self) -> EventAction {
        match self {
            EventBody::ProductInserted { .. } | EventBody::PeerInserted { .. } => {
                EventAction::Insert
            }
            EventBody::ProductUpdated { .. } | EventBody::ProductPurchased { .. } => {
                EventAction::Update
            }
            EventBody::PeerDeleted { .. } => EventAction::Delete,
        }
    }
}

/// A timestamped state change. `time` is also the event's key in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: LogicalTime,
    pub body: EventBody,
}

impl Event {
    pub fn new(time: LogicalTime, body: EventBody) -> Self {
        Self { time, body }
    }

    pub fn kind(&self) -> EventKind {
        self.body.kind()
    }

    pub fn action(&self) -> EventAction {
        self.body.action()
    }

    /// Returns a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self.body {
            EventBody::ProductInserted { .. } => "ProductInserted",
            EventBody::ProductUpdated { .. } => "ProductUpdated",
            EventBody::ProductPurchased { .. } => "ProductPurchased",
            EventBody::PeerInserted { .. } => "PeerInserted",
            EventBody::PeerDeleted { .. } => "PeerDeleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::NodeId;

    #[test]
    fn test_event_json_shape() {
        let origin = NodeId::new("n1").unwrap();
        let event = Event::new(
            LogicalTime::lamport(3, origin.clone()),
            EventBody::ProductPurchased {
                id: ProductId::new(1, origin),
                quantity: 4,
                remaining: 6,
            },
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["time"], "3@n1");
        assert_eq!(json["body"]["type"], "product_purchased");
        assert_eq!(json["body"]["id"], "1@n1");
        assert_eq!(json["body"]["remaining"], 6);

        let decoded: Event = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_kind_and_action() {
        let addr: PeerAddr = "127.0.0.1:9000".parse().unwrap();
        let body = EventBody::PeerDeleted { addr };
        assert_eq!(body.kind(), EventKind::Peer);
        assert_eq!(body.action(), EventAction::Delete);

        let body = EventBody::ProductPurchased {
            id: ProductId::new(1, NodeId::new("n1").unwrap()),
            quantity: 1,
            remaining: 0,
        };
        assert_eq!(body.kind(), EventKind::Product);
        assert_eq!(body.action(), EventAction::Update);
    }
}
