// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod clock_tests;

use crate::clock::{LamportClock, LogicalTime};
use crate::event::{Event, EventBody};
use crate::state::market::MarketState;
use crate::types::id::{NodeId, PeerAddr, ProductId};
use crate::types::product::Product;

/// Minimal single-node writer used by the kernel tests: mints a time,
/// applies the body, keeps the event.
pub(crate) struct TestReplica {
    pub clock: LamportClock,
    pub state: MarketState,
    pub events: Vec<Event>,
    next_seq: u64,
}

impl TestReplica {
    pub fn new(name: &str) -> Self {
        Self {
            clock: LamportClock::new(node(name)),
            state: MarketState::new(),
            events: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn commit(&mut self, body: EventBody) -> Event {
        let event = Event::new(self.clock.next().unwrap(), body);
        self.state.apply_event(&event).unwrap();
        self.events.push(event.clone());
        event
    }

    pub fn receive(&mut self, event: &Event) {
        if self.events.iter().any(|e| e.time == event.time) {
            return;
        }
        self.clock.advance_to(&event.time).unwrap();
        self.state.apply_event(event).unwrap();
        self.events.push(event.clone());
    }

    pub fn insert_product(&mut self, name: &str, quantity: u64) -> ProductId {
        self.next_seq += 1;
        let id = ProductId::new(self.next_seq, self.clock.node().clone());
        self.commit(EventBody::ProductInserted {
            product: Product {
                id: id.clone(),
                seller: "tester".into(),
                name: name.into(),
                quantity,
            },
        });
        id
    }

    pub fn purchase(&mut self, id: &ProductId, quantity: u64) -> bool {
        match self.state.quote_purchase(id, quantity) {
            Ok(remaining) => {
                self.commit(EventBody::ProductPurchased {
                    id: id.clone(),
                    quantity,
                    remaining,
                });
                true
            }
            Err(_) => false,
        }
    }

    pub fn bootstrap(&mut self, seed: &PeerAddr) {
        let event = Event::new(
            LogicalTime::bootstrap(seed.clone()),
            EventBody::PeerInserted { addr: seed.clone() },
        );
        self.receive(&event);
    }
}

pub(crate) fn node(name: &str) -> NodeId {
    NodeId::new(name).unwrap()
}

pub(crate) fn peer(addr: &str) -> PeerAddr {
    addr.parse().unwrap()
}
