// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Derived marketplace state.
//!
//! Every field written by an event is a last-writer-wins register stamped
//! with that event's `LogicalTime`. A write carrying an older stamp than the
//! register's is ignored, so the final state depends only on the set of
//! applied events, never on the order they arrived in. Peer removals leave a
//! tombstone for the same reason.

use crate::clock::LogicalTime;
use crate::error::{KernelError, Result};
use crate::event::{Event, EventBody};
use crate::types::id::{NodeId, PeerAddr, ProductId, ProductRef};
use crate::types::product::Product;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Stamped<T> {
    value: T,
    stamp: LogicalTime,
}

impl<T> Stamped<T> {
    fn new(value: T, stamp: &LogicalTime) -> Self {
        Self {
            value,
            stamp: stamp.clone(),
        }
    }

    fn write(&mut self, value: T, stamp: &LogicalTime) {
        if *stamp > self.stamp {
            self.value = value;
            self.stamp = stamp.clone();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ProductRecord {
    /// Earliest insertion seen. Later events on the product must sort after it.
    inserted: LogicalTime,
    seller: Stamped<String>,
    name: Stamped<String>,
    quantity: Stamped<u64>,
}

impl ProductRecord {
    fn to_product(&self, id: &ProductId) -> Product {
        Product {
            id: id.clone(),
            seller: self.seller.value.clone(),
            name: self.name.value.clone(),
            quantity: self.quantity.value,
        }
    }
}

/// Product catalog and peer registry, rebuilt from the event log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarketState {
    products: BTreeMap<ProductId, ProductRecord>,
    peers: BTreeMap<PeerAddr, Stamped<bool>>,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. Validation happens before any write, so an error
    /// leaves the state untouched.
    pub fn apply_event(&mut self, event: &Event) -> Result<()> {
        let stamp = &event.time;
        match &event.body {
            EventBody::ProductInserted { product } => {
                match self.products.get_mut(&product.id) {
                    Some(record) => {
                        if *stamp < record.inserted {
                            record.inserted = stamp.clone();
                        }
                        record.seller.write(product.seller.clone(), stamp);
                        record.name.write(product.name.clone(), stamp);
                        record.quantity.write(product.quantity, stamp);
                    }
                    None => {
                        self.products.insert(
                            product.id.clone(),
                            ProductRecord {
                                inserted: stamp.clone(),
                                seller: Stamped::new(product.seller.clone(), stamp),
                                name: Stamped::new(product.name.clone(), stamp),
                                quantity: Stamped::new(product.quantity, stamp),
                            },
                        );
                    }
                }
            }
            EventBody::ProductUpdated { id, name, quantity } => {
                let record = self.record_for_write(id, stamp)?;
                if let Some(name) = name {
                    record.name.write(name.clone(), stamp);
                }
                if let Some(quantity) = quantity {
                    record.quantity.write(*quantity, stamp);
                }
            }
            EventBody::ProductPurchased { id, remaining, .. } => {
                let record = self.record_for_write(id, stamp)?;
                record.quantity.write(*remaining, stamp);
            }
            EventBody::PeerInserted { addr } => self.write_peer(addr, true, stamp),
            EventBody::PeerDeleted { addr } => self.write_peer(addr, false, stamp),
        }
        Ok(())
    }

    /// A write to an existing product must sort after its insertion, or a
    /// time-ordered replay would meet it before the product exists.
    fn record_for_write(
        &mut self,
        id: &ProductId,
        stamp: &LogicalTime,
    ) -> Result<&mut ProductRecord> {
        let record = self
            .products
            .get_mut(id)
            .ok_or_else(|| KernelError::product_not_found(id))?;
        if *stamp <= record.inserted {
            return Err(KernelError::PredatesProduct {
                id: id.clone(),
                time: stamp.clone(),
            });
        }
        Ok(record)
    }

    fn write_peer(&mut self, addr: &PeerAddr, present: bool, stamp: &LogicalTime) {
        match self.peers.get_mut(addr) {
            Some(entry) => entry.write(present, stamp),
            None => {
                self.peers.insert(addr.clone(), Stamped::new(present, stamp));
            }
        }
    }

    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.products.get(id).map(|record| record.to_product(id))
    }

    pub fn contains_product(&self, id: &ProductId) -> bool {
        self.products.contains_key(id)
    }

    /// Products ordered by id.
    pub fn products(&self) -> Vec<Product> {
        self.products
            .iter()
            .map(|(id, record)| record.to_product(id))
            .collect()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Highest sequence number minted by `origin`, if any.
    pub fn max_seq_for(&self, origin: &NodeId) -> Option<u64> {
        self.products
            .keys()
            .filter(|id| &id.origin == origin)
            .map(|id| id.seq)
            .max()
    }

    /// Present peers, ordered by address.
    pub fn peers(&self) -> Vec<PeerAddr> {
        self.peers
            .iter()
            .filter(|(_, entry)| entry.value)
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    pub fn has_peer(&self, addr: &PeerAddr) -> bool {
        self.peers.get(addr).map(|entry| entry.value).unwrap_or(false)
    }

    /// Resolves what a client sent into a concrete product id.
    pub fn resolve(&self, reference: &ProductRef) -> Result<ProductId> {
        match reference {
            ProductRef::Qualified(id) => {
                if self.products.contains_key(id) {
                    Ok(id.clone())
                } else {
                    Err(KernelError::product_not_found(id))
                }
            }
            ProductRef::Seq(seq) => {
                let mut matches = self.products.keys().filter(|id| id.seq == *seq);
                match (matches.next(), matches.next()) {
                    (None, _) => Err(KernelError::product_not_found(seq)),
                    (Some(id), None) => Ok(id.clone()),
                    (Some(first), Some(second)) => {
                        let mut candidates = vec![first.to_string(), second.to_string()];
                        candidates.extend(matches.map(ToString::to_string));
                        Err(KernelError::AmbiguousProduct {
                            seq: *seq,
                            candidates,
                        })
                    }
                }
            }
        }
    }

    /// Checks a purchase and returns the quantity that would remain.
    pub fn quote_purchase(&self, id: &ProductId, requested: u64) -> Result<u64> {
        let record = self
            .products
            .get(id)
            .ok_or_else(|| KernelError::product_not_found(id))?;
        let available = record.quantity.value;
        available
            .checked_sub(requested)
            .ok_or_else(|| KernelError::InsufficientStock {
                id: id.clone(),
                requested,
                available,
            })
    }
}
