// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use bazaar_kernel::error::KernelError;
use bazaar_kernel::verify::state_hash_hex;
use bazaar_kernel::{
    Event, EventBody, LogicalTime, NodeId, PeerAddr, Product, ProductId, ProductRef,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::NodeConfig;
use crate::errors::NodeError;
use crate::events::{CommitResult, EventCommitter, Stamp};

/// Store shared by every request handler and the replicator. Mutations take
/// the write lock for the whole commit; reads take the read lock and copy out.
pub type SharedEngine = Arc<RwLock<Engine>>;

/// Outcome of merging a peer's log into ours.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub already_known: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateProof {
    pub node: NodeId,
    pub state_hash: String,
    pub event_count: usize,
    pub clock: u64,
}

/// The marketplace store: every operation is one event through the committer.
pub struct Engine {
    committer: EventCommitter,
}

impl Engine {
    pub fn new(cfg: &NodeConfig) -> Self {
        Self::with_node_id(cfg.node_id.clone())
    }

    pub fn with_node_id(node: NodeId) -> Self {
        Self {
            committer: EventCommitter::new(node),
        }
    }

    pub fn from_committer(committer: EventCommitter) -> Self {
        Self { committer }
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(RwLock::new(self))
    }

    pub fn node(&self) -> &NodeId {
        self.committer.node()
    }

    pub fn committer(&self) -> &EventCommitter {
        &self.committer
    }

    fn commit(&mut self, stamp: Stamp, body: EventBody) -> Result<CommitResult, NodeError> {
        Ok(self.committer.apply_event(stamp, body)?)
    }

    fn fetch(&self, id: &ProductId) -> Result<Product, NodeError> {
        self.committer
            .live_state()
            .product(id)
            .ok_or_else(|| KernelError::product_not_found(id).into())
    }

    pub fn insert_product(
        &mut self,
        seller: String,
        name: String,
        quantity: u64,
    ) -> Result<Product, NodeError> {
        if name.trim().is_empty() {
            return Err(NodeError::InvalidInput("product name must not be empty".into()));
        }

        let seq = self
            .committer
            .live_state()
            .max_seq_for(self.node())
            .unwrap_or(0)
            + 1;
        let product = Product {
            id: ProductId::new(seq, self.node().clone()),
            seller,
            name,
            quantity,
        };

        self.commit(
            Stamp::Mint,
            EventBody::ProductInserted {
                product: product.clone(),
            },
        )?;
        tracing::info!("Product {} listed with quantity {}", product.id, product.quantity);
        Ok(product)
    }

    pub fn update_product(
        &mut self,
        reference: &ProductRef,
        name: Option<String>,
        quantity: Option<u64>,
    ) -> Result<Product, NodeError> {
        let id = self.committer.live_state().resolve(reference)?;

        if name.is_none() && quantity.is_none() {
            return Err(NodeError::InvalidInput("nothing to update".into()));
        }
        if matches!(&name, Some(n) if n.trim().is_empty()) {
            return Err(NodeError::InvalidInput("product name must not be empty".into()));
        }

        self.commit(
            Stamp::Mint,
            EventBody::ProductUpdated {
                id: id.clone(),
                name,
                quantity,
            },
        )?;
        self.fetch(&id)
    }

    /// Check and decrement happen under the caller's write lock, so two
    /// purchases can never both pass the stock check.
    pub fn purchase(&mut self, reference: &ProductRef, quantity: u64) -> Result<Product, NodeError> {
        if quantity == 0 {
            return Err(NodeError::InvalidInput("purchase quantity must be positive".into()));
        }

        let state = self.committer.live_state();
        let id = state.resolve(reference)?;
        let remaining = state.quote_purchase(&id, quantity)?;

        self.commit(
            Stamp::Mint,
            EventBody::ProductPurchased {
                id: id.clone(),
                quantity,
                remaining,
            },
        )?;
        tracing::info!("Sold {} of {}, {} left", quantity, id, remaining);
        self.fetch(&id)
    }

    /// Returns `false` when the peer was already registered.
    pub fn insert_peer(&mut self, addr: PeerAddr) -> Result<bool, NodeError> {
        if self.committer.live_state().has_peer(&addr) {
            return Ok(false);
        }
        self.commit(Stamp::Mint, EventBody::PeerInserted { addr: addr.clone() })?;
        tracing::info!("Peer {} registered", addr);
        Ok(true)
    }

    pub fn delete_peer(&mut self, addr: &PeerAddr) -> Result<(), NodeError> {
        if !self.committer.live_state().has_peer(addr) {
            return Err(KernelError::PeerNotFound(addr.clone()).into());
        }
        self.commit(Stamp::Mint, EventBody::PeerDeleted { addr: addr.clone() })?;
        tracing::info!("Peer {} removed", addr);
        Ok(())
    }

    /// Records the seed peer under its out-of-band bootstrap time.
    /// Returns `false` if that entry is already in the log.
    pub fn record_bootstrap(&mut self, seed: PeerAddr) -> Result<bool, NodeError> {
        let result = self.commit(
            Stamp::Observed(LogicalTime::bootstrap(seed.clone())),
            EventBody::PeerInserted { addr: seed },
        )?;
        Ok(matches!(result, CommitResult::Committed(_)))
    }

    pub fn products(&self) -> Vec<Product> {
        self.committer.live_state().products()
    }

    pub fn peers(&self) -> Vec<PeerAddr> {
        self.committer.live_state().peers()
    }

    pub fn events(&self) -> BTreeMap<LogicalTime, Event> {
        self.committer.event_log().snapshot()
    }

    pub fn event_count(&self) -> usize {
        self.committer.event_log().len()
    }

    /// Applies every event of `remote` we do not have, in ascending time order.
    ///
    /// Events that fail to apply are skipped and left out of the log, so the
    /// next round retries them.
    pub fn merge_remote(&mut self, mut remote: BTreeMap<LogicalTime, Event>) -> MergeReport {
        let missing = self.committer.event_log().missing_from(&remote);
        let mut report = MergeReport {
            already_known: remote.len() - missing.len(),
            ..MergeReport::default()
        };

        for time in missing {
            let Some(event) = remote.remove(&time) else {
                continue;
            };
            if event.time != time {
                tracing::warn!("Dropping event keyed {} but stamped {}", time, event.time);
                report.rejected += 1;
                continue;
            }

            match self.committer.apply_event(Stamp::Observed(time), event.body) {
                Ok(CommitResult::Committed(_)) => report.applied += 1,
                Ok(CommitResult::Duplicate) => report.already_known += 1,
                Err(e) => {
                    tracing::warn!("Replicated event {} not applied: {}", event.time, e);
                    report.rejected += 1;
                }
            }
        }

        report
    }

    pub fn state_proof(&self) -> Result<StateProof, NodeError> {
        Ok(StateProof {
            node: self.node().clone(),
            state_hash: state_hash_hex(self.committer.live_state())?,
            event_count: self.event_count(),
            clock: self.committer.clock().current(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::verify_replay;

    fn engine(name: &str) -> Engine {
        Engine::with_node_id(NodeId::new(name).unwrap())
    }

    #[test]
    fn test_insert_and_purchase() {
        let mut e = engine("a");
        let product = e.insert_product("s".into(), "Widget".into(), 10).unwrap();
        assert_eq!(product.id.seq, 1);

        let after = e.purchase(&ProductRef::Seq(1), 4).unwrap();
        assert_eq!(after.quantity, 6);
        assert_eq!(e.event_count(), 2);
    }

    #[test]
    fn test_failed_operations_record_nothing() {
        let mut e = engine("a");
        e.insert_product("s".into(), "Widget".into(), 5).unwrap();
        let before = e.event_count();

        assert!(matches!(
            e.purchase(&ProductRef::Seq(999), 1),
            Err(NodeError::Kernel(KernelError::ProductNotFound(_)))
        ));
        assert!(matches!(
            e.purchase(&ProductRef::Seq(1), 6),
            Err(NodeError::Kernel(KernelError::InsufficientStock { .. }))
        ));
        assert!(matches!(
            e.purchase(&ProductRef::Seq(1), 0),
            Err(NodeError::InvalidInput(_))
        ));
        assert!(e.update_product(&ProductRef::Seq(1), None, None).is_err());
        assert!(e
            .update_product(&ProductRef::Seq(2), Some("x".into()), None)
            .is_err());
        assert!(e.insert_product("s".into(), "  ".into(), 1).is_err());
        let stranger: PeerAddr = "127.0.0.1:1".parse().unwrap();
        assert!(e.delete_peer(&stranger).is_err());

        assert_eq!(e.event_count(), before);
        assert_eq!(e.products()[0].quantity, 5);
    }

    #[test]
    fn test_update_product_fields() {
        let mut e = engine("a");
        e.insert_product("s".into(), "Widget".into(), 5).unwrap();
        let updated = e
            .update_product(&ProductRef::Seq(1), Some("Gadget".into()), None)
            .unwrap();
        assert_eq!(updated.name, "Gadget");
        assert_eq!(updated.quantity, 5);

        let updated = e.update_product(&ProductRef::Seq(1), None, Some(12)).unwrap();
        assert_eq!(updated.quantity, 12);
    }

    #[test]
    fn test_peer_registry_through_events() {
        let mut e = engine("a");
        let addr: PeerAddr = "127.0.0.1:9000".parse().unwrap();

        assert!(e.insert_peer(addr.clone()).unwrap());
        assert!(!e.insert_peer(addr.clone()).unwrap());
        assert_eq!(e.peers(), vec![addr.clone()]);
        assert_eq!(e.event_count(), 1);

        e.delete_peer(&addr).unwrap();
        assert!(e.peers().is_empty());
        assert_eq!(e.event_count(), 2);
    }

    #[test]
    fn test_merge_remote_converges_and_is_idempotent() {
        let mut a = engine("a");
        let mut b = engine("b");
        a.insert_product("s".into(), "Widget".into(), 10).unwrap();
        a.purchase(&ProductRef::Seq(1), 4).unwrap();
        b.insert_product("t".into(), "Gizmo".into(), 2).unwrap();

        let report = b.merge_remote(a.events());
        assert_eq!(report.applied, 2);
        assert_eq!(report.rejected, 0);

        let report = a.merge_remote(b.events());
        assert_eq!(report.applied, 1);
        assert_eq!(report.already_known, 2);

        assert_eq!(a.products(), b.products());
        assert_eq!(a.state_proof().unwrap().state_hash, b.state_proof().unwrap().state_hash);

        let again = b.merge_remote(a.events());
        assert_eq!(again.applied, 0);
        assert_eq!(again.already_known, 3);

        assert!(verify_replay(a.committer()));
        assert!(verify_replay(b.committer()));
    }

    #[test]
    fn test_merge_rejects_mismatched_keys() {
        let mut a = engine("a");
        a.insert_product("s".into(), "Widget".into(), 10).unwrap();

        let mut forged = BTreeMap::new();
        let event = a.events().into_values().next().unwrap();
        let wrong_key = LogicalTime::lamport(99, NodeId::new("z").unwrap());
        forged.insert(wrong_key, event);

        let mut b = engine("b");
        let report = b.merge_remote(forged);
        assert_eq!(report.rejected, 1);
        assert_eq!(b.event_count(), 0);
    }

    #[test]
    fn test_new_ids_continue_after_own_products_replicate_back() {
        let mut a = engine("a");
        a.insert_product("s".into(), "Widget".into(), 1).unwrap();
        a.insert_product("s".into(), "Gizmo".into(), 1).unwrap();

        // A fresh engine with the same id learns its earlier products from a peer.
        let mut restarted = engine("a");
        restarted.merge_remote(a.events());
        let next = restarted
            .insert_product("s".into(), "Thing".into(), 1)
            .unwrap();
        assert_eq!(next.id.seq, 3);
    }

    #[test]
    fn test_bootstrap_recorded_once() {
        let mut b = engine("b");
        let seed: PeerAddr = "127.0.0.1:7000".parse().unwrap();
        assert!(b.record_bootstrap(seed.clone()).unwrap());
        assert!(!b.record_bootstrap(seed.clone()).unwrap());
        assert_eq!(b.peers(), vec![seed]);
        assert_eq!(b.state_proof().unwrap().clock, 0);
    }

    fn remote_log(event: Event) -> BTreeMap<LogicalTime, Event> {
        let mut remote = BTreeMap::new();
        remote.insert(event.time.clone(), event);
        remote
    }

    #[test]
    fn test_merge_refuses_exhausted_counter() {
        let mut e = engine("v");
        let poisoned = Event::new(
            LogicalTime::lamport(u64::MAX, NodeId::new("evil").unwrap()),
            EventBody::PeerInserted {
                addr: "127.0.0.1:6666".parse().unwrap(),
            },
        );

        let report = e.merge_remote(remote_log(poisoned));
        assert_eq!(report.rejected, 1);
        assert_eq!(e.event_count(), 0);

        e.insert_product("s".into(), "Widget".into(), 1).unwrap();
        e.insert_product("s".into(), "Gizmo".into(), 1).unwrap();
        assert_eq!(e.event_count(), 2);
        assert_eq!(e.state_proof().unwrap().clock, 2);
    }

    #[test]
    fn test_merge_refuses_write_that_predates_insert() {
        let mut e = engine("a");
        let product = e.insert_product("s".into(), "Widget".into(), 10).unwrap();

        let early = Event::new(
            LogicalTime::lamport(0, NodeId::new("b").unwrap()),
            EventBody::ProductUpdated {
                id: product.id.clone(),
                name: None,
                quantity: Some(1),
            },
        );
        let report = e.merge_remote(remote_log(early));
        assert_eq!(report.applied, 0);
        assert_eq!(report.rejected, 1);
        assert_eq!(e.products()[0].quantity, 10);

        assert!(verify_replay(e.committer()));
        let recovered =
            crate::events::recover_from_log(e.node().clone(), e.committer().event_log()).unwrap();
        assert_eq!(recovered.live_state(), e.committer().live_state());
    }
}
