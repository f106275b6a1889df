// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Commit - The Safety Wall
//!
//! This module enforces the commit barrier semantics:
//! 1. Time assigned (minted locally, or observed and folded into the clock)
//! 2. Duplicate check against the log
//! 3. Event applied to the live state (validation before any write)
//! 4. Event appended to the log
//!
//! If step 3 fails the log and the state are unchanged.
//!
//! # Invariants
//! - One log entry per successful mutation, none for a failed one
//! - Live state = replay of the log in time order
//! - Callers hold the store-wide write lock for the whole call, so the clock
//!   is only ever touched under that lock

use bazaar_kernel::error::KernelError;
use bazaar_kernel::{Event, EventBody, LamportClock, LogicalTime, MarketState, NodeId};
use crate::events::event_log::{EventLog, EventLogError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    #[error("Event rejected by state: {0}")]
    Rejected(KernelError),
}

pub type Result<T> = std::result::Result<T, CommitError>;

/// Where an event's time comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stamp {
    /// Local origin: mint a fresh time.
    Mint,
    /// Replicated or bootstrap origin: keep the given time.
    Observed(LogicalTime),
}

/// Result of a commit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    /// Event applied and appended.
    Committed(Event),

    /// Time already in the log; nothing changed.
    Duplicate,
}

/// Event committer - owns the clock, the log and the derived state
///
/// # Protocol
/// ```text
/// Body + Stamp
/// ↓
/// 1. Mint / observe time
/// ↓
/// 2. Duplicate check
/// ↓
/// 3. Apply to live state
/// ↓
/// 4. Append to log
/// ```
#[derive(Debug, Clone)]
pub struct EventCommitter {
    clock: LamportClock,
    event_log: EventLog,
    live_state: MarketState,
}

impl EventCommitter {
    pub fn new(node: NodeId) -> Self {
        Self {
            clock: LamportClock::new(node),
            event_log: EventLog::new(),
            live_state: MarketState::new(),
        }
    }

    pub(crate) fn from_parts(
        clock: LamportClock,
        event_log: EventLog,
        live_state: MarketState,
    ) -> Self {
        Self {
            clock,
            event_log,
            live_state,
        }
    }

    /// Apply an event (the ONLY way to mutate state)
    ///
    /// Returns:
    /// - `Ok(CommitResult::Committed(event))` on success
    /// - `Ok(CommitResult::Duplicate)` if the observed time is already logged
    /// - `Err(CommitError::Rejected(_))` if the state refused the event
    pub fn apply_event(&mut self, stamp: Stamp, body: EventBody) -> Result<CommitResult> {
        let time = match stamp {
            Stamp::Mint => self.clock.next().map_err(CommitError::Rejected)?,
            Stamp::Observed(time) => {
                if self.event_log.contains(&time) {
                    return Ok(CommitResult::Duplicate);
                }
                self.clock
                    .advance_to(&time)
                    .map_err(CommitError::Rejected)?;
                time
            }
        };

        if self.event_log.contains(&time) {
            return Err(CommitError::EventLog(EventLogError::DuplicateTime(time)));
        }

        let event = Event::new(time, body);

        if let Err(e) = self.live_state.apply_event(&event) {
            tracing::warn!(
                "Event {} ({}) rejected: {}",
                event.time,
                event.event_type(),
                e
            );
            return Err(CommitError::Rejected(e));
        }

        self.event_log.append(event.clone())?;

        metrics::counter!(
            "bazaar_events_committed_total",
            1,
            "kind" => event.kind().to_string(),
            "action" => event.action().to_string()
        );
        tracing::debug!("Committed {} at {}", event.event_type(), event.time);

        Ok(CommitResult::Committed(event))
    }

    pub fn live_state(&self) -> &MarketState {
        &self.live_state
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn clock(&self) -> &LamportClock {
        &self.clock
    }

    pub fn node(&self) -> &NodeId {
        self.clock.node()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_kernel::{PeerAddr, Product, ProductId};

    fn node(name: &str) -> NodeId {
        NodeId::new(name).unwrap()
    }

    fn widget(origin: &NodeId) -> EventBody {
        EventBody::ProductInserted {
            product: Product {
                id: ProductId::new(1, origin.clone()),
                seller: "s".into(),
                name: "Widget".into(),
                quantity: 10,
            },
        }
    }

    #[test]
    fn test_commit_appends_exactly_one_event() {
        let mut committer = EventCommitter::new(node("a"));
        let result = committer.apply_event(Stamp::Mint, widget(&node("a"))).unwrap();

        match result {
            CommitResult::Committed(event) => {
                assert_eq!(event.time, LogicalTime::lamport(1, node("a")));
            }
            CommitResult::Duplicate => panic!("fresh mint cannot be a duplicate"),
        }
        assert_eq!(committer.event_log().len(), 1);
        assert_eq!(committer.live_state().product_count(), 1);
    }

    #[test]
    fn test_rejected_event_leaves_no_trace() {
        let mut committer = EventCommitter::new(node("a"));
        let ghost = EventBody::ProductUpdated {
            id: ProductId::new(7, node("a")),
            name: Some("x".into()),
            quantity: None,
        };

        let result = committer.apply_event(Stamp::Mint, ghost);
        assert!(matches!(result, Err(CommitError::Rejected(KernelError::ProductNotFound(_)))));
        assert!(committer.event_log().is_empty());
        assert_eq!(committer.live_state(), &MarketState::new());
    }

    #[test]
    fn test_observed_time_advances_clock_and_is_kept() {
        let mut committer = EventCommitter::new(node("b"));
        let remote_time = LogicalTime::lamport(40, node("a"));

        committer
            .apply_event(Stamp::Observed(remote_time.clone()), widget(&node("a")))
            .unwrap();
        assert!(committer.event_log().contains(&remote_time));

        let addr: PeerAddr = "127.0.0.1:9000".parse().unwrap();
        match committer
            .apply_event(Stamp::Mint, EventBody::PeerInserted { addr })
            .unwrap()
        {
            CommitResult::Committed(event) => assert!(event.time > remote_time),
            CommitResult::Duplicate => panic!("unexpected duplicate"),
        }
    }

    #[test]
    fn test_observed_duplicate_is_noop() {
        let mut committer = EventCommitter::new(node("b"));
        let remote_time = LogicalTime::lamport(3, node("a"));
        committer
            .apply_event(Stamp::Observed(remote_time.clone()), widget(&node("a")))
            .unwrap();

        let again = committer
            .apply_event(Stamp::Observed(remote_time), widget(&node("a")))
            .unwrap();
        assert_eq!(again, CommitResult::Duplicate);
        assert_eq!(committer.event_log().len(), 1);
    }

    #[test]
    fn test_observed_time_without_successor_is_rejected() {
        let mut committer = EventCommitter::new(node("v"));
        let addr: PeerAddr = "127.0.0.1:9000".parse().unwrap();
        let poisoned = LogicalTime::lamport(u64::MAX, node("evil"));

        let result = committer.apply_event(
            Stamp::Observed(poisoned.clone()),
            EventBody::PeerInserted { addr },
        );
        assert!(matches!(
            result,
            Err(CommitError::Rejected(KernelError::InvalidInput(_)))
        ));
        assert!(!committer.event_log().contains(&poisoned));
        assert_eq!(committer.clock().current(), 0);

        // Local mints keep working.
        committer.apply_event(Stamp::Mint, widget(&node("v"))).unwrap();
        let second = committer
            .apply_event(
                Stamp::Mint,
                EventBody::ProductUpdated {
                    id: ProductId::new(1, node("v")),
                    name: None,
                    quantity: Some(3),
                },
            )
            .unwrap();
        assert!(matches!(second, CommitResult::Committed(_)));
        assert_eq!(committer.event_log().len(), 2);
    }
}
