// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Event Log
//!
//! The single source of truth of a node. Derived tables can always be
//! rebuilt from it.
//! - Keyed by `LogicalTime`, iterated in ascending time order
//! - No overwrite: appending an existing key is an error
//! - No removal
//!
//! The log is held in memory only; a restart starts from an empty history
//! and catches up from peers.

use bazaar_kernel::{Event, LogicalTime};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventLogError {
    #[error("Event time {0} already present in the log")]
    DuplicateTime(LogicalTime),
}

pub type Result<T> = std::result::Result<T, EventLogError>;

#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: BTreeMap<LogicalTime, Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event under its own time.
    pub fn append(&mut self, event: Event) -> Result<()> {
        if self.entries.contains_key(&event.time) {
            return Err(EventLogError::DuplicateTime(event.time));
        }
        self.entries.insert(event.time.clone(), event);
        Ok(())
    }

    pub fn contains(&self, time: &LogicalTime) -> bool {
        self.entries.contains_key(time)
    }

    /// Get the number of events appended
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.values()
    }

    /// Owned copy of the whole log, as served to peers.
    pub fn snapshot(&self) -> BTreeMap<LogicalTime, Event> {
        self.entries.clone()
    }

    /// Times present in `remote` but not here, sorted ascending.
    pub fn missing_from(&self, remote: &BTreeMap<LogicalTime, Event>) -> Vec<LogicalTime> {
        let mut missing: Vec<LogicalTime> = remote
            .keys()
            .filter(|time| !self.entries.contains_key(*time))
            .cloned()
            .collect();
        // Replay must follow causal order; do not rely on the map's iteration order.
        missing.sort();
        missing
    }
}
