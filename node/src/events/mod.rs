// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event-Sourced State Layer
//!
//! # Architecture
//! - Event Log = Primary truth (append-only, keyed by logical time)
//! - Market state = Derived cache (replayable)
//! - Committer = The only mutation path, pairing every change with its event
//!
//! # Guarantees
//! - No mutation without an event, no event without a mutation
//! - Replay of the log reproduces the live state
//! - Replicated events keep their original time

pub mod event_log;
pub mod event_commit;
pub mod event_replay;

pub use event_log::EventLog;
pub use event_commit::{CommitError, CommitResult, EventCommitter, Stamp};
pub use event_replay::{recover_from_log, verify_replay};
