// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Replay - Authoritative Recovery
//!
//! **Event Log ALWAYS wins. Derived tables are just a cache.**
//!
//! # Recovery Protocol
//! 1. Replay every logged event, in time order, into a fresh state
//! 2. Advance a fresh clock past every logged time
//! 3. Hand back a committer equivalent to the one the log came from
//!
//! # Invariants
//! - replay(log) = live state, for every reachable node state
//! - A log that fails to replay is rejected, never partially loaded

use bazaar_kernel::error::KernelError;
use bazaar_kernel::replay::replay_events;
use bazaar_kernel::verify::{state_hash, state_hash_hex};
use bazaar_kernel::{LamportClock, NodeId};
use crate::events::event_commit::EventCommitter;
use crate::events::event_log::EventLog;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Event application failed: {0}")]
    EventApplication(KernelError),
}

pub type Result<T> = std::result::Result<T, ReplayError>;

/// Rebuild a committer from a log.
pub fn recover_from_log(node: NodeId, log: &EventLog) -> Result<EventCommitter> {
    tracing::info!("Starting recovery from {} logged events", log.len());

    let state = replay_events(log.iter()).map_err(|e| {
        tracing::error!("Event replay failed: {}", e);
        ReplayError::EventApplication(e)
    })?;

    let mut clock = LamportClock::new(node);
    for event in log.iter() {
        clock
            .advance_to(&event.time)
            .map_err(ReplayError::EventApplication)?;
    }

    match state_hash_hex(&state) {
        Ok(hash) => tracing::info!("Replay complete. State hash: {}", &hash[..16]),
        Err(e) => tracing::warn!("Replay complete, state not hashable: {}", e),
    }

    Ok(EventCommitter::from_parts(clock, log.clone(), state))
}

/// Verify the live state against a fresh replay of the log.
///
/// # Returns
/// - `true` if replay reproduces the live tables exactly
/// - `false` on any divergence, including a log that no longer replays
pub fn verify_replay(committer: &EventCommitter) -> bool {
    let replayed = match replay_events(committer.event_log().iter()) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Replay verification could not replay log: {}", e);
            return false;
        }
    };

    let matches = &replayed == committer.live_state();

    if !matches {
        tracing::warn!(
            "Replay mismatch detected!\n\
             Live:     {:?}\n\
             Replayed: {:?}",
            state_hash(committer.live_state()).ok(),
            state_hash(&replayed).ok()
        );
    }

    matches
}
