//! Deterministic Replay Logic.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use crate::error::Result;
use crate::event::Event;
use crate::state::market::MarketState;

/// Folds events into a fresh state in ascending `LogicalTime` order.
///
/// Input order does not matter; events are sorted before application. An
/// event that fails to apply (e.g. an update for a product that was never
/// inserted) aborts the replay with that error.
pub fn replay_events<'a, I>(events: I) -> Result<MarketState>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut ordered: Vec<&Event> = events.into_iter().collect();
    ordered.sort_by(|a, b| a.time.cmp(&b.time));

    let mut state = MarketState::new();
    for event in ordered {
        state.apply_event(event)?;
    }
    Ok(state)
}
