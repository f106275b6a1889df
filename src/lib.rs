// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! bazaar-kernel: the deterministic core of a replicated marketplace node.
//! Logical time, the event language, and the state derived from replaying it.

pub mod clock;
pub mod error;
pub mod event;
pub mod replay;
pub mod state;
pub mod types;
pub mod verify;

pub use clock::{LamportClock, LogicalTime};
pub use error::{KernelError, KernelResult};
pub use event::{Event, EventAction, EventBody, EventKind};
pub use state::MarketState;
pub use types::{NodeId, PeerAddr, Product, ProductId, ProductRef};

#[cfg(test)]
pub mod tests;
