// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use crate::clock::LogicalTime;
use crate::types::id::{PeerAddr, ProductId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The referenced product is unknown on this node.
    #[error("product {0} not found")]
    ProductNotFound(String),

    /// The referenced peer is not in the registry.
    #[error("peer {0} not found")]
    PeerNotFound(PeerAddr),

    /// A purchase asked for more than is in stock.
    #[error("insufficient stock for {id}: requested {requested}, available {available}")]
    InsufficientStock {
        id: ProductId,
        requested: u64,
        available: u64,
    },

    /// A bare sequence number matched products from several origins.
    #[error("product id {seq} is ambiguous; qualify it as one of {candidates:?}")]
    AmbiguousProduct { seq: u64, candidates: Vec<String> },

    /// A product event stamped no later than the product's insertion.
    #[error("event at {time} predates product {id}")]
    PredatesProduct { id: ProductId, time: LogicalTime },

    /// The clock cannot issue another time.
    #[error("logical clock of {0} exhausted")]
    ClockExhausted(String),

    /// The canonical state encoding failed.
    #[error("state encoding failed: {0}")]
    Encoding(String),

    /// Malformed identifier or field value.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl KernelError {
    pub fn product_not_found(id: impl ToString) -> Self {
        KernelError::ProductNotFound(id.to_string())
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
