//! Deterministic Hashing and Verification.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::{KernelError, Result};
use crate::state::market::MarketState;
use crate::types::id::PeerAddr;
use crate::types::product::Product;
use serde::Serialize;

/// Bumped whenever the canonical encoding below changes.
pub const STATE_HASH_VERSION: u32 = 1;

#[derive(Serialize)]
struct CanonicalState<'a> {
    version: u32,
    products: &'a [Product],
    peers: &'a [PeerAddr],
}

/// Computes the BLAKE3 hash of the visible marketplace state.
///
/// **Scope**: products (id, seller, name, quantity) and present peers, both
/// in id order. Write stamps and peer tombstones are excluded, so two
/// replicas that show the same tables report the same hash regardless of
/// how they got there.
pub fn state_hash(state: &MarketState) -> Result<[u8; 32]> {
    let products = state.products();
    let peers = state.peers();
    let canonical = CanonicalState {
        version: STATE_HASH_VERSION,
        products: &products,
        peers: &peers,
    };

    let bytes = bincode::serde::encode_to_vec(&canonical, bincode::config::standard())
        .map_err(|e| KernelError::Encoding(e.to_string()))?;
    Ok(*blake3::hash(&bytes).as_bytes())
}

/// Lowercase hex form of [`state_hash`].
pub fn state_hash_hex(state: &MarketState) -> Result<String> {
    Ok(state_hash(state)?
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}
