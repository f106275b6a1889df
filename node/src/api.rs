// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Wire types of the HTTP surface. Field names follow the public protocol
//! (`nome`, `qtde`, `porta`, ...); Rust names follow the domain.

use bazaar_kernel::{Event, LogicalTime, PeerAddr, Product, ProductRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::StateProof;

#[derive(Deserialize, Serialize, Debug)]
pub struct AnnouncePeerRequest {
    #[serde(rename = "porta")]
    pub port: u16,
    /// Overrides the caller address seen on the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct InsertProductRequest {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "qtde")]
    pub quantity: u64,
    #[serde(default, rename = "vendedor")]
    pub seller: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateProductRequest {
    #[serde(default, rename = "nome")]
    pub name: Option<String>,
    #[serde(default, rename = "qtde")]
    pub quantity: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct PurchaseRequest {
    pub id: ProductRef,
    #[serde(rename = "qtde")]
    pub quantity: u64,
}

/// A product as listed to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProductView {
    pub id: u64,
    #[serde(rename = "origem")]
    pub origin: String,
    #[serde(rename = "vendedor")]
    pub seller: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "qtde")]
    pub quantity: u64,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.seq,
            origin: product.id.origin.to_string(),
            seller: product.seller,
            name: product.name,
            quantity: product.quantity,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    #[serde(rename = "sucesso")]
    pub success: String,
    #[serde(default, rename = "produto", skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductView>,
}

impl SuccessResponse {
    pub fn message(msg: &str) -> Self {
        Self {
            success: msg.to_string(),
            product: None,
        }
    }

    pub fn with_product(msg: &str, product: Product) -> Self {
        Self {
            success: msg.to_string(),
            product: Some(product.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PeersResponse {
    pub peers: Vec<PeerAddr>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProductsResponse {
    #[serde(rename = "produtos")]
    pub products: Vec<ProductView>,
}

/// Full log, keyed by the textual logical time. Also the replication payload.
#[derive(Serialize, Deserialize, Debug)]
pub struct EventsResponse {
    #[serde(rename = "eventos")]
    pub events: BTreeMap<LogicalTime, Event>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StateResponse {
    #[serde(rename = "no")]
    pub node: String,
    pub hash: String,
    #[serde(rename = "eventos")]
    pub event_count: usize,
    #[serde(rename = "relogio")]
    pub clock: u64,
}

impl From<StateProof> for StateResponse {
    fn from(proof: StateProof) -> Self {
        Self {
            node: proof.node.to_string(),
            hash: proof.state_hash,
            event_count: proof.event_count,
            clock: proof.clock,
        }
    }
}
