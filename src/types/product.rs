//! Catalog entries.

use crate::types::id::ProductId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Opaque identity of whoever listed the product.
    pub seller: String,
    pub name: String,
    pub quantity: u64,
}
