// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod id;
pub mod product;

pub use id::{NodeId, PeerAddr, ProductId, ProductRef};
pub use product::Product;
