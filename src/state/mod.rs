// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod market;

pub use market::MarketState;
