// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod network;
pub mod replication;
pub mod server;
pub mod telemetry;
