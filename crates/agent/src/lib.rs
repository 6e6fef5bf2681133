//! `botmox-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod client;
pub mod executor;
pub mod identity;
pub mod metrics;
pub mod runner;
