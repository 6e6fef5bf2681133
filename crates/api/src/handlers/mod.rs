//! HTTP handlers, grouped by resource.

pub mod agents;
pub mod auth;
pub mod client_logs;
pub mod commands;
pub mod pairings;
pub mod vm;
