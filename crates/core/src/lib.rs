//! Bot-Mox domain core.
//!
//! Dependency-light crate shared by the API server, the database layer,
//! and the agent daemon: error taxonomy, role model, the command
//! lifecycle state machine, pairing-code handling, and agent liveness
//! derivation. No I/O lives here.

pub mod command;
pub mod error;
pub mod liveness;
pub mod pairing;
pub mod roles;
pub mod types;
