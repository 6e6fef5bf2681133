//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the requests that create or filter it

pub mod agent;
pub mod client_log;
pub mod command;
pub mod pairing;
pub mod status;
pub mod vm;
