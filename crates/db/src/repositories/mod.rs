//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. All tenant scoping happens in
//! the WHERE clause; no method returns rows across tenants.

pub mod agent_repo;
pub mod client_log_repo;
pub mod command_repo;
pub mod pairing_repo;
pub mod vm_repo;

pub use agent_repo::AgentRepo;
pub use client_log_repo::ClientLogRepo;
pub use command_repo::CommandRepo;
pub use pairing_repo::PairingRepo;
pub use vm_repo::VmRepo;
