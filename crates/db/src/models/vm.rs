//! VM ownership record, maintained by the external Proxmox inventory sync.

use botmox_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `vms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vm {
    pub uuid: EntityId,
    pub tenant_id: EntityId,
    /// Proxmox node hosting the VM.
    pub node: String,
    /// Proxmox-local numeric VM id.
    pub vmid: i64,
    pub name: String,
    /// Agent responsible for this VM, when one is paired.
    pub agent_id: Option<EntityId>,
    pub synced_at: Timestamp,
}
