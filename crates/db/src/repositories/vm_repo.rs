//! Repository for the `vms` table (read side of the inventory sync).

use botmox_core::types::EntityId;
use sqlx::PgPool;

use crate::models::vm::Vm;

/// Column list for `vms` queries.
const COLUMNS: &str = "uuid, tenant_id, node, vmid, name, agent_id, synced_at";

/// Read access to VM ownership records.
pub struct VmRepo;

impl VmRepo {
    /// Resolve a VM by its Proxmox UUID, scoped to a tenant.
    pub async fn resolve(
        pool: &PgPool,
        tenant_id: EntityId,
        vm_uuid: EntityId,
    ) -> Result<Option<Vm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vms WHERE uuid = $1 AND tenant_id = $2");
        sqlx::query_as::<_, Vm>(&query)
            .bind(vm_uuid)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }
}
