//! Handler for VM ownership resolution.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use botmox_core::error::CoreError;
use botmox_core::types::EntityId;
use botmox_db::models::vm::Vm;
use botmox_db::repositories::VmRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireOperator;
use crate::response::Envelope;
use crate::state::AppState;

/// GET /api/v1/vm/{uuid}/resolve
///
/// Map a Proxmox VM UUID to its owning tenant record. The `vms` table is
/// maintained by an external inventory sync; when the matched row has not
/// been refreshed within the staleness window the answer cannot be
/// trusted and the endpoint reports the upstream as unavailable.
pub async fn resolve(
    RequireOperator(identity): RequireOperator,
    State(state): State<AppState>,
    Path(vm_uuid): Path<EntityId>,
) -> AppResult<Json<Envelope<Vm>>> {
    let vm = VmRepo::resolve(&state.pool, identity.tenant_id, vm_uuid)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VM",
            id: vm_uuid.to_string(),
        }))?;

    let stale_after = chrono::Duration::seconds(state.config.policy.vm_inventory_stale_secs);
    if Utc::now() - vm.synced_at > stale_after {
        return Err(AppError::Core(CoreError::UpstreamUnavailable(
            "VM inventory has not synced recently; ownership data is stale".into(),
        )));
    }

    Ok(Json(Envelope::new(vm)))
}
