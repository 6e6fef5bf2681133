//! Handlers for the agent registry: heartbeat, listing, revocation.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use botmox_core::error::CoreError;
use botmox_core::liveness::{self, Liveness};
use botmox_core::types::EntityId;
use botmox_db::models::agent::{Agent, AgentListQuery, HeartbeatRequest};
use botmox_db::repositories::AgentRepo;

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::{RequireAgent, RequireAgentAdmin, RequireOperator};
use crate::response::Envelope;
use crate::state::AppState;

/// Agent row plus derived liveness, as returned to operators.
#[derive(Debug, Serialize)]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    /// Computed from `last_heartbeat_at` against the liveness timeout;
    /// never persisted.
    pub liveness: Liveness,
}

impl AgentView {
    fn derive(agent: Agent, state: &AppState) -> Self {
        let liveness = liveness::derive(
            agent.last_heartbeat_at,
            Utc::now(),
            state.config.policy.liveness_timeout(),
        );
        AgentView { agent, liveness }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/heartbeat
///
/// Liveness signal from a paired agent. The credential's `agent_id` claim
/// must match the body's `agent_id` -- a mismatch is 401, the same as a
/// bad token, since the credential does not cover the claimed agent.
pub async fn heartbeat(
    agent: RequireAgent,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<HeartbeatRequest>,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    if agent.agent_id != input.agent_id {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Credential does not match the reporting agent".into(),
        )));
    }

    if !input.metrics.is_null() && !input.metrics.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "metrics must be a JSON object".into(),
        )));
    }
    let metrics = if input.metrics.is_null() {
        json!({})
    } else {
        input.metrics
    };

    let updated = AgentRepo::heartbeat(&state.pool, agent.agent_id, &metrics)
        .await?
        .ok_or_else(|| {
            // Active rows always match; the agent was revoked.
            AppError::Core(CoreError::Forbidden("Agent has been revoked".into()))
        })?;

    tracing::debug!(agent_id = %updated.id, "Heartbeat recorded");

    Ok(Json(Envelope::new(json!({
        "status": "ok",
        "heartbeat_interval_secs": state.config.policy.heartbeat_interval_secs,
        "liveness_timeout_secs": state.config.policy.liveness_timeout_secs,
    }))))
}

// ---------------------------------------------------------------------------
// List / get
// ---------------------------------------------------------------------------

/// GET /api/v1/agents
///
/// List the tenant's agents ordered by `name ASC, id ASC`, each with
/// derived liveness. Supports `status`, `limit`, and `offset` query
/// parameters.
pub async fn list_agents(
    RequireOperator(identity): RequireOperator,
    State(state): State<AppState>,
    Query(params): Query<AgentListQuery>,
) -> AppResult<Json<Envelope<Vec<AgentView>>>> {
    let agents = AgentRepo::list(&state.pool, identity.tenant_id, &params).await?;

    let views: Vec<AgentView> = agents
        .into_iter()
        .map(|a| AgentView::derive(a, &state))
        .collect();

    let count = views.len();
    Ok(Json(Envelope::with_meta(views, json!({ "count": count }))))
}

/// GET /api/v1/agents/{id}
pub async fn get_agent(
    RequireOperator(identity): RequireOperator,
    State(state): State<AppState>,
    Path(agent_id): Path<EntityId>,
) -> AppResult<Json<Envelope<AgentView>>> {
    let agent = AgentRepo::find_by_id(&state.pool, identity.tenant_id, agent_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Agent",
            id: agent_id.to_string(),
        }))?;

    Ok(Json(Envelope::new(AgentView::derive(agent, &state))))
}

// ---------------------------------------------------------------------------
// Revoke
// ---------------------------------------------------------------------------

/// DELETE /api/v1/agents/{id}
///
/// Soft-disable an agent. The row is kept (commands and pairings may
/// reference it); heartbeats and polls start failing with 403.
pub async fn revoke_agent(
    RequireAgentAdmin(identity): RequireAgentAdmin,
    State(state): State<AppState>,
    Path(agent_id): Path<EntityId>,
) -> AppResult<Json<Envelope<AgentView>>> {
    let agent = AgentRepo::revoke(&state.pool, identity.tenant_id, agent_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Agent",
            id: agent_id.to_string(),
        }))?;

    tracing::info!(agent_id = %agent.id, revoked_by = %identity.uid, "Agent revoked");

    Ok(Json(Envelope::new(AgentView::derive(agent, &state))))
}
