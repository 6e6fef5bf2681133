//! Handlers for the command queue.
//!
//! Delivery is poll-based: agents claim queued commands, acknowledge
//! start, and report a terminal outcome. Every lifecycle change is a
//! compare-and-swap in [`CommandRepo`]; when the swap misses, the record
//! is re-read to answer with a precise `INVALID_TRANSITION` (or 404).
//! Expiry is passive: overdue rows are swept at poll, read, and
//! transition time.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use botmox_core::command::{self, CommandStatus};
use botmox_core::error::CoreError;
use botmox_core::types::EntityId;
use botmox_db::models::agent::Agent;
use botmox_db::models::command::{
    AgentCommand, CommandListQuery, CommandOutcome, CommandReport, EnqueueCommand,
};
use botmox_db::models::status::AgentStatus;
use botmox_db::repositories::{AgentRepo, CommandRepo};

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::{RequireAgent, RequireAgentAdmin, RequireOperator};
use crate::response::Envelope;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch the target agent and require it to be active.
async fn find_active_agent(
    state: &AppState,
    tenant_id: EntityId,
    agent_id: EntityId,
) -> AppResult<Agent> {
    let agent = AgentRepo::find_by_id(&state.pool, tenant_id, agent_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Agent",
            id: agent_id.to_string(),
        }))?;

    if agent.status == AgentStatus::Revoked {
        return Err(AppError::Core(CoreError::Conflict(
            "Agent has been revoked and cannot receive commands".into(),
        )));
    }
    Ok(agent)
}

/// Build the error for a transition whose compare-and-swap found no row:
/// the command is gone, belongs to another agent, or sits in a state the
/// requested edge does not leave from.
async fn stale_transition_error(
    state: &AppState,
    tenant_id: EntityId,
    command_id: EntityId,
    required_agent: Option<EntityId>,
    to: CommandStatus,
) -> AppResult<AppError> {
    let Some(current) = CommandRepo::find_by_id(&state.pool, tenant_id, command_id).await? else {
        return Ok(AppError::Core(CoreError::NotFound {
            entity: "Command",
            id: command_id.to_string(),
        }));
    };

    if let Some(agent_id) = required_agent {
        if current.agent_id != agent_id {
            return Ok(AppError::Core(CoreError::Forbidden(
                "Command is addressed to a different agent".into(),
            )));
        }
    }

    Ok(AppError::Core(CoreError::InvalidTransition {
        from: current.status,
        to,
    }))
}

/// Re-check a freshly read command against the passive expiry rule. When
/// overdue, sweep its agent's queue and return the updated row.
async fn settle_expiry(state: &AppState, cmd: AgentCommand) -> AppResult<AgentCommand> {
    let overdue = matches!(
        cmd.status,
        CommandStatus::Queued | CommandStatus::Dispatched
    ) && cmd.expires_at <= Utc::now();

    if !overdue {
        return Ok(cmd);
    }

    CommandRepo::expire_overdue(&state.pool, Some(cmd.agent_id)).await?;
    let settled = CommandRepo::find_by_id(&state.pool, cmd.tenant_id, cmd.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Command",
            id: cmd.id.to_string(),
        }))?;
    Ok(settled)
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/{id}/commands
///
/// Queue a command for an agent. Returns 201 with the queued record.
/// The command type must be registered and the payload a JSON object.
pub async fn enqueue_command(
    RequireAgentAdmin(identity): RequireAgentAdmin,
    State(state): State<AppState>,
    Path(agent_id): Path<EntityId>,
    ValidatedJson(mut input): ValidatedJson<EnqueueCommand>,
) -> AppResult<impl IntoResponse> {
    command::validate_command_type(&input.command_type).map_err(AppError::Core)?;

    if input.payload.is_null() {
        input.payload = json!({});
    } else if !input.payload.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "payload must be a JSON object".into(),
        )));
    }

    find_active_agent(&state, identity.tenant_id, agent_id).await?;

    let cmd = CommandRepo::enqueue(
        &state.pool,
        identity.tenant_id,
        agent_id,
        &input,
        &identity.uid,
        state.config.policy.command_ttl_secs,
    )
    .await?;

    tracing::info!(
        command_id = %cmd.id,
        agent_id = %agent_id,
        command_type = %cmd.command_type,
        created_by = %identity.uid,
        "Command enqueued",
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(cmd))))
}

// ---------------------------------------------------------------------------
// List / get
// ---------------------------------------------------------------------------

/// GET /api/v1/agents/{id}/commands
///
/// List an agent's commands, newest first. Overdue rows are swept to
/// `expired` before listing so readers never see a stale queued command.
pub async fn list_agent_commands(
    RequireOperator(identity): RequireOperator,
    State(state): State<AppState>,
    Path(agent_id): Path<EntityId>,
    Query(params): Query<CommandListQuery>,
) -> AppResult<Json<Envelope<Vec<AgentCommand>>>> {
    AgentRepo::find_by_id(&state.pool, identity.tenant_id, agent_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Agent",
            id: agent_id.to_string(),
        }))?;

    CommandRepo::expire_overdue(&state.pool, Some(agent_id)).await?;

    let commands =
        CommandRepo::list_for_agent(&state.pool, identity.tenant_id, agent_id, &params).await?;

    let count = commands.len();
    Ok(Json(Envelope::with_meta(commands, json!({ "count": count }))))
}

/// GET /api/v1/agents/commands/{id}
pub async fn get_command(
    RequireOperator(identity): RequireOperator,
    State(state): State<AppState>,
    Path(command_id): Path<EntityId>,
) -> AppResult<Json<Envelope<AgentCommand>>> {
    let cmd = CommandRepo::find_by_id(&state.pool, identity.tenant_id, command_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Command",
            id: command_id.to_string(),
        }))?;

    let cmd = settle_expiry(&state, cmd).await?;
    Ok(Json(Envelope::new(cmd)))
}

// ---------------------------------------------------------------------------
// Poll (queued -> dispatched)
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/commands/poll
///
/// Claim up to the policy limit of queued commands for the calling agent,
/// oldest first. Claiming moves each command to `dispatched`.
pub async fn poll_commands(
    agent: RequireAgent,
    State(state): State<AppState>,
) -> AppResult<Json<Envelope<Vec<AgentCommand>>>> {
    // Reject revoked (or deleted) agents before handing out work. Other
    // failures, database errors in particular, keep their own status so a
    // transient 500 is never mistaken for a revocation.
    match find_active_agent(&state, agent.identity.tenant_id, agent.agent_id).await {
        Ok(_) => {}
        Err(AppError::Core(CoreError::NotFound { .. } | CoreError::Conflict(_))) => {
            return Err(AppError::Core(CoreError::Forbidden(
                "Agent has been revoked".into(),
            )));
        }
        Err(e) => return Err(e),
    }

    let swept = CommandRepo::expire_overdue(&state.pool, Some(agent.agent_id)).await?;
    if swept > 0 {
        tracing::debug!(agent_id = %agent.agent_id, swept, "Expired overdue commands");
    }

    let commands = CommandRepo::claim_queued(
        &state.pool,
        agent.agent_id,
        state.config.policy.command_poll_limit,
    )
    .await?;

    let count = commands.len();
    Ok(Json(Envelope::with_meta(commands, json!({ "count": count }))))
}

// ---------------------------------------------------------------------------
// Ack (dispatched -> running)
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/commands/{id}/ack
///
/// The agent acknowledges it started executing. Sets `started_at` once.
pub async fn ack_command(
    agent: RequireAgent,
    State(state): State<AppState>,
    Path(command_id): Path<EntityId>,
) -> AppResult<Json<Envelope<AgentCommand>>> {
    // A dispatched command whose TTL elapsed settles to expired; the ack
    // then reports a 409 from that state instead of starting it.
    CommandRepo::expire_overdue(&state.pool, Some(agent.agent_id)).await?;

    match CommandRepo::mark_running(&state.pool, agent.agent_id, command_id).await? {
        Some(cmd) => Ok(Json(Envelope::new(cmd))),
        None => Err(stale_transition_error(
            &state,
            agent.identity.tenant_id,
            command_id,
            Some(agent.agent_id),
            CommandStatus::Running,
        )
        .await?),
    }
}

// ---------------------------------------------------------------------------
// Report (running -> succeeded | failed)
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/commands/{id}/result
///
/// Terminal report from the agent. Re-applying a terminal outcome is
/// rejected with 409, never double-applied.
pub async fn report_command(
    agent: RequireAgent,
    State(state): State<AppState>,
    Path(command_id): Path<EntityId>,
    ValidatedJson(report): ValidatedJson<CommandReport>,
) -> AppResult<Json<Envelope<AgentCommand>>> {
    CommandRepo::expire_overdue(&state.pool, Some(agent.agent_id)).await?;

    let (updated, target) = match report.outcome {
        CommandOutcome::Succeeded => {
            let result = report.result.unwrap_or_else(|| json!({}));
            if !result.is_object() {
                return Err(AppError::Core(CoreError::Validation(
                    "result must be a JSON object".into(),
                )));
            }
            (
                CommandRepo::complete(&state.pool, agent.agent_id, command_id, &result).await?,
                CommandStatus::Succeeded,
            )
        }
        CommandOutcome::Failed => {
            let message = report.error_message.as_deref().ok_or_else(|| {
                AppError::Core(CoreError::Validation(
                    "error_message is required for a failed outcome".into(),
                ))
            })?;
            (
                CommandRepo::fail(&state.pool, agent.agent_id, command_id, message).await?,
                CommandStatus::Failed,
            )
        }
    };

    match updated {
        Some(cmd) => {
            tracing::info!(
                command_id = %cmd.id,
                agent_id = %agent.agent_id,
                status = %cmd.status,
                "Command completed",
            );
            Ok(Json(Envelope::new(cmd)))
        }
        None => Err(stale_transition_error(
            &state,
            agent.identity.tenant_id,
            command_id,
            Some(agent.agent_id),
            target,
        )
        .await?),
    }
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/commands/{id}/cancel
///
/// Operator cancellation; valid from queued, dispatched, and running.
pub async fn cancel_command(
    RequireAgentAdmin(identity): RequireAgentAdmin,
    State(state): State<AppState>,
    Path(command_id): Path<EntityId>,
) -> AppResult<Json<Envelope<AgentCommand>>> {
    match CommandRepo::cancel(&state.pool, identity.tenant_id, command_id).await? {
        Some(cmd) => {
            tracing::info!(
                command_id = %cmd.id,
                cancelled_by = %identity.uid,
                "Command cancelled",
            );
            Ok(Json(Envelope::new(cmd)))
        }
        None => Err(stale_transition_error(
            &state,
            identity.tenant_id,
            command_id,
            None,
            CommandStatus::Cancelled,
        )
        .await?),
    }
}
