//! Repository for the `agent_commands` table.
//!
//! Every transition method is a compare-and-swap: the UPDATE only matches
//! when the row's current status equals the expected source state of the
//! edge, so two racing reports can never both commit. A `None` return
//! means the observed state was stale; the caller re-reads and raises
//! `InvalidTransition`.

use botmox_core::command::CommandStatus;
use botmox_core::types::EntityId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::command::{AgentCommand, CommandListQuery, EnqueueCommand};

/// Column list for `agent_commands` queries.
const COLUMNS: &str = "\
    id, tenant_id, agent_id, command_type, payload, status, result, \
    error_message, queued_at, started_at, completed_at, expires_at, \
    created_by, created_at, updated_at";

/// Maximum page size for command listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for command listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides queue and lifecycle operations for agent commands.
pub struct CommandRepo;

impl CommandRepo {
    /// Insert a new queued command. `queued_at` is set here, once, and
    /// never touched again; `expires_at` is `queued_at` plus the TTL.
    pub async fn enqueue(
        pool: &PgPool,
        tenant_id: EntityId,
        agent_id: EntityId,
        input: &EnqueueCommand,
        created_by: &str,
        ttl_secs: i64,
    ) -> Result<AgentCommand, sqlx::Error> {
        let query = format!(
            "INSERT INTO agent_commands \
                 (id, tenant_id, agent_id, command_type, payload, status, \
                  expires_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW() + make_interval(secs => $7), $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(Uuid::now_v7())
            .bind(tenant_id)
            .bind(agent_id)
            .bind(&input.command_type)
            .bind(&input.payload)
            .bind(CommandStatus::Queued.id())
            .bind(ttl_secs as f64)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Fetch a single command scoped to a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: EntityId,
        command_id: EntityId,
    ) -> Result<Option<AgentCommand>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM agent_commands WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(command_id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List commands for one agent, newest first.
    pub async fn list_for_agent(
        pool: &PgPool,
        tenant_id: EntityId,
        agent_id: EntityId,
        params: &CommandListQuery,
    ) -> Result<Vec<AgentCommand>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM agent_commands \
             WHERE tenant_id = $1 AND agent_id = $2 \
               AND ($3::SMALLINT IS NULL OR status = $3) \
             ORDER BY queued_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(tenant_id)
            .bind(agent_id)
            .bind(params.status.map(CommandStatus::id))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Passive expiry sweep: move overdue queued/dispatched commands to
    /// `expired` and stamp `completed_at`. Returns the number of rows
    /// swept. Runs at poll, read, and transition time; there are no timers.
    pub async fn expire_overdue(
        pool: &PgPool,
        agent_id: Option<EntityId>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE agent_commands \
             SET status = $1, completed_at = NOW(), updated_at = NOW() \
             WHERE status IN ($2, $3) AND expires_at <= NOW() \
               AND ($4::UUID IS NULL OR agent_id = $4)",
        )
        .bind(CommandStatus::Expired.id())
        .bind(CommandStatus::Queued.id())
        .bind(CommandStatus::Dispatched.id())
        .bind(agent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Atomically claim up to `limit` queued commands for an agent,
    /// oldest first, moving them to `dispatched`.
    ///
    /// `FOR UPDATE SKIP LOCKED` prevents double-dispatch when the same
    /// agent polls from two connections.
    pub async fn claim_queued(
        pool: &PgPool,
        agent_id: EntityId,
        limit: i64,
    ) -> Result<Vec<AgentCommand>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_commands \
             SET status = $1, updated_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM agent_commands \
                 WHERE agent_id = $2 AND status = $3 AND expires_at > NOW() \
                 ORDER BY queued_at ASC \
                 LIMIT $4 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(CommandStatus::Dispatched.id())
            .bind(agent_id)
            .bind(CommandStatus::Queued.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// dispatched -> running; sets `started_at` exactly once.
    pub async fn mark_running(
        pool: &PgPool,
        agent_id: EntityId,
        command_id: EntityId,
    ) -> Result<Option<AgentCommand>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_commands \
             SET status = $1, started_at = NOW(), updated_at = NOW() \
             WHERE id = $2 AND agent_id = $3 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(CommandStatus::Running.id())
            .bind(command_id)
            .bind(agent_id)
            .bind(CommandStatus::Dispatched.id())
            .fetch_optional(pool)
            .await
    }

    /// running -> succeeded; stores the result and stamps `completed_at`.
    pub async fn complete(
        pool: &PgPool,
        agent_id: EntityId,
        command_id: EntityId,
        result: &serde_json::Value,
    ) -> Result<Option<AgentCommand>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_commands \
             SET status = $1, result = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $3 AND agent_id = $4 AND status = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(CommandStatus::Succeeded.id())
            .bind(result)
            .bind(command_id)
            .bind(agent_id)
            .bind(CommandStatus::Running.id())
            .fetch_optional(pool)
            .await
    }

    /// running -> failed; stores the error message and stamps `completed_at`.
    pub async fn fail(
        pool: &PgPool,
        agent_id: EntityId,
        command_id: EntityId,
        error_message: &str,
    ) -> Result<Option<AgentCommand>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_commands \
             SET status = $1, error_message = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $3 AND agent_id = $4 AND status = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(CommandStatus::Failed.id())
            .bind(error_message)
            .bind(command_id)
            .bind(agent_id)
            .bind(CommandStatus::Running.id())
            .fetch_optional(pool)
            .await
    }

    /// queued/dispatched/running -> cancelled; stamps `completed_at`.
    pub async fn cancel(
        pool: &PgPool,
        tenant_id: EntityId,
        command_id: EntityId,
    ) -> Result<Option<AgentCommand>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_commands \
             SET status = $1, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $2 AND tenant_id = $3 AND status IN ($4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AgentCommand>(&query)
            .bind(CommandStatus::Cancelled.id())
            .bind(command_id)
            .bind(tenant_id)
            .bind(CommandStatus::Queued.id())
            .bind(CommandStatus::Dispatched.id())
            .bind(CommandStatus::Running.id())
            .fetch_optional(pool)
            .await
    }
}
