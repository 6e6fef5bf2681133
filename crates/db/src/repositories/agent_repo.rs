//! Repository for the `agents` table.

use botmox_core::types::EntityId;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::agent::{Agent, AgentListQuery};
use crate::models::status::AgentStatus;

/// Column list for `agents` queries.
const COLUMNS: &str = "\
    id, tenant_id, name, status, capabilities, \
    last_heartbeat_at, last_metrics, created_at, updated_at";

/// Maximum page size for agent listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for agent listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides operations on paired agents.
pub struct AgentRepo;

impl AgentRepo {
    /// Create a new active agent. Fails on a duplicate name within the
    /// tenant (unique constraint `uq_agents_tenant_name`). Executor-generic
    /// so pairing exchange can create the agent in its own transaction.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        tenant_id: EntityId,
        name: &str,
        capabilities: &serde_json::Value,
    ) -> Result<Agent, sqlx::Error> {
        let query = format!(
            "INSERT INTO agents (id, tenant_id, name, status, capabilities) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Agent>(&query)
            .bind(Uuid::now_v7())
            .bind(tenant_id)
            .bind(name)
            .bind(AgentStatus::Active.id())
            .bind(capabilities)
            .fetch_one(executor)
            .await
    }

    /// Re-activate a (typically revoked) agent after a targeted re-pairing,
    /// replacing its capability descriptor.
    pub async fn reactivate<'e>(
        executor: impl PgExecutor<'e>,
        agent_id: EntityId,
        capabilities: &serde_json::Value,
    ) -> Result<Option<Agent>, sqlx::Error> {
        let query = format!(
            "UPDATE agents \
             SET status = $2, capabilities = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Agent>(&query)
            .bind(agent_id)
            .bind(AgentStatus::Active.id())
            .bind(capabilities)
            .fetch_optional(executor)
            .await
    }

    /// Fetch a single agent scoped to a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: EntityId,
        agent_id: EntityId,
    ) -> Result<Option<Agent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM agents WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, Agent>(&query)
            .bind(agent_id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List agents for a tenant.
    ///
    /// Ordering is `name ASC, id ASC` -- stable across identical names so
    /// pagination never skips or duplicates rows.
    pub async fn list(
        pool: &PgPool,
        tenant_id: EntityId,
        params: &AgentListQuery,
    ) -> Result<Vec<Agent>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM agents \
             WHERE tenant_id = $1 AND ($2::SMALLINT IS NULL OR status = $2) \
             ORDER BY name ASC, id ASC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Agent>(&query)
            .bind(tenant_id)
            .bind(params.status.map(AgentStatus::id))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Record a heartbeat: advance `last_heartbeat_at` and store the
    /// metrics payload (last-write-wins). Only active agents match; a
    /// revoked agent gets `None` back.
    pub async fn heartbeat(
        pool: &PgPool,
        agent_id: EntityId,
        metrics: &serde_json::Value,
    ) -> Result<Option<Agent>, sqlx::Error> {
        let query = format!(
            "UPDATE agents \
             SET last_heartbeat_at = NOW(), last_metrics = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Agent>(&query)
            .bind(agent_id)
            .bind(metrics)
            .bind(AgentStatus::Active.id())
            .fetch_optional(pool)
            .await
    }

    /// Soft-disable an agent. Idempotent: revoking an already revoked
    /// agent returns the row unchanged apart from `updated_at`.
    pub async fn revoke(
        pool: &PgPool,
        tenant_id: EntityId,
        agent_id: EntityId,
    ) -> Result<Option<Agent>, sqlx::Error> {
        let query = format!(
            "UPDATE agents \
             SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND tenant_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Agent>(&query)
            .bind(agent_id)
            .bind(tenant_id)
            .bind(AgentStatus::Revoked.id())
            .fetch_optional(pool)
            .await
    }
}
