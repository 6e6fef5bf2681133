//! Agent entity model and DTOs.

use botmox_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::AgentStatus;

/// A row from the `agents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Agent {
    pub id: EntityId,
    pub tenant_id: EntityId,
    pub name: String,
    #[sqlx(try_from = "i16")]
    pub status: AgentStatus,
    /// Opaque capability descriptor reported by the agent at pairing time
    /// (platform, supported command types, versions).
    pub capabilities: serde_json::Value,
    pub last_heartbeat_at: Option<Timestamp>,
    /// Most recent heartbeat metrics payload, last-write-wins.
    pub last_metrics: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for `POST /api/v1/agents/heartbeat`.
#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub agent_id: EntityId,
    /// Free-form metrics mapping (cpu, memory, bot process state, ...).
    #[serde(default)]
    pub metrics: serde_json::Value,
}

/// Query parameters for `GET /api/v1/agents`.
#[derive(Debug, Default, Deserialize)]
pub struct AgentListQuery {
    /// Filter by administrative status (`active` / `revoked`).
    pub status: Option<AgentStatus>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
