//! Agent command entity model and DTOs.

use botmox_core::command::CommandStatus;
use botmox_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `agent_commands` table.
///
/// `status` is stored as SMALLINT but decodes into the shared lifecycle
/// enum, so serializing a row puts the status *name* on the wire.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AgentCommand {
    pub id: EntityId,
    pub tenant_id: EntityId,
    pub agent_id: EntityId,
    pub command_type: String,
    /// Opaque key/value payload, schema-checked to be a JSON object.
    pub payload: serde_json::Value,
    #[sqlx(try_from = "i16")]
    pub status: CommandStatus,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub queued_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for `POST /api/v1/agents/{id}/commands`.
#[derive(Debug, Deserialize)]
pub struct EnqueueCommand {
    pub command_type: String,
    /// Must be a JSON object; rejected otherwise before a row is written.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Request body for `POST /api/v1/agents/commands/{id}/result`.
#[derive(Debug, Deserialize)]
pub struct CommandReport {
    pub outcome: CommandOutcome,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

/// Terminal outcome reported by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandOutcome {
    Succeeded,
    Failed,
}

/// Query parameters for `GET /api/v1/agents/{id}/commands`.
#[derive(Debug, Default, Deserialize)]
pub struct CommandListQuery {
    /// Filter by lifecycle status name (e.g. `queued`, `succeeded`).
    pub status: Option<CommandStatus>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
