//! Pairing entity model and DTOs.

use botmox_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `agent_pairings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pairing {
    pub id: EntityId,
    pub tenant_id: EntityId,
    pub code: String,
    pub agent_name: Option<String>,
    /// Set when the pairing re-activates an existing agent instead of
    /// creating a new one.
    pub agent_id: Option<EntityId>,
    pub consumed: bool,
    pub consumed_at: Option<Timestamp>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Request body for `POST /api/v1/agents/pairings`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePairing {
    /// Name for the agent that will be created on exchange. When omitted,
    /// the exchanging agent supplies its own name.
    pub agent_name: Option<String>,
    /// Re-pair an existing (usually revoked) agent.
    pub agent_id: Option<EntityId>,
}

/// Request body for `POST /api/v1/agents/pairings/exchange`.
#[derive(Debug, Deserialize)]
pub struct ExchangePairing {
    pub code: String,
    /// Fallback agent name when the pairing did not fix one.
    pub agent_name: Option<String>,
    /// Capability descriptor stored on the created agent.
    #[serde(default)]
    pub capabilities: serde_json::Value,
}
