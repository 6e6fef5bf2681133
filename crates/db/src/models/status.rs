//! Persisted status enums mapping to SMALLINT columns.
//!
//! The command lifecycle enum lives in `botmox_core::command` because the
//! state machine is shared with the agent daemon; only statuses private to
//! the database schema are defined here.

use botmox_core::error::CoreError;
use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Administrative status of an agent row.
///
/// Distinct from liveness (online/offline), which is derived at read time
/// and never stored.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Paired and allowed to heartbeat and receive commands.
    Active = 1,
    /// Soft-disabled. The row is kept; heartbeats and polls are rejected.
    Revoked = 2,
}

impl AgentStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }
}

impl From<AgentStatus> for StatusId {
    fn from(value: AgentStatus) -> Self {
        value as StatusId
    }
}

impl TryFrom<StatusId> for AgentStatus {
    type Error = CoreError;

    fn try_from(value: StatusId) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AgentStatus::Active),
            2 => Ok(AgentStatus::Revoked),
            other => Err(CoreError::Internal(format!(
                "Unknown agent status id: {other}"
            ))),
        }
    }
}
