//! Command lifecycle state machine and command-type registry.
//!
//! This module is the single source of truth for which status transitions
//! may be persisted. The database layer enforces each edge with a
//! conditional UPDATE, but always validates against this table first so an
//! off-table request is rejected without touching the row.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching the SMALLINT `status` column.
pub type StatusId = i16;

/// Lifecycle status of an agent command.
///
/// Discriminants match the seed order in the `agent_commands` CHECK
/// constraint. Serialized by name on the wire, by discriminant in the
/// database.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// Waiting for the target agent to poll.
    Queued = 1,
    /// Delivered to the agent, start not yet acknowledged.
    Dispatched = 2,
    /// The agent acknowledged start.
    Running = 3,
    /// Terminal: the agent reported success.
    Succeeded = 4,
    /// Terminal: the agent reported failure.
    Failed = 5,
    /// Terminal: an operator cancelled the command.
    Cancelled = 6,
    /// Terminal: the time-to-live elapsed before pickup.
    Expired = 7,
}

impl CommandStatus {
    /// Database discriminant for this status.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Canonical lowercase name, as serialized on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandStatus::Queued => "queued",
            CommandStatus::Dispatched => "dispatched",
            CommandStatus::Running => "running",
            CommandStatus::Succeeded => "succeeded",
            CommandStatus::Failed => "failed",
            CommandStatus::Cancelled => "cancelled",
            CommandStatus::Expired => "expired",
        }
    }

    /// Terminal states are absorbing: no edge leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandStatus::Succeeded
                | CommandStatus::Failed
                | CommandStatus::Cancelled
                | CommandStatus::Expired
        )
    }

    /// The set of statuses reachable from `self` in one transition.
    pub fn valid_transitions(self) -> &'static [CommandStatus] {
        use CommandStatus::*;
        match self {
            Queued => &[Dispatched, Cancelled, Expired],
            Dispatched => &[Running, Cancelled, Expired],
            Running => &[Succeeded, Failed, Cancelled],
            Succeeded | Failed | Cancelled | Expired => &[],
        }
    }

    /// Check whether `self -> to` is an edge of the lifecycle table.
    pub fn can_transition(self, to: CommandStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a transition, producing the typed Conflict error used by
    /// the API layer for stale or duplicate reports.
    pub fn validate_transition(self, to: CommandStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CommandStatus> for StatusId {
    fn from(value: CommandStatus) -> Self {
        value as StatusId
    }
}

impl TryFrom<StatusId> for CommandStatus {
    type Error = CoreError;

    fn try_from(value: StatusId) -> Result<Self, Self::Error> {
        use CommandStatus::*;
        match value {
            1 => Ok(Queued),
            2 => Ok(Dispatched),
            3 => Ok(Running),
            4 => Ok(Succeeded),
            5 => Ok(Failed),
            6 => Ok(Cancelled),
            7 => Ok(Expired),
            other => Err(CoreError::Internal(format!(
                "Unknown command status id: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Command-type registry
// ---------------------------------------------------------------------------

/// Command types agents know how to execute.
///
/// Enqueue requests naming any other type fail with
/// [`CoreError::UnknownCommandType`] before a row is written.
pub const KNOWN_COMMAND_TYPES: &[&str] = &["ping", "start", "stop", "restart", "shutdown", "update"];

/// Check a requested command type against the registry.
pub fn validate_command_type(command_type: &str) -> Result<(), CoreError> {
    if KNOWN_COMMAND_TYPES.contains(&command_type) {
        Ok(())
    } else {
        Err(CoreError::UnknownCommandType(command_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::CommandStatus::*;
    use super::*;

    // -----------------------------------------------------------------------
    // Valid edges
    // -----------------------------------------------------------------------

    #[test]
    fn queued_can_be_dispatched_cancelled_or_expired() {
        assert!(Queued.can_transition(Dispatched));
        assert!(Queued.can_transition(Cancelled));
        assert!(Queued.can_transition(Expired));
    }

    #[test]
    fn dispatched_can_run_cancel_or_expire() {
        assert!(Dispatched.can_transition(Running));
        assert!(Dispatched.can_transition(Cancelled));
        assert!(Dispatched.can_transition(Expired));
    }

    #[test]
    fn running_can_only_finish_or_cancel() {
        assert!(Running.can_transition(Succeeded));
        assert!(Running.can_transition(Failed));
        assert!(Running.can_transition(Cancelled));
        assert!(!Running.can_transition(Expired));
    }

    // -----------------------------------------------------------------------
    // Invalid edges
    // -----------------------------------------------------------------------

    #[test]
    fn queued_cannot_skip_to_running_or_terminal_results() {
        assert!(!Queued.can_transition(Running));
        assert!(!Queued.can_transition(Succeeded));
        assert!(!Queued.can_transition(Failed));
    }

    #[test]
    fn terminal_states_are_absorbing() {
        for terminal in [Succeeded, Failed, Cancelled, Expired] {
            assert!(terminal.is_terminal());
            assert!(terminal.valid_transitions().is_empty());
            // Re-applying the same terminal state is also rejected.
            assert!(!terminal.can_transition(terminal));
        }
    }

    #[test]
    fn validate_transition_reports_both_endpoints() {
        let err = Expired.validate_transition(Running).unwrap_err();
        match err {
            CoreError::InvalidTransition { from, to } => {
                assert_eq!(from, Expired);
                assert_eq!(to, Running);
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Discriminant mapping
    // -----------------------------------------------------------------------

    #[test]
    fn status_ids_roundtrip() {
        for status in [
            Queued, Dispatched, Running, Succeeded, Failed, Cancelled, Expired,
        ] {
            assert_eq!(CommandStatus::try_from(status.id()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_id_is_rejected() {
        assert!(CommandStatus::try_from(0).is_err());
        assert!(CommandStatus::try_from(8).is_err());
    }

    #[test]
    fn wire_names_are_lowercase() {
        let json = serde_json::to_string(&Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
        let back: CommandStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(back, Queued);
    }

    // -----------------------------------------------------------------------
    // Command-type registry
    // -----------------------------------------------------------------------

    #[test]
    fn registered_types_pass_validation() {
        for t in KNOWN_COMMAND_TYPES {
            assert!(validate_command_type(t).is_ok());
        }
    }

    #[test]
    fn unregistered_type_is_rejected() {
        let err = validate_command_type("format-disk").unwrap_err();
        assert!(matches!(err, CoreError::UnknownCommandType(t) if t == "format-disk"));
    }
}
