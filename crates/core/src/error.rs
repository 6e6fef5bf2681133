use crate::command::CommandStatus;

/// Domain-level error taxonomy.
///
/// The API layer maps each variant to an HTTP status and a machine-readable
/// error code; business components return these instead of raw strings so
/// callers can branch on the kind of failure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The pairing code exists but has already been exchanged.
    #[error("Pairing code has already been consumed")]
    PairingConsumed,

    /// The pairing code exists but its expiry has passed.
    #[error("Pairing code has expired")]
    PairingExpired,

    /// A command status report did not match any edge of the lifecycle
    /// table. Fatal to the request, non-retryable: the reporter holds a
    /// stale view of the record.
    #[error("Invalid command transition: {from} -> {to}")]
    InvalidTransition {
        from: CommandStatus,
        to: CommandStatus,
    },

    /// The requested command type is not in the registered set.
    #[error("Unknown command type: {0}")]
    UnknownCommandType(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// A dependent service (Proxmox inventory sync) cannot be trusted or
    /// reached; the caller should retry later.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
