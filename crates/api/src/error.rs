use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use botmox_core::error::CoreError;
use serde_json::json;
use uuid::Uuid;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the error envelope
/// `{ "success": false, "error": { "code", "message", "details"? } }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `botmox-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    None,
                ),
                CoreError::UnknownCommandType(t) => (
                    StatusCode::BAD_REQUEST,
                    "UNKNOWN_COMMAND_TYPE",
                    format!("Unknown command type: {t}"),
                    None,
                ),
                CoreError::Conflict(msg) => {
                    (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None)
                }
                CoreError::PairingConsumed => (
                    StatusCode::CONFLICT,
                    "PAIRING_ALREADY_CONSUMED",
                    "Pairing code has already been consumed".to_string(),
                    None,
                ),
                CoreError::PairingExpired => (
                    StatusCode::CONFLICT,
                    "PAIRING_EXPIRED",
                    "Pairing code has expired".to_string(),
                    None,
                ),
                CoreError::InvalidTransition { from, to } => (
                    StatusCode::CONFLICT,
                    "INVALID_TRANSITION",
                    format!("Invalid command transition: {from} -> {to}"),
                    Some(json!({ "from": from, "to": to })),
                ),
                CoreError::Unauthorized(msg) => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    msg.clone(),
                    None,
                ),
                CoreError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None)
                }
                CoreError::RateLimited(msg) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    msg.clone(),
                    None,
                ),
                CoreError::UpstreamUnavailable(msg) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UPSTREAM_UNAVAILABLE",
                    msg.clone(),
                    None,
                ),
                CoreError::Internal(msg) => internal_error(msg),
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::InternalError(msg) => internal_error(msg),
        };

        let mut error = json!({ "code": code, "message": message });
        if let Some(details) = details {
            error["details"] = details;
        }
        let body = json!({ "success": false, "error": error });

        (status, axum::Json(body)).into_response()
    }
}

/// Build the 500 mapping: log the real cause with a correlation id, return
/// only the id and a generic message to the caller.
fn internal_error(msg: &str) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    let correlation_id = Uuid::new_v4();
    tracing::error!(error = %msg, %correlation_id, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        Some(json!({ "correlation_id": correlation_id })),
    )
}

/// Classify a sqlx error into a status, error code, message, and details.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`)
///   map to 409 -- e.g. a duplicate agent name within a tenant.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(
    err: &sqlx::Error,
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
            None,
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                        None,
                    );
                }
            }
            internal_error(&db_err.to_string())
        }
        other => internal_error(&other.to_string()),
    }
}
