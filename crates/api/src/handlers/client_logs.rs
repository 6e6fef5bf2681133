//! Handler for the frontend log ingest.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use botmox_core::error::CoreError;
use botmox_db::models::client_log::ClientLogBatch;
use botmox_db::repositories::ClientLogRepo;

use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::response::Envelope;
use crate::state::AppState;

const KNOWN_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// POST /api/v1/client-logs
///
/// Accept a batch of structured frontend log entries. Unauthenticated,
/// so batches are capped and rate limited per `source`.
pub async fn ingest(
    State(state): State<AppState>,
    ValidatedJson(batch): ValidatedJson<ClientLogBatch>,
) -> AppResult<impl IntoResponse> {
    if batch.entries.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "entries must not be empty".into(),
        )));
    }
    if batch.entries.len() > state.config.policy.client_log_max_batch {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Batch exceeds the maximum of {} entries",
            state.config.policy.client_log_max_batch
        ))));
    }
    for entry in &batch.entries {
        if !KNOWN_LEVELS.contains(&entry.level.as_str()) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown log level '{}'",
                entry.level
            ))));
        }
        if entry.message.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Log message must not be empty".into(),
            )));
        }
    }

    let key = batch.source.as_deref().unwrap_or("anonymous");
    if !state.client_log_limiter.try_acquire(key) {
        return Err(AppError::Core(CoreError::RateLimited(
            "Client log rate limit exceeded for this source".into(),
        )));
    }

    let accepted = ClientLogRepo::insert_batch(&state.pool, &batch).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::new(json!({ "accepted": accepted }))),
    ))
}
