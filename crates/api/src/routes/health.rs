//! Liveness and readiness probes (mounted at root level, NOT under `/api/v1`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::response::Envelope;
use crate::state::AppState;

/// Probe response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_healthy: Option<bool>,
}

/// GET /health/live -- process is up and serving requests.
async fn live() -> Json<Envelope<HealthResponse>> {
    Json(Envelope::new(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        db_healthy: None,
    }))
}

/// GET /health/ready -- 200 once the database answers, 503 until then.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Envelope<HealthResponse>>) {
    let db_healthy = botmox_db::health_check(&state.pool).await.is_ok();

    let (status_code, status) = if db_healthy {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status_code,
        Json(Envelope::new(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            db_healthy: Some(db_healthy),
        })),
    )
}

/// Mount health probe routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
}
