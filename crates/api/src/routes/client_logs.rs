//! Route definitions for the `/client-logs` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::client_logs;
use crate::state::AppState;

/// Routes mounted at `/client-logs`.
///
/// ```text
/// POST / -> ingest (unauthenticated, rate limited)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(client_logs::ingest))
}
