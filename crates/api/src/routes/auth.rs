//! Route definitions for the `/auth` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// GET /verify  -> verify
/// GET /whoami  -> whoami
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", get(auth::verify))
        .route("/whoami", get(auth::whoami))
}
