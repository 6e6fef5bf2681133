//! Route definitions for the `/vm` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::vm;
use crate::state::AppState;

/// Routes mounted at `/vm`.
///
/// ```text
/// GET /{uuid}/resolve -> resolve
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{uuid}/resolve", get(vm::resolve))
}
