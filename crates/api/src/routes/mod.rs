pub mod agents;
pub mod auth;
pub mod client_logs;
pub mod health;
pub mod vm;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/verify                        token validity (GET)
/// /auth/whoami                        caller identity (GET)
///
/// /agents                             list agents (GET)
/// /agents/{id}                        get (GET), revoke (DELETE)
/// /agents/heartbeat                   agent liveness signal (POST)
/// /agents/pairings                    issue pairing code (POST)
/// /agents/pairings/exchange           exchange code for credentials (POST)
/// /agents/{id}/commands               enqueue (POST), list (GET)
/// /agents/commands/poll               agent claims queued commands (POST)
/// /agents/commands/{id}               get command (GET)
/// /agents/commands/{id}/ack           dispatched -> running (POST)
/// /agents/commands/{id}/result        running -> succeeded/failed (POST)
/// /agents/commands/{id}/cancel        operator cancel (POST)
///
/// /client-logs                        frontend log batch ingest (POST)
///
/// /vm/{uuid}/resolve                  VM ownership lookup (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/agents", agents::router())
        .nest("/client-logs", client_logs::router())
        .nest("/vm", vm::router())
}
