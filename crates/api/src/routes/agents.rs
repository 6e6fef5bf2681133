//! Route definitions for the `/agents` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{agents, commands, pairings};
use crate::state::AppState;

/// Routes mounted at `/agents`.
///
/// ```text
/// GET    /                      -> list_agents
/// POST   /heartbeat             -> heartbeat
/// POST   /pairings              -> create_pairing
/// POST   /pairings/exchange     -> exchange_pairing
/// POST   /commands/poll         -> poll_commands
/// GET    /commands/{id}         -> get_command
/// POST   /commands/{id}/ack     -> ack_command
/// POST   /commands/{id}/result  -> report_command
/// POST   /commands/{id}/cancel  -> cancel_command
/// GET    /{id}                  -> get_agent
/// DELETE /{id}                  -> revoke_agent
/// GET    /{id}/commands         -> list_agent_commands
/// POST   /{id}/commands         -> enqueue_command
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(agents::list_agents))
        .route("/heartbeat", post(agents::heartbeat))
        .route("/pairings", post(pairings::create_pairing))
        .route("/pairings/exchange", post(pairings::exchange_pairing))
        .route("/commands/poll", post(commands::poll_commands))
        .route("/commands/{id}", get(commands::get_command))
        .route("/commands/{id}/ack", post(commands::ack_command))
        .route("/commands/{id}/result", post(commands::report_command))
        .route("/commands/{id}/cancel", post(commands::cancel_command))
        .route(
            "/{id}",
            get(agents::get_agent).delete(agents::revoke_agent),
        )
        .route(
            "/{id}/commands",
            get(commands::list_agent_commands).post(commands::enqueue_command),
        )
}
