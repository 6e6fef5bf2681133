//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthIdentity`] and rejects requests whose role
//! set does not meet the capability requirement. Use these in handlers to
//! enforce authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use botmox_core::error::CoreError;
use botmox_core::roles::capability;
use botmox_core::types::EntityId;

use super::auth::AuthIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Requires an operator role (`user`, `admin`, or `infra`). Agent-only
/// tokens are rejected with 403.
///
/// ```ignore
/// async fn list(RequireOperator(identity): RequireOperator) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireOperator(pub AuthIdentity);

impl FromRequestParts<AppState> for RequireOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = AuthIdentity::from_request_parts(parts, state).await?;
        if !capability::is_operator(&identity.roles) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Operator role required".into(),
            )));
        }
        Ok(RequireOperator(identity))
    }
}

/// Requires `admin` or `infra` role: pairing issuance, command enqueue
/// and cancel, agent revocation. Rejects with 403 Forbidden otherwise.
pub struct RequireAgentAdmin(pub AuthIdentity);

impl FromRequestParts<AppState> for RequireAgentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = AuthIdentity::from_request_parts(parts, state).await?;
        if !capability::can_administer_agents(&identity.roles) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin or infra role required".into(),
            )));
        }
        Ok(RequireAgentAdmin(identity))
    }
}

/// Requires the `agent` role and a well-formed `agent_id` claim
/// (heartbeat, poll, ack, result reporting).
pub struct RequireAgent {
    pub identity: AuthIdentity,
    /// The paired agent the credential belongs to.
    pub agent_id: EntityId,
}

impl FromRequestParts<AppState> for RequireAgent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = AuthIdentity::from_request_parts(parts, state).await?;
        if !capability::is_agent(&identity.roles) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Agent credential required".into(),
            )));
        }
        let agent_id = identity.agent_id.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Agent token is missing the agent_id claim".into(),
            ))
        })?;
        Ok(RequireAgent { identity, agent_id })
    }
}
