//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use botmox_core::error::CoreError;
use botmox_core::roles::Role;
use botmox_core::types::{EntityId, Timestamp};
use serde::Serialize;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Verified identity extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(identity: AuthIdentity) -> AppResult<Json<()>> {
///     tracing::info!(uid = %identity.uid, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuthIdentity {
    /// Stable subject identifier from `claims.sub`.
    pub uid: String,
    /// Operator email, absent on agent tokens.
    pub email: Option<String>,
    /// Tenant every resource access is scoped to.
    pub tenant_id: EntityId,
    /// Verified role set.
    pub roles: Vec<Role>,
    /// Present iff the credential belongs to a paired agent.
    pub agent_id: Option<EntityId>,
    /// Token expiry, surfaced by `/auth/verify`.
    pub expires_at: Timestamp,
}

impl FromRequestParts<AppState> for AuthIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                ))
            })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        // Unknown role tags mean a token this deployment did not issue;
        // reject rather than silently narrowing the set.
        let roles = claims
            .roles
            .iter()
            .map(|tag| {
                Role::parse(tag).ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized(format!(
                        "Unknown role in token: {tag}"
                    )))
                })
            })
            .collect::<Result<Vec<Role>, AppError>>()?;

        let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid token expiry".into()))
        })?;

        Ok(AuthIdentity {
            uid: claims.sub,
            email: claims.email,
            tenant_id: claims.tenant_id,
            roles,
            agent_id: claims.agent_id,
            expires_at,
        })
    }
}
