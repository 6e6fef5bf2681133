//! Handlers for the `/auth` resource.
//!
//! Token issuance for operators lives in the external authenticator; these
//! endpoints only validate and introspect bearer credentials.

use axum::Json;
use serde::Serialize;

use botmox_core::types::Timestamp;

use crate::error::AppResult;
use crate::middleware::auth::AuthIdentity;
use crate::response::Envelope;

/// Response body for `GET /auth/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub uid: String,
    pub expires_at: Timestamp,
}

/// GET /api/v1/auth/verify
///
/// Succeeds (200) iff the bearer token is valid; the [`AuthIdentity`]
/// extractor has already rejected missing/expired tokens with 401.
pub async fn verify(identity: AuthIdentity) -> AppResult<Json<Envelope<VerifyResponse>>> {
    Ok(Json(Envelope::new(VerifyResponse {
        valid: true,
        uid: identity.uid,
        expires_at: identity.expires_at,
    })))
}

/// GET /api/v1/auth/whoami
///
/// Returns the caller's full identity: uid, email, tenant, role set, and
/// (for agent credentials) the agent id.
pub async fn whoami(identity: AuthIdentity) -> AppResult<Json<Envelope<AuthIdentity>>> {
    Ok(Json(Envelope::new(identity)))
}
