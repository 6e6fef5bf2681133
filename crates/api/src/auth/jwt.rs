//! JWT access-token validation and agent-credential minting.
//!
//! Operator tokens are issued by the external authenticator with the same
//! HS256 secret; this service only validates them. Agent tokens are minted
//! here on a successful pairing exchange and carry the `agent` role plus
//! the `agent_id` and `tenant_id` claims that scope every later request.

use botmox_core::types::EntityId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- operator uid or, for agent tokens, the agent id.
    pub sub: String,
    /// Operator email, absent on agent tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Tenant scoping every resource the token can touch.
    pub tenant_id: EntityId,
    /// Role tags (e.g. `["user"]`, `["admin", "infra"]`, `["agent"]`).
    pub roles: Vec<String>,
    /// Present iff the token belongs to a paired agent daemon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<EntityId>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for revocation / audit.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Agent token lifetime in days (default: 90). Agent credentials are
    /// durable; revocation happens through the agent record, not expiry.
    pub agent_token_expiry_days: i64,
}

/// Default agent token expiry in days.
const DEFAULT_AGENT_EXPIRY_DAYS: i64 = 90;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `JWT_SECRET`              | **yes**  | --      |
    /// | `AGENT_TOKEN_EXPIRY_DAYS` | no       | `90`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let agent_token_expiry_days: i64 = std::env::var("AGENT_TOKEN_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_AGENT_EXPIRY_DAYS.to_string())
            .parse()
            .expect("AGENT_TOKEN_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            agent_token_expiry_days,
        }
    }
}

/// Mint the durable HS256 credential handed to an agent on pairing.
///
/// Returns `(token, expires_in_secs)`.
pub fn generate_agent_token(
    agent_id: EntityId,
    tenant_id: EntityId,
    config: &JwtConfig,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let lifetime_secs = config.agent_token_expiry_days * 24 * 60 * 60;

    let claims = Claims {
        sub: agent_id.to_string(),
        email: None,
        tenant_id,
        roles: vec!["agent".to_string()],
        agent_id: Some(agent_id),
        exp: now + lifetime_secs,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok((token, lifetime_secs))
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature, expiration, and issued-at claims automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
