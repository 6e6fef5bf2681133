//! Handlers for pairing issuance and exchange.
//!
//! Issuance requires an admin/infra operator; exchange is unauthenticated
//! because the one-time code *is* the credential. Consumption exclusivity
//! is a single conditional UPDATE in [`PairingRepo::consume`], and the
//! exchange runs consume + agent upsert in one transaction so a failed
//! exchange never burns the code.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use botmox_core::error::CoreError;
use botmox_core::pairing;
use botmox_db::models::agent::Agent;
use botmox_db::models::pairing::{CreatePairing, ExchangePairing, Pairing};
use botmox_db::repositories::{AgentRepo, PairingRepo};

use crate::auth::jwt::generate_agent_token;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::rbac::RequireAgentAdmin;
use crate::response::Envelope;
use crate::state::AppState;

/// Response body for a successful pairing exchange.
#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub agent: Agent,
    /// Durable bearer credential for all later agent requests.
    pub access_token: String,
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// Interval the agent should heartbeat at.
    pub heartbeat_interval_secs: u64,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/pairings
///
/// Issue a short-lived one-time pairing code for the caller's tenant.
/// Returns 201 with the pairing record (including the plaintext code --
/// this response is the only place it is ever shown).
pub async fn create_pairing(
    RequireAgentAdmin(identity): RequireAgentAdmin,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreatePairing>,
) -> AppResult<impl IntoResponse> {
    // A targeted re-pairing must reference an agent of the same tenant.
    if let Some(agent_id) = input.agent_id {
        AgentRepo::find_by_id(&state.pool, identity.tenant_id, agent_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Agent",
                id: agent_id.to_string(),
            }))?;
    }

    let code = pairing::generate_code();
    let expires_at =
        Utc::now() + chrono::Duration::seconds(state.config.policy.pairing_ttl_secs);

    let pairing = PairingRepo::create(
        &state.pool,
        identity.tenant_id,
        &code,
        input.agent_name.as_deref(),
        input.agent_id,
        &identity.uid,
        expires_at,
    )
    .await?;

    tracing::info!(
        pairing_id = %pairing.id,
        tenant_id = %pairing.tenant_id,
        created_by = %identity.uid,
        "Pairing code issued",
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(pairing))))
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// POST /api/v1/agents/pairings/exchange
///
/// Exchange a one-time code for a durable agent identity. Exactly one
/// concurrent exchange per code can succeed; the rest see 409.
pub async fn exchange_pairing(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ExchangePairing>,
) -> AppResult<impl IntoResponse> {
    let code = pairing::normalize_code(&input.code);
    if code.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Pairing code must not be empty".into(),
        )));
    }
    // Client-side mistakes must not touch the one-time code.
    let capabilities = validate_capabilities(&input.capabilities)?;

    let mut tx = state.pool.begin().await?;

    let consumed = match PairingRepo::consume(&mut *tx, &code).await? {
        Some(p) => p,
        None => {
            drop(tx);
            return Err(classify_failed_consume(&state, &code).await?);
        }
    };

    // Any error from here until commit rolls the consume back when the
    // transaction drops, leaving the code live for a retry.
    let agent = resolve_agent(&mut tx, &consumed, &input, &capabilities).await?;
    tx.commit().await?;

    let (access_token, expires_in) =
        generate_agent_token(agent.id, agent.tenant_id, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token minting failed: {e}")))?;

    tracing::info!(
        agent_id = %agent.id,
        tenant_id = %agent.tenant_id,
        pairing_id = %consumed.id,
        "Pairing exchanged",
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(ExchangeResponse {
            agent,
            access_token,
            token_type: "Bearer",
            expires_in,
            heartbeat_interval_secs: state.config.policy.heartbeat_interval_secs,
        })),
    ))
}

/// Tell apart the three reasons a consume can fail: unknown code,
/// expired code, or a code someone else already exchanged.
async fn classify_failed_consume(state: &AppState, code: &str) -> AppResult<AppError> {
    let err = match PairingRepo::find_by_code(&state.pool, code).await? {
        None => AppError::Core(CoreError::NotFound {
            entity: "Pairing",
            id: code.to_string(),
        }),
        Some(p) if p.consumed => AppError::Core(CoreError::PairingConsumed),
        Some(p) if pairing::is_expired(p.expires_at, Utc::now()) => {
            AppError::Core(CoreError::PairingExpired)
        }
        // The row was live when we looked: a concurrent exchange won the
        // race between our UPDATE and this read.
        Some(_) => AppError::Core(CoreError::PairingConsumed),
    };
    Ok(err)
}

/// Check the capability descriptor before any state changes, defaulting
/// an absent one to the empty object.
fn validate_capabilities(capabilities: &serde_json::Value) -> AppResult<serde_json::Value> {
    if capabilities.is_null() {
        return Ok(serde_json::json!({}));
    }
    if !capabilities.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "capabilities must be a JSON object".into(),
        )));
    }
    Ok(capabilities.clone())
}

/// Create the agent record for this exchange, or re-activate the one the
/// pairing targeted. Runs inside the exchange transaction.
async fn resolve_agent(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    consumed: &Pairing,
    input: &ExchangePairing,
    capabilities: &serde_json::Value,
) -> AppResult<Agent> {
    if let Some(agent_id) = consumed.agent_id {
        let agent = AgentRepo::reactivate(&mut **tx, agent_id, capabilities)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Agent",
                id: agent_id.to_string(),
            }))?;
        return Ok(agent);
    }

    let name = consumed
        .agent_name
        .as_deref()
        .or(input.agent_name.as_deref())
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "An agent name is required: set it on the pairing or in the exchange request"
                    .into(),
            ))
        })?;

    let agent = AgentRepo::create(&mut **tx, consumed.tenant_id, name, capabilities).await?;
    Ok(agent)
}
