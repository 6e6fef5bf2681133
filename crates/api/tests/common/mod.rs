//! Shared helpers for API integration tests.
//!
//! Builds the same router (middleware stack included) that `main.rs`
//! serves, plus request and token-minting helpers.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use botmox_api::auth::jwt::{Claims, JwtConfig};
use botmox_api::config::{PolicyConfig, ServerConfig};
use botmox_api::router::build_app_router;
use botmox_api::state::AppState;

/// Secret shared by minted test tokens and the test router.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            agent_token_expiry_days: 90,
        },
        policy: PolicyConfig {
            pairing_ttl_secs: 600,
            heartbeat_interval_secs: 30,
            liveness_timeout_secs: 90,
            command_ttl_secs: 3600,
            command_poll_limit: 10,
            client_log_max_batch: 100,
            client_log_rate_per_min: 120,
            vm_inventory_stale_secs: 900,
        },
    }
}

/// Build the full application router with the default test config.
///
/// Mirrors `main.rs` so integration tests exercise the same middleware
/// stack (CORS, request ID, timeout, tracing, panic recovery).
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

/// Build the full application router with a custom config (used by the
/// rate-limit and policy tests).
pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Token minting
// ---------------------------------------------------------------------------

fn mint_token(
    sub: &str,
    tenant_id: Uuid,
    roles: &[&str],
    agent_id: Option<Uuid>,
) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        email: None,
        tenant_id,
        roles: roles.iter().map(|r| r.to_string()).collect(),
        agent_id,
        exp: now + 3600,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("token encoding should succeed")
}

/// Token with the plain `user` role (read-only operator).
pub fn user_token(tenant_id: Uuid) -> String {
    mint_token("test-user", tenant_id, &["user"], None)
}

/// Token with the `admin` role (pairing issuance, enqueue, revoke).
pub fn admin_token(tenant_id: Uuid) -> String {
    mint_token("test-admin", tenant_id, &["admin"], None)
}

/// Token carrying the `agent` role and an `agent_id` claim.
pub fn agent_token(tenant_id: Uuid, agent_id: Uuid) -> String {
    mint_token(&agent_id.to_string(), tenant_id, &["agent"], Some(agent_id))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a Bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a JSON POST request without authentication.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a JSON POST request with a Bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a bodyless POST request with a Bearer token.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a DELETE request with a Bearer token.
pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body is not JSON: {e} -- raw: {}",
            String::from_utf8_lossy(&bytes)
        )
    })
}

/// Assert the standard error envelope and return the `error` object.
pub async fn assert_error_envelope(
    response: Response<Body>,
    status: StatusCode,
    code: &str,
) -> serde_json::Value {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["success"], false, "error envelope must have success=false");
    assert_eq!(json["error"]["code"], code, "unexpected error code: {json}");
    json["error"].clone()
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Create an active agent directly in the database.
pub async fn seed_agent(pool: &PgPool, tenant_id: Uuid, name: &str) -> Uuid {
    let agent = botmox_db::repositories::AgentRepo::create(
        pool,
        tenant_id,
        name,
        &serde_json::json!({}),
    )
    .await
    .expect("agent creation should succeed");
    agent.id
}

/// Create a live pairing directly in the database and return its code.
pub async fn seed_pairing(pool: &PgPool, tenant_id: Uuid, agent_name: Option<&str>) -> String {
    let code = botmox_core::pairing::generate_code();
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(600);
    botmox_db::repositories::PairingRepo::create(
        pool,
        tenant_id,
        &code,
        agent_name,
        None,
        "test-admin",
        expires_at,
    )
    .await
    .expect("pairing creation should succeed");
    code
}
