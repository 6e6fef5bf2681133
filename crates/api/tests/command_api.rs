//! HTTP-level tests for the command queue lifecycle.

mod common;

use axum::http::StatusCode;
use common::{assert_error_envelope, body_json, get_auth, post_auth, post_json_auth};
use sqlx::PgPool;
use uuid::Uuid;

use botmox_db::repositories::AgentRepo;

/// Enqueue a ping command over the API and return its id.
async fn enqueue_ping(pool: &PgPool, tenant_id: Uuid, agent_id: Uuid) -> Uuid {
    let app = common::build_test_app(pool.clone());
    let token = common::admin_token(tenant_id);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/{agent_id}/commands"),
        &token,
        serde_json::json!({ "command_type": "ping" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().parse().unwrap()
}

/// Claim commands for the agent and return the data array.
async fn poll(pool: &PgPool, tenant_id: Uuid, agent_id: Uuid) -> serde_json::Value {
    let app = common::build_test_app(pool.clone());
    let token = common::agent_token(tenant_id, agent_id);
    let response = post_auth(app, "/api/v1/agents/commands/poll", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// Enqueue writes a queued row with defaulted payload and an expiry.
#[sqlx::test(migrations = "../db/migrations")]
async fn enqueue_creates_queued_command(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;

    let app = common::build_test_app(pool);
    let token = common::admin_token(tenant_id);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/{agent_id}/commands"),
        &token,
        serde_json::json!({ "command_type": "restart", "payload": { "grace_secs": 10 } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "queued");
    assert_eq!(json["data"]["command_type"], "restart");
    assert_eq!(json["data"]["payload"]["grace_secs"], 10);
    assert_eq!(json["data"]["agent_id"], agent_id.to_string());
    assert!(json["data"]["expires_at"].is_string());
    assert!(json["data"]["started_at"].is_null());
}

/// Command types outside the registry are rejected before any write.
#[sqlx::test(migrations = "../db/migrations")]
async fn enqueue_rejects_unknown_command_type(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;

    let app = common::build_test_app(pool);
    let token = common::admin_token(tenant_id);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/{agent_id}/commands"),
        &token,
        serde_json::json!({ "command_type": "format-disk" }),
    )
    .await;

    assert_error_envelope(response, StatusCode::BAD_REQUEST, "UNKNOWN_COMMAND_TYPE").await;
}

/// A revoked agent cannot be targeted.
#[sqlx::test(migrations = "../db/migrations")]
async fn enqueue_rejects_revoked_agent(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    AgentRepo::revoke(&pool, tenant_id, agent_id).await.unwrap();

    let app = common::build_test_app(pool);
    let token = common::admin_token(tenant_id);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/{agent_id}/commands"),
        &token,
        serde_json::json!({ "command_type": "ping" }),
    )
    .await;

    assert_error_envelope(response, StatusCode::CONFLICT, "CONFLICT").await;
}

/// Enqueue requires the admin/infra capability.
#[sqlx::test(migrations = "../db/migrations")]
async fn enqueue_requires_admin(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;

    let app = common::build_test_app(pool);
    let token = common::user_token(tenant_id);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/{agent_id}/commands"),
        &token,
        serde_json::json!({ "command_type": "ping" }),
    )
    .await;

    assert_error_envelope(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

/// queued -> poll (dispatched) -> ack (running) -> result (succeeded).
#[sqlx::test(migrations = "../db/migrations")]
async fn lifecycle_happy_path(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;

    // Poll claims the queued command.
    let polled = poll(&pool, tenant_id, agent_id).await;
    assert_eq!(polled["meta"]["count"], 1);
    assert_eq!(polled["data"][0]["id"], command_id.to_string());
    assert_eq!(polled["data"][0]["status"], "dispatched");

    // Ack moves it to running and stamps started_at.
    let token = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool.clone());
    let response = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "running");
    assert!(json["data"]["started_at"].is_string());

    // Result closes it out with the stored payload.
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/result"),
        &token,
        serde_json::json!({ "outcome": "succeeded", "result": { "rtt_ms": 4 } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "succeeded");
    assert_eq!(json["data"]["result"]["rtt_ms"], 4);
    assert!(json["data"]["completed_at"].is_string());

    // A second poll finds nothing left.
    let polled = poll(&pool, tenant_id, agent_id).await;
    assert_eq!(polled["meta"]["count"], 0);
}

/// A failed outcome stores the error message.
#[sqlx::test(migrations = "../db/migrations")]
async fn failed_outcome_stores_error_message(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;
    poll(&pool, tenant_id, agent_id).await;

    let token = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool.clone());
    let ack = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &token,
    )
    .await;
    assert_eq!(ack.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/result"),
        &token,
        serde_json::json!({ "outcome": "failed", "error_message": "bot process not found" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "failed");
    assert_eq!(json["data"]["error_message"], "bot process not found");
}

/// A failed outcome without an error message is a validation error.
#[sqlx::test(migrations = "../db/migrations")]
async fn failed_outcome_requires_error_message(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;

    let token = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/result"),
        &token,
        serde_json::json!({ "outcome": "failed" }),
    )
    .await;

    assert_error_envelope(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

// ---------------------------------------------------------------------------
// Transition conflicts
// ---------------------------------------------------------------------------

/// Reporting a result twice conflicts with from/to details; the stored
/// outcome is not overwritten.
#[sqlx::test(migrations = "../db/migrations")]
async fn terminal_report_is_not_double_applied(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;
    poll(&pool, tenant_id, agent_id).await;

    let token = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool.clone());
    post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &token,
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let first = post_json_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/result"),
        &token,
        serde_json::json!({ "outcome": "succeeded" }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let second = post_json_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/result"),
        &token,
        serde_json::json!({ "outcome": "failed", "error_message": "flip attempt" }),
    )
    .await;
    let error = assert_error_envelope(second, StatusCode::CONFLICT, "INVALID_TRANSITION").await;
    assert_eq!(error["details"]["from"], "succeeded");
    assert_eq!(error["details"]["to"], "failed");

    // The stored outcome is untouched.
    let app = common::build_test_app(pool);
    let admin = common::admin_token(tenant_id);
    let fetched = get_auth(app, &format!("/api/v1/agents/commands/{command_id}"), &admin).await;
    let json = body_json(fetched).await;
    assert_eq!(json["data"]["status"], "succeeded");
    assert!(json["data"]["error_message"].is_null());
}

/// Acking a command that was never polled (still queued) conflicts.
#[sqlx::test(migrations = "../db/migrations")]
async fn ack_of_unclaimed_command_conflicts(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;

    let token = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool);
    let response = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &token,
    )
    .await;

    let error = assert_error_envelope(response, StatusCode::CONFLICT, "INVALID_TRANSITION").await;
    assert_eq!(error["details"]["from"], "queued");
    assert_eq!(error["details"]["to"], "running");
}

/// Another agent's credential cannot act on the command.
#[sqlx::test(migrations = "../db/migrations")]
async fn foreign_agent_cannot_ack(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_a = common::seed_agent(&pool, tenant_id, "worker-a").await;
    let agent_b = common::seed_agent(&pool, tenant_id, "worker-b").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_a).await;
    poll(&pool, tenant_id, agent_a).await;

    let token = common::agent_token(tenant_id, agent_b);
    let app = common::build_test_app(pool);
    let response = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &token,
    )
    .await;

    assert_error_envelope(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

// ---------------------------------------------------------------------------
// Poll
// ---------------------------------------------------------------------------

/// A revoked agent's poll is refused with 403 so the daemon stops.
#[sqlx::test(migrations = "../db/migrations")]
async fn revoked_agent_cannot_poll(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    AgentRepo::revoke(&pool, tenant_id, agent_id).await.unwrap();

    let app = common::build_test_app(pool);
    let token = common::agent_token(tenant_id, agent_id);
    let response = post_auth(app, "/api/v1/agents/commands/poll", &token).await;

    assert_error_envelope(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

/// A backend fault during poll surfaces as 500, never as the 403 the
/// daemon would read as a revocation.
#[sqlx::test(migrations = "../db/migrations")]
async fn poll_reports_database_faults_as_internal(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;

    let app = common::build_test_app(pool.clone());
    pool.close().await;

    let token = common::agent_token(tenant_id, agent_id);
    let response = post_auth(app, "/api/v1/agents/commands/poll", &token).await;

    assert_error_envelope(
        response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
    )
    .await;
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// An operator can cancel a queued command; the agent never receives it.
#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_queued_command(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;

    let app = common::build_test_app(pool.clone());
    let token = common::admin_token(tenant_id);
    let response = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/cancel"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "cancelled");

    let polled = poll(&pool, tenant_id, agent_id).await;
    assert_eq!(polled["meta"]["count"], 0);
}

/// Cancelling an already-finished command conflicts.
#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_of_terminal_command_conflicts(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;
    poll(&pool, tenant_id, agent_id).await;

    let agent_tok = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool.clone());
    post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &agent_tok,
    )
    .await;
    let app = common::build_test_app(pool.clone());
    post_json_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/result"),
        &agent_tok,
        serde_json::json!({ "outcome": "succeeded" }),
    )
    .await;

    let app = common::build_test_app(pool);
    let admin = common::admin_token(tenant_id);
    let response = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/cancel"),
        &admin,
    )
    .await;

    let error = assert_error_envelope(response, StatusCode::CONFLICT, "INVALID_TRANSITION").await;
    assert_eq!(error["details"]["from"], "succeeded");
    assert_eq!(error["details"]["to"], "cancelled");
}

// ---------------------------------------------------------------------------
// Passive expiry
// ---------------------------------------------------------------------------

/// An overdue queued command never reaches the agent: the poll sweeps it
/// to `expired` and hands out nothing.
#[sqlx::test(migrations = "../db/migrations")]
async fn overdue_command_expires_at_poll_time(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;

    // Backdate the expiry as if the TTL elapsed.
    sqlx::query("UPDATE agent_commands SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(command_id)
        .execute(&pool)
        .await
        .unwrap();

    let polled = poll(&pool, tenant_id, agent_id).await;
    assert_eq!(polled["meta"]["count"], 0);

    let app = common::build_test_app(pool);
    let admin = common::admin_token(tenant_id);
    let fetched = get_auth(app, &format!("/api/v1/agents/commands/{command_id}"), &admin).await;
    let json = body_json(fetched).await;
    assert_eq!(json["data"]["status"], "expired");
    assert!(json["data"]["completed_at"].is_string());
}

/// Reading an overdue command settles it to `expired` even without a poll.
#[sqlx::test(migrations = "../db/migrations")]
async fn overdue_command_expires_at_read_time(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;

    sqlx::query("UPDATE agent_commands SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(command_id)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let admin = common::admin_token(tenant_id);
    let response = get_auth(app, &format!("/api/v1/agents/commands/{command_id}"), &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "expired");
}

/// A dispatched command whose TTL elapsed cannot be acked into running:
/// it settles to `expired` and the ack conflicts from that state.
#[sqlx::test(migrations = "../db/migrations")]
async fn overdue_dispatched_command_cannot_be_acked(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let command_id = enqueue_ping(&pool, tenant_id, agent_id).await;
    poll(&pool, tenant_id, agent_id).await;

    sqlx::query("UPDATE agent_commands SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(command_id)
        .execute(&pool)
        .await
        .unwrap();

    let token = common::agent_token(tenant_id, agent_id);
    let app = common::build_test_app(pool.clone());
    let response = post_auth(
        app,
        &format!("/api/v1/agents/commands/{command_id}/ack"),
        &token,
    )
    .await;

    let error = assert_error_envelope(response, StatusCode::CONFLICT, "INVALID_TRANSITION").await;
    assert_eq!(error["details"]["from"], "expired");
    assert_eq!(error["details"]["to"], "running");

    let app = common::build_test_app(pool);
    let admin = common::admin_token(tenant_id);
    let fetched = get_auth(app, &format!("/api/v1/agents/commands/{command_id}"), &admin).await;
    let json = body_json(fetched).await;
    assert_eq!(json["data"]["status"], "expired");
    assert!(json["data"]["started_at"].is_null());
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// The per-agent listing is newest-first and filterable by status.
#[sqlx::test(migrations = "../db/migrations")]
async fn list_commands_for_agent(pool: PgPool) {
    let tenant_id = Uuid::now_v7();
    let agent_id = common::seed_agent(&pool, tenant_id, "worker-1").await;
    let first = enqueue_ping(&pool, tenant_id, agent_id).await;
    let second = enqueue_ping(&pool, tenant_id, agent_id).await;

    let app = common::build_test_app(pool.clone());
    let token = common::user_token(tenant_id);
    let response = get_auth(app, &format!("/api/v1/agents/{agent_id}/commands"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["count"], 2);
    assert_eq!(json["data"][0]["id"], second.to_string());
    assert_eq!(json["data"][1]["id"], first.to_string());

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/agents/{agent_id}/commands?status=queued"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["meta"]["count"], 2);
}
