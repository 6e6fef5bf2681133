//! HTTP client for the Bot-Mox backend.
//!
//! All responses arrive in the standard envelope: `{ success, data }` on
//! success, `{ success: false, error: { code, message } }` on failure.
//! [`ApiClient`] unwraps the envelope and turns error bodies into typed
//! failures so the run loop can branch on the code.

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An error envelope decoded from a non-2xx response.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Deserialize)]
struct SuccessEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Agent record as returned by the backend.
#[derive(Debug, Deserialize)]
pub struct AgentData {
    pub id: Uuid,
    pub name: String,
}

/// Payload of a successful pairing exchange.
#[derive(Debug, Deserialize)]
pub struct ExchangeData {
    pub agent: AgentData,
    pub access_token: String,
    pub heartbeat_interval_secs: u64,
}

/// A command claimed from the queue.
#[derive(Debug, Clone, Deserialize)]
pub struct PolledCommand {
    pub id: Uuid,
    pub command_type: String,
    pub payload: serde_json::Value,
}

/// Terminal report sent back after execution.
#[derive(Debug, Serialize)]
pub struct CommandReport {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Thin wrapper over `reqwest` carrying the base URL and bearer token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client. `token` is `None` until pairing completes.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<T> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.context("request failed")?;
        unwrap_envelope(response).await
    }

    /// Exchange a one-time pairing code for an agent identity.
    pub async fn exchange_pairing(
        &self,
        code: &str,
        agent_name: Option<&str>,
        capabilities: serde_json::Value,
    ) -> anyhow::Result<ExchangeData> {
        let body = serde_json::json!({
            "code": code,
            "agent_name": agent_name,
            "capabilities": capabilities,
        });
        self.post_json("/agents/pairings/exchange", &body).await
    }

    /// Report liveness and current host metrics.
    pub async fn heartbeat(
        &self,
        agent_id: Uuid,
        metrics: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({ "agent_id": agent_id, "metrics": metrics });
        self.post_json("/agents/heartbeat", &body).await
    }

    /// Claim queued commands addressed to this agent.
    pub async fn poll_commands(&self) -> anyhow::Result<Vec<PolledCommand>> {
        self.post_json("/agents/commands/poll", &serde_json::json!({}))
            .await
    }

    /// Acknowledge that execution of a command has started.
    pub async fn ack_command(&self, command_id: Uuid) -> anyhow::Result<serde_json::Value> {
        self.post_json(&format!("/agents/commands/{command_id}/ack"), &serde_json::json!({}))
            .await
    }

    /// Report the terminal outcome of a command.
    pub async fn report_command(
        &self,
        command_id: Uuid,
        report: &CommandReport,
    ) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::to_value(report).context("report serialization failed")?;
        self.post_json(&format!("/agents/commands/{command_id}/result"), &body)
            .await
    }
}

/// Unwrap the response envelope, mapping error bodies to [`ApiError`].
async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    let bytes = response.bytes().await.context("failed to read response body")?;

    if status.is_success() {
        let envelope: SuccessEnvelope<T> =
            serde_json::from_slice(&bytes).context("malformed success envelope")?;
        return Ok(envelope.data);
    }

    match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(envelope) => Err(anyhow::Error::new(envelope.error)),
        Err(_) => Err(anyhow!(
            "backend returned {status} with a non-envelope body"
        )),
    }
}
