//! Frontend structured-log ingest DTOs.

use botmox_core::types::Timestamp;
use serde::Deserialize;

/// One entry of a `POST /api/v1/client-logs` batch.
#[derive(Debug, Deserialize)]
pub struct ClientLogEntry {
    /// Severity tag as reported by the frontend (`debug`..`error`).
    pub level: String,
    pub message: String,
    /// Free-form structured context.
    pub context: Option<serde_json::Value>,
    /// Client-side timestamp; server records its own `received_at`.
    pub logged_at: Option<Timestamp>,
}

/// Request body for `POST /api/v1/client-logs`.
#[derive(Debug, Deserialize)]
pub struct ClientLogBatch {
    pub entries: Vec<ClientLogEntry>,
    /// Identifier of the emitting client (session or install id).
    pub source: Option<String>,
}
