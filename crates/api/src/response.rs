//! Shared response envelope for API handlers.
//!
//! Every success body is `{ "success": true, "data": ..., "meta"?: ... }`;
//! error bodies are produced by [`crate::error::AppError`]. A response is
//! never a bare payload -- use [`Envelope`] instead of ad-hoc
//! `serde_json::json!` so the shape stays consistent.

use serde::Serialize;

/// Standard success envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(Envelope::new(items)))
/// ```
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap a payload with `success: true` and no metadata.
    pub fn new(data: T) -> Self {
        Envelope {
            success: true,
            data,
            meta: None,
        }
    }

    /// Wrap a payload with metadata (pagination counts and similar).
    pub fn with_meta(data: T, meta: serde_json::Value) -> Self {
        Envelope {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}
