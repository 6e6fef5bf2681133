//! Derived agent liveness.
//!
//! Liveness is never persisted: it is computed at read time by comparing
//! the last heartbeat against a configured timeout (heartbeat interval
//! multiplied by a tolerance factor). An agent that has never heartbeated
//! is offline.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Multiplier applied to the heartbeat interval to get the default
/// liveness timeout: an agent may miss two beats before flipping offline.
pub const DEFAULT_TIMEOUT_FACTOR: u64 = 3;

/// Computed liveness of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Online,
    Offline,
}

/// Derive liveness from the last heartbeat timestamp.
pub fn derive(
    last_heartbeat_at: Option<Timestamp>,
    now: Timestamp,
    timeout: chrono::Duration,
) -> Liveness {
    match last_heartbeat_at {
        Some(seen) if now - seen < timeout => Liveness::Online,
        _ => Liveness::Offline,
    }
}
