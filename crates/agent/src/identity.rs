//! Persisted agent identity.
//!
//! The credential from a pairing exchange is written to a JSON file so the
//! daemon survives restarts without a fresh code. The file is the agent's
//! long-lived secret; it is written with owner-only permissions.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored identity, one file per daemon install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub access_token: String,
    /// Interval the backend asked us to heartbeat at.
    pub heartbeat_interval_secs: u64,
    /// When the exchange happened, for operator forensics.
    pub paired_at: chrono::DateTime<chrono::Utc>,
}

impl AgentIdentity {
    /// Load a stored identity. `Ok(None)` when no file exists yet.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let identity = serde_json::from_str(&raw)
                    .with_context(|| format!("malformed identity file {}", path.display()))?;
                Ok(Some(identity))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("cannot read identity file {}", path.display()))
            }
        }
    }

    /// Persist the identity, replacing any previous file.
    pub fn store(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("identity serialization failed")?;
        std::fs::write(path, raw)
            .with_context(|| format!("cannot write identity file {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot chmod identity file {}", path.display()))?;
        }
        Ok(())
    }
}
