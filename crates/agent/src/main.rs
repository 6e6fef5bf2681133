//! `botmox-agent` -- bot host daemon.
//!
//! Runs inside a Proxmox-hosted bot VM. On first start it exchanges a
//! one-time pairing code for a durable identity, stores it on disk, and
//! from then on heartbeats and polls the backend for commands.
//!
//! # Environment variables
//!
//! | Variable                  | Required   | Default                  | Description                         |
//! |---------------------------|------------|--------------------------|-------------------------------------|
//! | `BOTMOX_API_URL`          | yes        | --                       | Backend base URL, e.g. `http://host:3000` |
//! | `BOTMOX_PAIRING_CODE`     | first run  | --                       | One-time code issued by an operator |
//! | `BOTMOX_AGENT_NAME`       | no         | hostname                 | Name registered at pairing time     |
//! | `BOTMOX_IDENTITY_FILE`    | no         | `botmox-identity.json`   | Where the credential is stored      |
//! | `BOTMOX_BOT_SERVICE`      | no         | `botmox-bot`             | systemd unit managed by commands    |

use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use botmox_agent::client::ApiClient;
use botmox_agent::executor::Executor;
use botmox_agent::identity::AgentIdentity;
use botmox_agent::runner;

/// Default identity file, relative to the working directory.
const DEFAULT_IDENTITY_FILE: &str = "botmox-identity.json";

/// Default systemd unit managed by lifecycle commands.
const DEFAULT_BOT_SERVICE: &str = "botmox-bot";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botmox_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url = std::env::var("BOTMOX_API_URL").unwrap_or_else(|_| {
        tracing::error!("BOTMOX_API_URL environment variable is required");
        std::process::exit(1);
    });

    let identity_path = PathBuf::from(
        std::env::var("BOTMOX_IDENTITY_FILE")
            .unwrap_or_else(|_| DEFAULT_IDENTITY_FILE.to_string()),
    );

    let bot_service =
        std::env::var("BOTMOX_BOT_SERVICE").unwrap_or_else(|_| DEFAULT_BOT_SERVICE.to_string());

    let identity = match load_or_pair(&api_url, &identity_path).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(error = %e, "Could not establish an agent identity");
            std::process::exit(1);
        }
    };

    tracing::info!(
        agent_id = %identity.agent_id,
        name = %identity.agent_name,
        api_url = %api_url,
        "Starting botmox-agent",
    );

    let client = ApiClient::new(&api_url, Some(identity.access_token.clone()));
    let executor = Executor::new(bot_service);

    runner::run(
        &client,
        &executor,
        identity.agent_id,
        Duration::from_secs(identity.heartbeat_interval_secs),
    )
    .await;
}

/// Use the stored identity when one exists, otherwise pair with the
/// one-time code from the environment.
async fn load_or_pair(
    api_url: &str,
    identity_path: &std::path::Path,
) -> anyhow::Result<AgentIdentity> {
    if let Some(identity) = AgentIdentity::load(identity_path)? {
        tracing::info!(path = %identity_path.display(), "Loaded stored identity");
        return Ok(identity);
    }

    let code = std::env::var("BOTMOX_PAIRING_CODE").map_err(|_| {
        anyhow::anyhow!(
            "no identity file at {} and BOTMOX_PAIRING_CODE is not set",
            identity_path.display()
        )
    })?;

    let agent_name = std::env::var("BOTMOX_AGENT_NAME").ok().or_else(hostname);

    tracing::info!("Exchanging pairing code");
    let client = ApiClient::new(api_url, None);
    let exchanged = client
        .exchange_pairing(&code, agent_name.as_deref(), capabilities())
        .await?;

    let identity = AgentIdentity {
        agent_id: exchanged.agent.id,
        agent_name: exchanged.agent.name,
        access_token: exchanged.access_token,
        heartbeat_interval_secs: exchanged.heartbeat_interval_secs,
        paired_at: chrono::Utc::now(),
    };
    identity.store(identity_path)?;
    tracing::info!(
        agent_id = %identity.agent_id,
        path = %identity_path.display(),
        "Pairing complete, identity stored",
    );
    Ok(identity)
}

/// Capability descriptor registered with the backend at pairing time.
fn capabilities() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "command_types": ["ping", "start", "stop", "restart", "shutdown", "update"],
    })
}

fn hostname() -> Option<String> {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
