use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have sensible defaults suitable for
/// local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Pairing, liveness, and queue policy values.
    pub policy: PolicyConfig,
}

/// Policy constants for pairing, liveness, and the command queue.
///
/// Every TTL and timeout is read from here at the point of use, never
/// hard-coded in a handler.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Pairing code lifetime in seconds (default: `600`).
    pub pairing_ttl_secs: i64,
    /// Expected interval between agent heartbeats (default: `30`).
    pub heartbeat_interval_secs: u64,
    /// Seconds without a heartbeat before an agent reads as offline
    /// (default: heartbeat interval x 3).
    pub liveness_timeout_secs: u64,
    /// Command time-to-live before pickup, in seconds (default: `3600`).
    pub command_ttl_secs: i64,
    /// Maximum commands handed out per poll (default: `10`).
    pub command_poll_limit: i64,
    /// Maximum entries in one client-log batch (default: `100`).
    pub client_log_max_batch: usize,
    /// Client-log batches accepted per source per minute (default: `120`).
    pub client_log_rate_per_min: u32,
    /// Maximum age of a VM inventory record before the resolver answers
    /// 503 (default: `900`).
    pub vm_inventory_stale_secs: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            policy: PolicyConfig::from_env(),
        }
    }
}

impl PolicyConfig {
    /// Load policy values from environment variables with defaults.
    ///
    /// | Env Var                   | Default                       |
    /// |---------------------------|-------------------------------|
    /// | `PAIRING_TTL_SECS`        | `600`                         |
    /// | `HEARTBEAT_INTERVAL_SECS` | `30`                          |
    /// | `LIVENESS_TIMEOUT_SECS`   | heartbeat interval x 3        |
    /// | `COMMAND_TTL_SECS`        | `3600`                        |
    /// | `COMMAND_POLL_LIMIT`      | `10`                          |
    /// | `CLIENT_LOG_MAX_BATCH`    | `100`                         |
    /// | `CLIENT_LOG_RATE_PER_MIN` | `120`                         |
    /// | `VM_INVENTORY_STALE_SECS` | `900`                         |
    pub fn from_env() -> Self {
        let heartbeat_interval_secs =
            env_parse("HEARTBEAT_INTERVAL_SECS", 30u64);
        let liveness_timeout_secs = env_parse(
            "LIVENESS_TIMEOUT_SECS",
            heartbeat_interval_secs * botmox_core::liveness::DEFAULT_TIMEOUT_FACTOR,
        );

        Self {
            pairing_ttl_secs: env_parse("PAIRING_TTL_SECS", 600i64),
            heartbeat_interval_secs,
            liveness_timeout_secs,
            command_ttl_secs: env_parse("COMMAND_TTL_SECS", 3600i64),
            command_poll_limit: env_parse("COMMAND_POLL_LIMIT", 10i64),
            client_log_max_batch: env_parse("CLIENT_LOG_MAX_BATCH", 100usize),
            client_log_rate_per_min: env_parse("CLIENT_LOG_RATE_PER_MIN", 120u32),
            vm_inventory_stale_secs: env_parse("VM_INVENTORY_STALE_SECS", 900i64),
        }
    }

    /// Liveness timeout as a chrono duration for comparisons.
    pub fn liveness_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.liveness_timeout_secs as i64)
    }
}

/// Read an env var and parse it, panicking on malformed values so
/// misconfiguration fails at startup rather than mid-request.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be valid: {e:?}")),
        Err(_) => default,
    }
}
