use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::rate_limit::FixedWindowLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: botmox_db::DbPool,
    /// Server configuration (policy values, JWT secret, CORS origins).
    pub config: Arc<ServerConfig>,
    /// Per-source limiter for the unauthenticated client-log ingest.
    pub client_log_limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    /// Build state from a pool and config, wiring the limiter from policy.
    pub fn new(pool: botmox_db::DbPool, config: ServerConfig) -> Self {
        let limiter = FixedWindowLimiter::new(
            Duration::from_secs(60),
            config.policy.client_log_rate_per_min,
        );
        AppState {
            pool,
            config: Arc::new(config),
            client_log_limiter: Arc::new(limiter),
        }
    }
}
