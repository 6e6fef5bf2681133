//! Repository for the `agent_pairings` table.
//!
//! Consumption must be linearizable per code: `consume` is a single
//! conditional UPDATE, so of any number of concurrent exchange attempts
//! exactly one observes `consumed = FALSE` and wins. Losers classify the
//! failure with a follow-up read.

use botmox_core::types::{EntityId, Timestamp};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::pairing::Pairing;

/// Column list for `agent_pairings` queries.
const COLUMNS: &str = "\
    id, tenant_id, code, agent_name, agent_id, consumed, consumed_at, \
    created_by, created_at, expires_at";

/// Provides operations on one-time pairing codes.
pub struct PairingRepo;

impl PairingRepo {
    /// Persist a freshly issued pairing code.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        tenant_id: EntityId,
        code: &str,
        agent_name: Option<&str>,
        agent_id: Option<EntityId>,
        created_by: &str,
        expires_at: Timestamp,
    ) -> Result<Pairing, sqlx::Error> {
        let query = format!(
            "INSERT INTO agent_pairings \
                 (id, tenant_id, code, agent_name, agent_id, created_by, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pairing>(&query)
            .bind(Uuid::now_v7())
            .bind(tenant_id)
            .bind(code)
            .bind(agent_name)
            .bind(agent_id)
            .bind(created_by)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Atomically mark a code consumed if it is still live.
    ///
    /// Returns the pairing row on success, `None` when the code is absent,
    /// already consumed, or expired -- use [`PairingRepo::find_by_code`]
    /// to tell those apart. Takes any executor so the exchange handler can
    /// run it inside the same transaction as the agent upsert.
    pub async fn consume<'e>(
        executor: impl PgExecutor<'e>,
        code: &str,
    ) -> Result<Option<Pairing>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_pairings \
             SET consumed = TRUE, consumed_at = NOW() \
             WHERE code = $1 AND consumed = FALSE AND expires_at > NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pairing>(&query)
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    /// Plain lookup, used to classify a failed consume.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Pairing>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM agent_pairings WHERE code = $1");
        sqlx::query_as::<_, Pairing>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }
}
