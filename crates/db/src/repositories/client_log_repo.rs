//! Repository for the `client_logs` table.

use sqlx::PgPool;

use crate::models::client_log::ClientLogBatch;

/// Append-only ingest of frontend log batches.
pub struct ClientLogRepo;

impl ClientLogRepo {
    /// Insert a whole batch in one transaction so a malformed entry late
    /// in the batch does not leave a partial write behind.
    pub async fn insert_batch(pool: &PgPool, batch: &ClientLogBatch) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for entry in &batch.entries {
            sqlx::query(
                "INSERT INTO client_logs (level, message, context, source, logged_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&entry.level)
            .bind(&entry.message)
            .bind(&entry.context)
            .bind(&batch.source)
            .bind(entry.logged_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(batch.entries.len() as u64)
    }
}
