//! Sync state (watermark) storage operations.

use super::{Storage, SyncState};
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Get the current sync state.
    pub async fn get_sync_state(&self) -> Result<SyncState> {
        let row = sqlx::query(
            r#"
            SELECT last_block_number, chain_id, updated_at
            FROM sync_state
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch sync state")?;

        Ok(SyncState {
            last_block_number: row.get::<i64, _>("last_block_number") as u64,
            chain_id: row.get::<i64, _>("chain_id") as u64,
            updated_at: row.get("updated_at"),
        })
    }

    /// Advance the watermark to `block_number`.
    ///
    /// The watermark is monotonically non-decreasing; a lower value is a
    /// no-op rather than a rollback.
    pub async fn advance_watermark(&self, block_number: u64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE sync_state
            SET last_block_number = MAX(last_block_number, ?),
                updated_at = ?
            WHERE id = 1
            "#,
        )
        .bind(block_number as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to advance watermark")?;

        Ok(())
    }

    /// Initialize sync state for a new chain.
    pub async fn initialize_sync_state(&self, chain_id: u64, start_block: u64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE sync_state
            SET last_block_number = ?,
                chain_id = ?,
                updated_at = ?
            WHERE id = 1
            "#,
        )
        .bind(start_block as i64)
        .bind(chain_id as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to initialize sync state")?;

        Ok(())
    }
}
