//! Content storage operations (posts and comments).
//!
//! Mutations take a `&mut SqliteConnection` so the projector can batch
//! every write for one event into a single transaction.

use super::{ContentRow, Storage};
use alloy::primitives::B256;
use sqlx::{Row, SqliteConnection};

fn decode_err<E>(e: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(e))
}

impl Storage {
    /// Upsert a content row keyed by transaction hash.
    ///
    /// An existing row (optimistic pending write) is updated in place; the
    /// denormalized `child_count` is left untouched because it is owned by
    /// the recomputation in the comment handler.
    pub async fn upsert_content(
        conn: &mut SqliteConnection,
        row: &ContentRow,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content (
                tx_hash, kind, epoch, epoch_key, content_hash,
                parent_tx_hash, min_rep, status, child_count,
                block_number, log_index, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_hash) DO UPDATE SET
                kind = excluded.kind,
                epoch = excluded.epoch,
                epoch_key = excluded.epoch_key,
                content_hash = excluded.content_hash,
                parent_tx_hash = excluded.parent_tx_hash,
                min_rep = excluded.min_rep,
                status = excluded.status,
                block_number = excluded.block_number,
                log_index = excluded.log_index,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.tx_hash.as_slice())
        .bind(row.kind.as_str())
        .bind(row.epoch as i64)
        .bind(row.epoch_key.as_bytes().as_slice())
        .bind(row.content_hash.as_bytes().as_slice())
        .bind(row.parent_tx_hash.as_ref().map(|h| h.as_slice()))
        .bind(row.min_rep.map(|v| v as i64))
        .bind(row.status.as_str())
        .bind(row.child_count as i64)
        .bind(row.block_number.map(|v| v as i64))
        .bind(row.log_index.map(|v| v as i64))
        .bind(row.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetch a content row by transaction hash.
    pub async fn get_content(
        conn: &mut SqliteConnection,
        tx_hash: &B256,
    ) -> sqlx::Result<Option<ContentRow>> {
        let row = sqlx::query(
            r#"
            SELECT tx_hash, kind, epoch, epoch_key, content_hash,
                   parent_tx_hash, min_rep, status, child_count,
                   block_number, log_index, updated_at
            FROM content
            WHERE tx_hash = ?
            "#,
        )
        .bind(tx_hash.as_slice())
        .fetch_optional(conn)
        .await?;

        row.map(Self::row_to_content).transpose()
    }

    /// Count the direct comments of a parent, in the current transaction's
    /// view.
    pub async fn count_children(
        conn: &mut SqliteConnection,
        parent_tx_hash: &B256,
    ) -> sqlx::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content WHERE parent_tx_hash = ?")
            .bind(parent_tx_hash.as_slice())
            .fetch_one(conn)
            .await?;

        Ok(count as u64)
    }

    /// Write a recomputed child count onto a parent row.
    pub async fn set_child_count(
        conn: &mut SqliteConnection,
        tx_hash: &B256,
        child_count: u64,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE content SET child_count = ? WHERE tx_hash = ?")
            .bind(child_count as i64)
            .bind(tx_hash.as_slice())
            .execute(conn)
            .await?;

        Ok(())
    }

    fn row_to_content(row: sqlx::sqlite::SqliteRow) -> sqlx::Result<ContentRow> {
        let tx_hash: Vec<u8> = row.get("tx_hash");
        let epoch_key: Vec<u8> = row.get("epoch_key");
        let content_hash: Vec<u8> = row.get("content_hash");
        let parent: Option<Vec<u8>> = row.get("parent_tx_hash");
        let kind: String = row.get("kind");
        let status: String = row.get("status");
        let min_rep: Option<i64> = row.get("min_rep");
        let block_number: Option<i64> = row.get("block_number");
        let log_index: Option<i64> = row.get("log_index");

        let parent_tx_hash = parent
            .map(|bytes| B256::try_from(bytes.as_slice()))
            .transpose()
            .map_err(decode_err)?;

        Ok(ContentRow {
            tx_hash: B256::try_from(tx_hash.as_slice()).map_err(decode_err)?,
            kind: kind.parse().map_err(decode_err)?,
            epoch: row.get::<i64, _>("epoch") as u64,
            epoch_key: B256::try_from(epoch_key.as_slice())
                .map_err(decode_err)?
                .into(),
            content_hash: B256::try_from(content_hash.as_slice())
                .map_err(decode_err)?
                .into(),
            parent_tx_hash,
            min_rep: min_rep.map(|v| v as u64),
            status: status.parse().map_err(decode_err)?,
            child_count: row.get::<i64, _>("child_count") as u64,
            block_number: block_number.map(|v| v as u64),
            log_index: log_index.map(|v| v as u64),
            updated_at: row.get("updated_at"),
        })
    }
}
