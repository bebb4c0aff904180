//! Audit ledger entries and per-key epoch totals.

use super::{EpkTotals, RecordRow, Storage};
use alloy::primitives::B256;
use murmur_core::EpochKey;
use sqlx::{Row, SqliteConnection};

fn decode_err<E>(e: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(e))
}

impl Storage {
    /// Upsert an audit record keyed by transaction hash.
    ///
    /// Writing the confirmed row over an optimistic unconfirmed one is the
    /// replacement step of the record lifecycle; replays land on the same
    /// key and leave a single row either way.
    pub async fn upsert_record(conn: &mut SqliteConnection, row: &RecordRow) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO records (
                tx_hash, action, epoch, from_key, to_key,
                upvote, downvote, confirmed, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_hash) DO UPDATE SET
                action = excluded.action,
                epoch = excluded.epoch,
                from_key = excluded.from_key,
                to_key = excluded.to_key,
                upvote = excluded.upvote,
                downvote = excluded.downvote,
                confirmed = excluded.confirmed,
                created_at = excluded.created_at
            "#,
        )
        .bind(row.tx_hash.as_slice())
        .bind(row.action.as_str())
        .bind(row.epoch as i64)
        .bind(row.from_key.as_bytes().as_slice())
        .bind(row.to_key.as_bytes().as_slice())
        .bind(row.upvote as i64)
        .bind(row.downvote as i64)
        .bind(row.confirmed)
        .bind(row.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetch an audit record by transaction hash.
    pub async fn get_record(
        conn: &mut SqliteConnection,
        tx_hash: &B256,
    ) -> sqlx::Result<Option<RecordRow>> {
        let row = sqlx::query(
            r#"
            SELECT tx_hash, action, epoch, from_key, to_key,
                   upvote, downvote, confirmed, created_at
            FROM records
            WHERE tx_hash = ?
            "#,
        )
        .bind(tx_hash.as_slice())
        .fetch_optional(conn)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    /// Accumulate running totals for one key within one epoch.
    ///
    /// Deltas add onto whatever is already there (`current + delta`); the
    /// row is created on first touch.
    pub async fn accumulate_totals(
        conn: &mut SqliteConnection,
        epoch_key: &EpochKey,
        epoch: u64,
        spent: u64,
        pos_received: u64,
        neg_received: u64,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO epk_totals (epoch_key, epoch, spent, pos_received, neg_received)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(epoch_key, epoch) DO UPDATE SET
                spent = spent + excluded.spent,
                pos_received = pos_received + excluded.pos_received,
                neg_received = neg_received + excluded.neg_received
            "#,
        )
        .bind(epoch_key.as_bytes().as_slice())
        .bind(epoch as i64)
        .bind(spent as i64)
        .bind(pos_received as i64)
        .bind(neg_received as i64)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetch the running totals for one key within one epoch.
    pub async fn get_totals(
        conn: &mut SqliteConnection,
        epoch_key: &EpochKey,
        epoch: u64,
    ) -> sqlx::Result<Option<EpkTotals>> {
        let row = sqlx::query(
            r#"
            SELECT epoch_key, epoch, spent, pos_received, neg_received
            FROM epk_totals
            WHERE epoch_key = ? AND epoch = ?
            "#,
        )
        .bind(epoch_key.as_bytes().as_slice())
        .bind(epoch as i64)
        .fetch_optional(conn)
        .await?;

        row.map(|row| {
            let key: Vec<u8> = row.get("epoch_key");
            Ok(EpkTotals {
                epoch_key: B256::try_from(key.as_slice()).map_err(decode_err)?.into(),
                epoch: row.get::<i64, _>("epoch") as u64,
                spent: row.get::<i64, _>("spent") as u64,
                pos_received: row.get::<i64, _>("pos_received") as u64,
                neg_received: row.get::<i64, _>("neg_received") as u64,
            })
        })
        .transpose()
    }

    fn row_to_record(row: sqlx::sqlite::SqliteRow) -> sqlx::Result<RecordRow> {
        let tx_hash: Vec<u8> = row.get("tx_hash");
        let from_key: Vec<u8> = row.get("from_key");
        let to_key: Vec<u8> = row.get("to_key");
        let action: String = row.get("action");

        Ok(RecordRow {
            tx_hash: B256::try_from(tx_hash.as_slice()).map_err(decode_err)?,
            action: action.parse().map_err(decode_err)?,
            epoch: row.get::<i64, _>("epoch") as u64,
            from_key: B256::try_from(from_key.as_slice())
                .map_err(decode_err)?
                .into(),
            to_key: B256::try_from(to_key.as_slice())
                .map_err(decode_err)?
                .into(),
            upvote: row.get::<i64, _>("upvote") as u64,
            downvote: row.get::<i64, _>("downvote") as u64,
            confirmed: row.get("confirmed"),
            created_at: row.get("created_at"),
        })
    }
}
