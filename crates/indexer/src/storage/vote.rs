//! Vote storage operations.

use super::{Storage, VoteRow};
use alloy::primitives::B256;
use sqlx::{Row, SqliteConnection};

fn decode_err<E>(e: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(e))
}

impl Storage {
    /// Upsert a vote row keyed by transaction hash.
    ///
    /// A pending row from the optimistic submission path is confirmed in
    /// place rather than duplicated.
    pub async fn upsert_vote(conn: &mut SqliteConnection, row: &VoteRow) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO votes (
                tx_hash, epoch, voter_key, receiver_key,
                upvote, downvote, status,
                block_number, log_index, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_hash) DO UPDATE SET
                epoch = excluded.epoch,
                voter_key = excluded.voter_key,
                receiver_key = excluded.receiver_key,
                upvote = excluded.upvote,
                downvote = excluded.downvote,
                status = excluded.status,
                block_number = excluded.block_number,
                log_index = excluded.log_index,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.tx_hash.as_slice())
        .bind(row.epoch as i64)
        .bind(row.voter_key.as_bytes().as_slice())
        .bind(row.receiver_key.as_bytes().as_slice())
        .bind(row.upvote as i64)
        .bind(row.downvote as i64)
        .bind(row.status.as_str())
        .bind(row.block_number.map(|v| v as i64))
        .bind(row.log_index.map(|v| v as i64))
        .bind(row.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetch a vote row by transaction hash.
    pub async fn get_vote(
        conn: &mut SqliteConnection,
        tx_hash: &B256,
    ) -> sqlx::Result<Option<VoteRow>> {
        let row = sqlx::query(
            r#"
            SELECT tx_hash, epoch, voter_key, receiver_key,
                   upvote, downvote, status,
                   block_number, log_index, updated_at
            FROM votes
            WHERE tx_hash = ?
            "#,
        )
        .bind(tx_hash.as_slice())
        .fetch_optional(conn)
        .await?;

        row.map(Self::row_to_vote).transpose()
    }

    fn row_to_vote(row: sqlx::sqlite::SqliteRow) -> sqlx::Result<VoteRow> {
        let tx_hash: Vec<u8> = row.get("tx_hash");
        let voter_key: Vec<u8> = row.get("voter_key");
        let receiver_key: Vec<u8> = row.get("receiver_key");
        let status: String = row.get("status");
        let block_number: Option<i64> = row.get("block_number");
        let log_index: Option<i64> = row.get("log_index");

        Ok(VoteRow {
            tx_hash: B256::try_from(tx_hash.as_slice()).map_err(decode_err)?,
            epoch: row.get::<i64, _>("epoch") as u64,
            voter_key: B256::try_from(voter_key.as_slice())
                .map_err(decode_err)?
                .into(),
            receiver_key: B256::try_from(receiver_key.as_slice())
                .map_err(decode_err)?
                .into(),
            upvote: row.get::<i64, _>("upvote") as u64,
            downvote: row.get::<i64, _>("downvote") as u64,
            status: status.parse().map_err(decode_err)?,
            block_number: block_number.map(|v| v as u64),
            log_index: log_index.map(|v| v as u64),
            updated_at: row.get("updated_at"),
        })
    }
}
