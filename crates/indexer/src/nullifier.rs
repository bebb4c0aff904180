//! Single-use spend-token admission.
//!
//! A confirmed nullifier row is the canonical double-spend guard. The
//! submission path may leave unconfirmed placeholder rows behind before a
//! transaction lands; when the confirming event arrives those placeholders
//! are deleted and replaced with confirmed rows inside the same scoped
//! transaction, so a nullifier is never counted twice.

use alloy::primitives::B256;
use murmur_core::Nullifier;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

/// The Nullifier Guard.
pub struct NullifierGuard;

impl NullifierGuard {
    /// Admit a spend set for one event, or reject it as a duplicate.
    ///
    /// Zero placeholders (unused proof slots) are stripped first. If any
    /// remaining nullifier is already confirmed for this epoch the whole
    /// event is rejected and nothing is mutated. Otherwise unconfirmed
    /// placeholders for the set are deleted and fresh confirmed rows are
    /// inserted, all on the caller's transaction.
    pub async fn admit(
        conn: &mut SqliteConnection,
        nullifiers: &[Nullifier],
        epoch: u64,
        tx_hash: &B256,
    ) -> sqlx::Result<bool> {
        let spend: Vec<&Nullifier> = nullifiers.iter().filter(|n| !n.is_zero()).collect();
        if spend.is_empty() {
            return Ok(true);
        }

        for nullifier in &spend {
            let confirmed: Option<i64> = sqlx::query_scalar(
                "SELECT 1 FROM nullifiers WHERE nullifier = ? AND epoch = ? AND confirmed = 1",
            )
            .bind(nullifier.as_bytes().as_slice())
            .bind(epoch as i64)
            .fetch_optional(&mut *conn)
            .await?;

            if confirmed.is_some() {
                warn!(
                    nullifier = %nullifier,
                    epoch,
                    tx = %tx_hash,
                    "rejecting spend: nullifier already confirmed"
                );
                return Ok(false);
            }
        }

        let now = chrono::Utc::now().timestamp();

        for nullifier in &spend {
            sqlx::query("DELETE FROM nullifiers WHERE nullifier = ? AND epoch = ? AND confirmed = 0")
                .bind(nullifier.as_bytes().as_slice())
                .bind(epoch as i64)
                .execute(&mut *conn)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO nullifiers (nullifier, epoch, confirmed, tx_hash, created_at)
                VALUES (?, ?, 1, ?, ?)
                "#,
            )
            .bind(nullifier.as_bytes().as_slice())
            .bind(epoch as i64)
            .bind(tx_hash.as_slice())
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        debug!(count = spend.len(), epoch, tx = %tx_hash, "nullifiers confirmed");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use alloy::primitives::U256;
    use tempfile::NamedTempFile;

    async fn setup_storage() -> (Storage, NamedTempFile) {
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
        storage.run_migrations().await.unwrap();
        (storage, temp_db)
    }

    fn n(value: u64) -> Nullifier {
        Nullifier::from(U256::from(value))
    }

    async fn count_rows(storage: &Storage, confirmed: bool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM nullifiers WHERE confirmed = ?")
            .bind(confirmed)
            .fetch_one(storage.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_zero_placeholders_are_stripped() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();
        let tx = B256::repeat_byte(0x01);

        let admitted = NullifierGuard::admit(&mut conn, &[n(0), n(55)], 3, &tx)
            .await
            .unwrap();
        assert!(admitted);
        assert_eq!(count_rows(&storage, true).await, 1);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_empty_set_is_admitted_without_rows() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();
        let tx = B256::repeat_byte(0x02);

        let admitted = NullifierGuard::admit(&mut conn, &[n(0), n(0)], 3, &tx)
            .await
            .unwrap();
        assert!(admitted);
        assert_eq!(count_rows(&storage, true).await, 0);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_confirmed_nullifier_rejects_whole_set() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        let first = B256::repeat_byte(0x03);
        assert!(NullifierGuard::admit(&mut conn, &[n(55)], 3, &first)
            .await
            .unwrap());

        // A later event overlapping at any position is rejected entirely.
        let second = B256::repeat_byte(0x04);
        let admitted = NullifierGuard::admit(&mut conn, &[n(99), n(55)], 3, &second)
            .await
            .unwrap();
        assert!(!admitted);

        // The rejection left no trace of the second set.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nullifiers")
            .fetch_one(storage.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_same_nullifier_is_free_in_other_epoch() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();
        let tx = B256::repeat_byte(0x05);

        assert!(NullifierGuard::admit(&mut conn, &[n(55)], 3, &tx)
            .await
            .unwrap());
        assert!(NullifierGuard::admit(&mut conn, &[n(55)], 4, &tx)
            .await
            .unwrap());

        storage.close().await;
    }

    #[tokio::test]
    async fn test_unconfirmed_placeholder_is_replaced() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        // Optimistic placeholder left by the submission path.
        sqlx::query(
            "INSERT INTO nullifiers (nullifier, epoch, confirmed, tx_hash, created_at)
             VALUES (?, 3, 0, NULL, 0)",
        )
        .bind(n(55).as_bytes().as_slice())
        .execute(&mut *conn)
        .await
        .unwrap();

        let tx = B256::repeat_byte(0x06);
        let admitted = NullifierGuard::admit(&mut conn, &[n(0), n(55)], 3, &tx)
            .await
            .unwrap();
        assert!(admitted);

        assert_eq!(count_rows(&storage, false).await, 0);
        assert_eq!(count_rows(&storage, true).await, 1);

        storage.close().await;
    }
}
