//! Recorded proofs and announced state-tree roots.

use super::{ProofRow, Storage};
use alloy::primitives::{B256, U256};
use murmur_core::ProofKind;
use sqlx::{Row, SqliteConnection};

fn decode_err<E>(e: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(e))
}

impl Storage {
    /// Record a submitted proof.
    ///
    /// Keyed by `(epoch, proof_index)`; replays of the same submission are
    /// ignored so the cached `valid` flag survives re-processing.
    pub async fn insert_proof(conn: &mut SqliteConnection, row: &ProofRow) -> sqlx::Result<()> {
        let signals = serde_json::to_string(&row.public_signals)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        sqlx::query(
            r#"
            INSERT INTO proofs (
                epoch, proof_index, kind, public_signals,
                proof, state_root, valid, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(epoch, proof_index) DO NOTHING
            "#,
        )
        .bind(row.epoch as i64)
        .bind(row.proof_index as i64)
        .bind(row.kind.tag() as i64)
        .bind(signals)
        .bind(row.proof.as_slice())
        .bind(row.state_root.as_slice())
        .bind(row.valid)
        .bind(row.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetch a recorded proof by `(epoch, proof_index)`.
    pub async fn get_proof(
        conn: &mut SqliteConnection,
        epoch: u64,
        proof_index: u64,
    ) -> sqlx::Result<Option<ProofRow>> {
        let row = sqlx::query(
            r#"
            SELECT epoch, proof_index, kind, public_signals,
                   proof, state_root, valid, created_at
            FROM proofs
            WHERE epoch = ? AND proof_index = ?
            "#,
        )
        .bind(epoch as i64)
        .bind(proof_index as i64)
        .fetch_optional(conn)
        .await?;

        row.map(Self::row_to_proof).transpose()
    }

    /// Cache a verification outcome on a recorded proof.
    pub async fn set_proof_validity(
        conn: &mut SqliteConnection,
        epoch: u64,
        proof_index: u64,
        valid: bool,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE proofs SET valid = ? WHERE epoch = ? AND proof_index = ?")
            .bind(valid)
            .bind(epoch as i64)
            .bind(proof_index as i64)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Record a global-state-tree root announced for an epoch.
    pub async fn insert_epoch_root(
        conn: &mut SqliteConnection,
        epoch: u64,
        root: &B256,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO epoch_roots (epoch, root)
            VALUES (?, ?)
            ON CONFLICT(epoch, root) DO NOTHING
            "#,
        )
        .bind(epoch as i64)
        .bind(root.as_slice())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Whether a root was announced for the given epoch.
    pub async fn epoch_root_exists(
        conn: &mut SqliteConnection,
        epoch: u64,
        root: &B256,
    ) -> sqlx::Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM epoch_roots WHERE epoch = ? AND root = ?")
                .bind(epoch as i64)
                .bind(root.as_slice())
                .fetch_optional(conn)
                .await?;

        Ok(found.is_some())
    }

    fn row_to_proof(row: sqlx::sqlite::SqliteRow) -> sqlx::Result<ProofRow> {
        let signals: String = row.get("public_signals");
        let proof: Vec<u8> = row.get("proof");
        let state_root: Vec<u8> = row.get("state_root");
        let kind: i64 = row.get("kind");

        let public_signals: Vec<U256> = serde_json::from_str(&signals).map_err(decode_err)?;

        Ok(ProofRow {
            epoch: row.get::<i64, _>("epoch") as u64,
            proof_index: row.get::<i64, _>("proof_index") as u64,
            kind: ProofKind::from_tag(kind as u8).map_err(decode_err)?,
            public_signals,
            proof,
            state_root: B256::try_from(state_root.as_slice()).map_err(decode_err)?,
            valid: row.get("valid"),
            created_at: row.get("created_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    async fn setup_storage() -> (Storage, NamedTempFile) {
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
        storage.run_migrations().await.unwrap();
        (storage, temp_db)
    }

    fn proof_row() -> ProofRow {
        ProofRow {
            epoch: 3,
            proof_index: 7,
            kind: ProofKind::Reputation,
            public_signals: vec![U256::from(1u64), U256::from(2u64)],
            proof: vec![0xde, 0xad, 0xbe, 0xef],
            state_root: B256::repeat_byte(0x44),
            valid: None,
            created_at: 1700000000,
        }
    }

    #[tokio::test]
    async fn test_proof_round_trip_and_validity_cache() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        let row = proof_row();
        Storage::insert_proof(&mut conn, &row).await.unwrap();

        let got = Storage::get_proof(&mut conn, 3, 7).await.unwrap().unwrap();
        assert_eq!(got, row);

        Storage::set_proof_validity(&mut conn, 3, 7, false)
            .await
            .unwrap();
        let got = Storage::get_proof(&mut conn, 3, 7).await.unwrap().unwrap();
        assert_eq!(got.valid, Some(false));

        assert!(Storage::get_proof(&mut conn, 3, 8).await.unwrap().is_none());

        storage.close().await;
    }

    #[tokio::test]
    async fn test_proof_insert_ignores_replay() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        let row = proof_row();
        Storage::insert_proof(&mut conn, &row).await.unwrap();
        Storage::set_proof_validity(&mut conn, 3, 7, true)
            .await
            .unwrap();

        // Replaying the submission must not clear the cached flag.
        Storage::insert_proof(&mut conn, &row).await.unwrap();
        let got = Storage::get_proof(&mut conn, 3, 7).await.unwrap().unwrap();
        assert_eq!(got.valid, Some(true));

        storage.close().await;
    }

    #[tokio::test]
    async fn test_epoch_root_membership() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        let root = B256::repeat_byte(0x55);
        Storage::insert_epoch_root(&mut conn, 2, &root).await.unwrap();
        Storage::insert_epoch_root(&mut conn, 2, &root).await.unwrap();

        assert!(Storage::epoch_root_exists(&mut conn, 2, &root)
            .await
            .unwrap());
        assert!(!Storage::epoch_root_exists(&mut conn, 3, &root)
            .await
            .unwrap());
        assert!(!Storage::epoch_root_exists(&mut conn, 2, &B256::repeat_byte(0x56))
            .await
            .unwrap());

        storage.close().await;
    }
}
