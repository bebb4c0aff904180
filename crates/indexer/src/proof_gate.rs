//! Re-validation of proofs referenced by board events.
//!
//! A referencing event names a proof by `(epoch, index)`. The gate refuses
//! to let any mutation through unless the recorded proof both verifies
//! cryptographically and anchors to a state root that was actually
//! announced for that epoch. A syntactically valid proof can still claim a
//! root that was never canonical, which the cryptographic check alone
//! cannot catch.

use std::fmt;
use std::sync::Arc;

use sqlx::SqliteConnection;
use tracing::warn;

use crate::error::SyncError;
use crate::signals::ProofSignals;
use crate::storage::Storage;
use crate::verifier::ProofVerifier;

/// Why an event's mutation was skipped.
///
/// These are expected-invalid outcomes, logged for audit and never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The referenced proof already carries a cached `valid = false`.
    CachedInvalid,
    /// The recorded signal vector does not match the circuit layout.
    MalformedSignals,
    /// The proof's signals name a different epoch than the reference.
    EpochMismatch,
    /// The proof's signals bind a different epoch key than the event.
    KeyMismatch,
    /// The referenced proof is from an unexpected circuit.
    CircuitMismatch,
    /// The external verifier rejected the proof.
    VerificationFailed,
    /// The claimed state root was never announced for the epoch.
    StaleStateRoot,
    /// A nullifier in the spend set is already confirmed.
    DuplicateNullifier,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::CachedInvalid => "cached invalid proof",
            RejectReason::MalformedSignals => "malformed public signals",
            RejectReason::EpochMismatch => "proof epoch mismatch",
            RejectReason::KeyMismatch => "proof epoch-key mismatch",
            RejectReason::CircuitMismatch => "unexpected proof circuit",
            RejectReason::VerificationFailed => "proof verification failed",
            RejectReason::StaleStateRoot => "stale state root",
            RejectReason::DuplicateNullifier => "duplicate nullifier",
        };
        f.write_str(s)
    }
}

/// Outcome of gating one proof reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The proof holds; decoded signals for the caller.
    Valid(ProofSignals),
    /// The proof does not hold; skip the mutation.
    Invalid(RejectReason),
}

/// The Proof-Gate.
#[derive(Clone)]
pub struct ProofGate {
    verifier: Arc<dyn ProofVerifier>,
}

impl ProofGate {
    /// Create a gate over the given verification capability.
    pub fn new(verifier: Arc<dyn ProofVerifier>) -> Self {
        Self { verifier }
    }

    /// Check the proof referenced by `(epoch, proof_index)`.
    ///
    /// A missing proof row is a local-consistency error and raised: the
    /// referencing event can never precede its proof event in ledger order.
    /// Every other failure is an expected-invalid outcome.
    pub async fn check(
        &self,
        conn: &mut SqliteConnection,
        epoch: u64,
        proof_index: u64,
    ) -> Result<GateOutcome, SyncError> {
        let Some(proof) = Storage::get_proof(&mut *conn, epoch, proof_index).await? else {
            return Err(SyncError::MissingProof { epoch, proof_index });
        };

        if proof.valid == Some(false) {
            return Ok(GateOutcome::Invalid(RejectReason::CachedInvalid));
        }

        let signals = match ProofSignals::decode(proof.kind, &proof.public_signals) {
            Ok(signals) => signals,
            Err(e) => {
                warn!(epoch, proof_index, error = %e, "recorded proof has undecodable signals");
                return Ok(GateOutcome::Invalid(RejectReason::MalformedSignals));
            }
        };

        if signals.epoch() != epoch {
            return Ok(GateOutcome::Invalid(RejectReason::EpochMismatch));
        }

        let valid = self
            .verifier
            .verify(proof.kind, &proof.public_signals, &proof.proof)
            .await?;
        if !valid {
            return Ok(GateOutcome::Invalid(RejectReason::VerificationFailed));
        }

        // Cryptographic validity alone is not enough: the claimed root must
        // have been announced for this epoch.
        if !Storage::epoch_root_exists(&mut *conn, epoch, &signals.state_root()).await? {
            Storage::set_proof_validity(&mut *conn, epoch, proof_index, false).await?;
            return Ok(GateOutcome::Invalid(RejectReason::StaleStateRoot));
        }

        Storage::set_proof_validity(&mut *conn, epoch, proof_index, true).await?;

        Ok(GateOutcome::Valid(signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_vectors::reputation_signals;
    use crate::storage::ProofRow;
    use crate::verifier::testing::StaticVerifier;
    use alloy::primitives::B256;
    use murmur_core::ProofKind;
    use tempfile::NamedTempFile;

    async fn setup_storage() -> (Storage, NamedTempFile) {
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
        storage.run_migrations().await.unwrap();
        (storage, temp_db)
    }

    fn gate(valid: bool) -> ProofGate {
        ProofGate::new(Arc::new(StaticVerifier { valid }))
    }

    async fn seed_proof(storage: &Storage, epoch: u64, index: u64, state_root: B256) {
        let mut conn = storage.pool().acquire().await.unwrap();
        let row = ProofRow {
            epoch,
            proof_index: index,
            kind: ProofKind::Reputation,
            public_signals: reputation_signals(&[11], epoch, 500, state_root, 5),
            proof: vec![0x01, 0x02],
            state_root,
            valid: None,
            created_at: 1700000000,
        };
        Storage::insert_proof(&mut conn, &row).await.unwrap();
    }

    #[tokio::test]
    async fn test_valid_proof_passes_and_is_cached() {
        let (storage, _temp_db) = setup_storage().await;
        let root = B256::repeat_byte(0x33);
        seed_proof(&storage, 3, 7, root).await;

        let mut conn = storage.pool().acquire().await.unwrap();
        Storage::insert_epoch_root(&mut conn, 3, &root).await.unwrap();

        let outcome = gate(true).check(&mut conn, 3, 7).await.unwrap();
        assert!(matches!(outcome, GateOutcome::Valid(_)));

        let proof = Storage::get_proof(&mut conn, 3, 7).await.unwrap().unwrap();
        assert_eq!(proof.valid, Some(true));

        storage.close().await;
    }

    #[tokio::test]
    async fn test_missing_proof_is_fatal() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.pool().acquire().await.unwrap();

        let err = gate(true).check(&mut conn, 3, 7).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingProof {
                epoch: 3,
                proof_index: 7
            }
        ));

        storage.close().await;
    }

    #[tokio::test]
    async fn test_verification_failure_skips_without_raising() {
        let (storage, _temp_db) = setup_storage().await;
        let root = B256::repeat_byte(0x33);
        seed_proof(&storage, 3, 7, root).await;

        let mut conn = storage.pool().acquire().await.unwrap();
        Storage::insert_epoch_root(&mut conn, 3, &root).await.unwrap();

        let outcome = gate(false).check(&mut conn, 3, 7).await.unwrap();
        assert_eq!(
            outcome,
            GateOutcome::Invalid(RejectReason::VerificationFailed)
        );

        // A plain verification failure is not cached as invalid.
        let proof = Storage::get_proof(&mut conn, 3, 7).await.unwrap().unwrap();
        assert_eq!(proof.valid, None);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_stale_root_marks_proof_invalid() {
        let (storage, _temp_db) = setup_storage().await;
        let root = B256::repeat_byte(0x33);
        seed_proof(&storage, 3, 7, root).await;

        // No root announced for epoch 3.
        let mut conn = storage.pool().acquire().await.unwrap();

        let outcome = gate(true).check(&mut conn, 3, 7).await.unwrap();
        assert_eq!(outcome, GateOutcome::Invalid(RejectReason::StaleStateRoot));

        let proof = Storage::get_proof(&mut conn, 3, 7).await.unwrap().unwrap();
        assert_eq!(proof.valid, Some(false));

        // The cached flag short-circuits the next check.
        let outcome = gate(true).check(&mut conn, 3, 7).await.unwrap();
        assert_eq!(outcome, GateOutcome::Invalid(RejectReason::CachedInvalid));

        storage.close().await;
    }

    #[tokio::test]
    async fn test_epoch_mismatch_is_rejected() {
        let (storage, _temp_db) = setup_storage().await;
        let root = B256::repeat_byte(0x33);

        // Signals claim epoch 4 but the proof is referenced under epoch 3.
        let mut conn = storage.pool().acquire().await.unwrap();
        let row = ProofRow {
            epoch: 3,
            proof_index: 1,
            kind: ProofKind::Reputation,
            public_signals: reputation_signals(&[11], 4, 500, root, 5),
            proof: vec![0x01],
            state_root: root,
            valid: None,
            created_at: 1700000000,
        };
        Storage::insert_proof(&mut conn, &row).await.unwrap();

        let outcome = gate(true).check(&mut conn, 3, 1).await.unwrap();
        assert_eq!(outcome, GateOutcome::Invalid(RejectReason::EpochMismatch));

        storage.close().await;
    }
}
