//! Typed errors for the synchronizer.
//!
//! The fatal taxonomy lives here: local-inconsistency conditions abort the
//! current batch and are retried from the same watermark on the next poll
//! cycle. Expected-invalid outcomes (failed verification, duplicates, stale
//! roots) are not errors; they are `Applied::Skipped` results.

use alloy::primitives::B256;
use murmur_core::CoreError;
use thiserror::Error;

/// Errors raised while projecting ledger events into the mirror.
#[derive(Error, Debug)]
pub enum SyncError {
    /// An event referenced a proof that was never recorded. Proof-emitting
    /// events always precede their consumers in ledger order, so this
    /// indicates out-of-order delivery or a missing prerequisite batch.
    #[error("referenced proof ({epoch}, {proof_index}) is not recorded")]
    MissingProof {
        /// Epoch the reference names.
        epoch: u64,
        /// Proof index the reference names.
        proof_index: u64,
    },

    /// A comment arrived for a parent the mirror has never seen.
    #[error("comment {tx_hash} references missing parent {parent}")]
    MissingParent {
        /// Transaction hash of the comment event.
        tx_hash: B256,
        /// Parent transaction hash the comment names.
        parent: B256,
    },

    /// A log with a known topic failed to decode (schema drift).
    #[error("malformed {event} event in tx {tx_hash}: {reason}")]
    MalformedEvent {
        /// Event family being decoded.
        event: &'static str,
        /// Transaction hash of the offending log.
        tx_hash: B256,
        /// What went wrong.
        reason: String,
    },

    /// A fetched log is missing block coordinates.
    #[error("log missing {0}")]
    IncompleteLog(&'static str),

    /// Domain-level validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Mirror storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The external proof verifier could not be reached or answered
    /// nonsense. Distinct from a proof failing verification.
    #[error("proof verifier error: {0}")]
    Verifier(String),
}
