//! Database types for the mirror storage layer.

use alloy::primitives::{B256, U256};
use murmur_core::{
    ConfirmationStatus, ContentHash, ContentKind, EpochKey, ProofKind, RecordAction,
};

/// A mirrored post or comment, keyed by ledger transaction hash.
///
/// At most one row exists per transaction hash. A pending row written
/// optimistically by the submission path is updated in place when the
/// confirming event arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRow {
    /// Ledger transaction hash (primary key).
    pub tx_hash: B256,

    /// Post or comment.
    pub kind: ContentKind,

    /// Epoch the content was submitted in.
    pub epoch: u64,

    /// Epoch-scoped pseudonymous author key.
    pub epoch_key: EpochKey,

    /// Commitment to the content body.
    pub content_hash: ContentHash,

    /// Parent post transaction hash (comments only).
    pub parent_tx_hash: Option<B256>,

    /// Minimum reputation the author proved, if any.
    pub min_rep: Option<u64>,

    /// Pending (optimistic) or confirmed (seen on the ledger).
    pub status: ConfirmationStatus,

    /// Denormalized number of direct comments. Recomputed by counting,
    /// never incremented.
    pub child_count: u64,

    /// Block the confirming event landed in.
    pub block_number: Option<u64>,

    /// Log index of the confirming event.
    pub log_index: Option<u64>,

    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

/// A mirrored vote, keyed by ledger transaction hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRow {
    /// Ledger transaction hash (primary key).
    pub tx_hash: B256,

    /// Epoch the vote was cast in.
    pub epoch: u64,

    /// Voter's epoch key.
    pub voter_key: EpochKey,

    /// Receiver's epoch key.
    pub receiver_key: EpochKey,

    /// Positive magnitude.
    pub upvote: u64,

    /// Negative magnitude.
    pub downvote: u64,

    /// Pending or confirmed.
    pub status: ConfirmationStatus,

    /// Block the confirming event landed in.
    pub block_number: Option<u64>,

    /// Log index of the confirming event.
    pub log_index: Option<u64>,

    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

/// An audit ledger entry for a value-transferring action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    /// Ledger transaction hash (primary key).
    pub tx_hash: B256,

    /// What moved the reputation.
    pub action: RecordAction,

    /// Epoch of the action.
    pub epoch: u64,

    /// Spending key.
    pub from_key: EpochKey,

    /// Receiving key (equals `from_key` for self-directed actions).
    pub to_key: EpochKey,

    /// Positive magnitude.
    pub upvote: u64,

    /// Negative magnitude.
    pub downvote: u64,

    /// Optimistic rows carry `false` until the chain confirms them.
    pub confirmed: bool,

    /// Unix timestamp of the write.
    pub created_at: i64,
}

/// Running reputation totals for one key within one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpkTotals {
    /// The pseudonymous key.
    pub epoch_key: EpochKey,

    /// The epoch the totals are scoped to.
    pub epoch: u64,

    /// Reputation spent by this key.
    pub spent: u64,

    /// Positive reputation received.
    pub pos_received: u64,

    /// Negative reputation received.
    pub neg_received: u64,
}

/// A proof recorded from the base protocol contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRow {
    /// Epoch the proof was submitted in.
    pub epoch: u64,

    /// Proof index within the epoch (reference key).
    pub proof_index: u64,

    /// Circuit family.
    pub kind: ProofKind,

    /// Raw public-signal vector.
    pub public_signals: Vec<U256>,

    /// Opaque proof blob.
    pub proof: Vec<u8>,

    /// Global-state-tree root the proof claims.
    pub state_root: B256,

    /// Cached verification outcome. `None` until first checked.
    pub valid: Option<bool>,

    /// Unix timestamp of the write.
    pub created_at: i64,
}

/// Sync state record (singleton).
///
/// Tracks the synchronizer's progress through the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    /// Last fully processed block number.
    pub last_block_number: u64,

    /// Chain ID (for safety).
    pub chain_id: u64,

    /// Unix timestamp of last update.
    pub updated_at: i64,
}
