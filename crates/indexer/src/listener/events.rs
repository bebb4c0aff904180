//! Event type definitions for the AnonProtocol and MurmurBoard contracts.
//!
//! Raw logs are decoded eagerly into typed events here; malformed payloads
//! for known topics never reach the projector. Optional wire fields (a zero
//! `minRep` means "not proved") are normalized into `Option` in this one
//! place so downstream logic never re-checks for absence.

use alloy::primitives::{B256, U256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use murmur_core::{ContentHash, CoreError, EpochKey, ProofKind};

use crate::dispatch::EventKind;
use crate::error::SyncError;

// Base protocol events (AnonProtocol contract)
sol! {
    /// A zero-knowledge proof recorded on-chain, referenced later by index.
    #[derive(Debug, PartialEq, Eq)]
    event ProofSubmitted(
        uint256 indexed epoch,
        uint256 indexed proofIndex,
        uint8 kind,
        uint256[] publicSignals,
        bytes proof
    );

    /// A global-state-tree root announced for an epoch.
    #[derive(Debug, PartialEq, Eq)]
    event StateRootCommitted(uint256 indexed epoch, uint256 root);

    /// A new identity joined; grants the initial reputation airdrop.
    #[derive(Debug, PartialEq, Eq)]
    event UserSignedUp(
        uint256 indexed epoch,
        uint256 indexed epochKey,
        uint256 airdropAmount,
        uint256 proofIndex
    );
}

// Board extension events (MurmurBoard contract)
sol! {
    /// A post submission (content hash only; bodies live off-chain).
    #[derive(Debug, PartialEq, Eq)]
    event PostSubmitted(
        uint256 indexed epoch,
        uint256 indexed epochKey,
        bytes32 contentHash,
        uint256 proofIndex,
        uint256 minRep
    );

    /// A comment attached to an existing post.
    #[derive(Debug, PartialEq, Eq)]
    event CommentSubmitted(
        uint256 indexed epoch,
        bytes32 indexed postId,
        uint256 epochKey,
        bytes32 contentHash,
        uint256 proofIndex,
        uint256 minRep
    );

    /// A reputation vote from one epoch key to another.
    #[derive(Debug, PartialEq, Eq)]
    event VoteSubmitted(
        uint256 indexed epoch,
        uint256 indexed fromEpochKey,
        uint256 indexed toEpochKey,
        uint256 upvoteValue,
        uint256 downvoteValue,
        uint256 proofIndex
    );

    /// A per-epoch reputation airdrop claim.
    #[derive(Debug, PartialEq, Eq)]
    event AirdropSubmitted(
        uint256 indexed epoch,
        uint256 indexed epochKey,
        uint256 amount,
        uint256 proofIndex
    );
}

/// Ledger coordinates shared by every decoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMeta {
    /// Block number where the event occurred.
    pub block_number: u64,

    /// Log index within the block.
    pub log_index: u64,

    /// Transaction hash.
    pub tx_hash: B256,
}

/// Decoded proof submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofSubmittedEvent {
    /// Epoch the proof belongs to.
    pub epoch: u64,
    /// Reference index within the epoch.
    pub proof_index: u64,
    /// Circuit family.
    pub kind: ProofKind,
    /// Raw public-signal vector.
    pub public_signals: Vec<U256>,
    /// Opaque proof blob.
    pub proof: Vec<u8>,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// Decoded state-root announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRootEvent {
    /// Epoch the root belongs to.
    pub epoch: u64,
    /// The announced root.
    pub root: B256,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// Decoded signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupEvent {
    /// Epoch of the signup.
    pub epoch: u64,
    /// The new identity's epoch key.
    pub epoch_key: EpochKey,
    /// Initial grant amount.
    pub amount: u64,
    /// Referenced signup proof.
    pub proof_index: u64,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// Decoded post submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEvent {
    /// Epoch of the submission.
    pub epoch: u64,
    /// Author's epoch key.
    pub epoch_key: EpochKey,
    /// Commitment to the body.
    pub content_hash: ContentHash,
    /// Referenced reputation proof.
    pub proof_index: u64,
    /// Proved minimum reputation, when claimed.
    pub min_rep: Option<u64>,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// Decoded comment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    /// Epoch of the submission.
    pub epoch: u64,
    /// Transaction hash of the parent post.
    pub parent_tx_hash: B256,
    /// Author's epoch key.
    pub epoch_key: EpochKey,
    /// Commitment to the body.
    pub content_hash: ContentHash,
    /// Referenced reputation proof.
    pub proof_index: u64,
    /// Proved minimum reputation, when claimed.
    pub min_rep: Option<u64>,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// Decoded vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEvent {
    /// Epoch of the vote.
    pub epoch: u64,
    /// Voter's epoch key.
    pub voter_key: EpochKey,
    /// Receiver's epoch key.
    pub receiver_key: EpochKey,
    /// Positive magnitude.
    pub upvote: u64,
    /// Negative magnitude.
    pub downvote: u64,
    /// Referenced reputation proof.
    pub proof_index: u64,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// Decoded airdrop claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropEvent {
    /// Epoch of the claim.
    pub epoch: u64,
    /// Claiming epoch key.
    pub epoch_key: EpochKey,
    /// Grant amount.
    pub amount: u64,
    /// Referenced signup proof.
    pub proof_index: u64,
    /// Ledger coordinates.
    pub meta: EventMeta,
}

/// A fully decoded ledger event, ready for projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// Proof submission (base protocol).
    Proof(ProofSubmittedEvent),
    /// State-root announcement (base protocol).
    StateRoot(StateRootEvent),
    /// Signup (base protocol).
    Signup(SignupEvent),
    /// Post submission (board).
    Post(PostEvent),
    /// Comment submission (board).
    Comment(CommentEvent),
    /// Vote (board).
    Vote(VoteEvent),
    /// Airdrop claim (board).
    Airdrop(AirdropEvent),
}

impl LedgerEvent {
    /// Decode a raw log whose topic was classified as `kind`.
    ///
    /// A known topic that fails to decode is schema drift and raised as an
    /// error rather than skipped.
    pub fn decode(kind: EventKind, log: &Log) -> Result<Self, SyncError> {
        let meta = meta_from_log(log)?;

        match kind {
            EventKind::ProofSubmitted => {
                let ev = ProofSubmitted::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("ProofSubmitted", meta.tx_hash, e))?;
                Ok(LedgerEvent::Proof(ProofSubmittedEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    proof_index: as_u64(ev.proofIndex, "proofIndex")?,
                    kind: ProofKind::from_tag(ev.kind)?,
                    public_signals: ev.publicSignals.clone(),
                    proof: ev.proof.to_vec(),
                    meta,
                }))
            }
            EventKind::StateRootCommitted => {
                let ev = StateRootCommitted::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("StateRootCommitted", meta.tx_hash, e))?;
                Ok(LedgerEvent::StateRoot(StateRootEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    root: B256::from(ev.root),
                    meta,
                }))
            }
            EventKind::UserSignedUp => {
                let ev = UserSignedUp::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("UserSignedUp", meta.tx_hash, e))?;
                Ok(LedgerEvent::Signup(SignupEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    epoch_key: EpochKey::from(ev.epochKey),
                    amount: as_u64(ev.airdropAmount, "airdropAmount")?,
                    proof_index: as_u64(ev.proofIndex, "proofIndex")?,
                    meta,
                }))
            }
            EventKind::PostSubmitted => {
                let ev = PostSubmitted::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("PostSubmitted", meta.tx_hash, e))?;
                Ok(LedgerEvent::Post(PostEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    epoch_key: EpochKey::from(ev.epochKey),
                    content_hash: ContentHash::from(B256::from(ev.contentHash)),
                    proof_index: as_u64(ev.proofIndex, "proofIndex")?,
                    min_rep: normalize_min_rep(ev.minRep)?,
                    meta,
                }))
            }
            EventKind::CommentSubmitted => {
                let ev = CommentSubmitted::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("CommentSubmitted", meta.tx_hash, e))?;
                Ok(LedgerEvent::Comment(CommentEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    parent_tx_hash: B256::from(ev.postId),
                    epoch_key: EpochKey::from(ev.epochKey),
                    content_hash: ContentHash::from(B256::from(ev.contentHash)),
                    proof_index: as_u64(ev.proofIndex, "proofIndex")?,
                    min_rep: normalize_min_rep(ev.minRep)?,
                    meta,
                }))
            }
            EventKind::VoteSubmitted => {
                let ev = VoteSubmitted::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("VoteSubmitted", meta.tx_hash, e))?;
                Ok(LedgerEvent::Vote(VoteEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    voter_key: EpochKey::from(ev.fromEpochKey),
                    receiver_key: EpochKey::from(ev.toEpochKey),
                    upvote: as_u64(ev.upvoteValue, "upvoteValue")?,
                    downvote: as_u64(ev.downvoteValue, "downvoteValue")?,
                    proof_index: as_u64(ev.proofIndex, "proofIndex")?,
                    meta,
                }))
            }
            EventKind::AirdropSubmitted => {
                let ev = AirdropSubmitted::decode_log(log.as_ref(), true)
                    .map_err(|e| malformed("AirdropSubmitted", meta.tx_hash, e))?;
                Ok(LedgerEvent::Airdrop(AirdropEvent {
                    epoch: as_u64(ev.epoch, "epoch")?,
                    epoch_key: EpochKey::from(ev.epochKey),
                    amount: as_u64(ev.amount, "amount")?,
                    proof_index: as_u64(ev.proofIndex, "proofIndex")?,
                    meta,
                }))
            }
        }
    }

    /// Ledger coordinates of the underlying log.
    pub fn meta(&self) -> &EventMeta {
        match self {
            LedgerEvent::Proof(ev) => &ev.meta,
            LedgerEvent::StateRoot(ev) => &ev.meta,
            LedgerEvent::Signup(ev) => &ev.meta,
            LedgerEvent::Post(ev) => &ev.meta,
            LedgerEvent::Comment(ev) => &ev.meta,
            LedgerEvent::Vote(ev) => &ev.meta,
            LedgerEvent::Airdrop(ev) => &ev.meta,
        }
    }

    /// Family name for diagnostics.
    pub fn family(&self) -> &'static str {
        match self {
            LedgerEvent::Proof(_) => "proof",
            LedgerEvent::StateRoot(_) => "state_root",
            LedgerEvent::Signup(_) => "signup",
            LedgerEvent::Post(_) => "post",
            LedgerEvent::Comment(_) => "comment",
            LedgerEvent::Vote(_) => "vote",
            LedgerEvent::Airdrop(_) => "airdrop",
        }
    }
}

fn meta_from_log(log: &Log) -> Result<EventMeta, SyncError> {
    let block_number = log
        .block_number
        .ok_or(SyncError::IncompleteLog("block_number"))?;
    let log_index = log.log_index.ok_or(SyncError::IncompleteLog("log_index"))?;
    let tx_hash = log
        .transaction_hash
        .ok_or(SyncError::IncompleteLog("transaction_hash"))?;

    Ok(EventMeta {
        block_number,
        log_index,
        tx_hash,
    })
}

fn malformed<E: std::fmt::Display>(event: &'static str, tx_hash: B256, e: E) -> SyncError {
    SyncError::MalformedEvent {
        event,
        tx_hash,
        reason: e.to_string(),
    }
}

fn as_u64(value: U256, what: &'static str) -> Result<u64, SyncError> {
    u64::try_from(value).map_err(|_| SyncError::Core(CoreError::AmountOverflow(what)))
}

fn normalize_min_rep(value: U256) -> Result<Option<u64>, SyncError> {
    let v = as_u64(value, "minRep")?;
    Ok((v != 0).then_some(v))
}
