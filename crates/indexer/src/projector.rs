//! Idempotent projection of ledger events into mirror entities.
//!
//! One procedure per event family, all following the same skeleton: decode
//! (done upstream), resolve and gate the referenced proof, admit the spend
//! set, then upsert the primary entity keyed by transaction hash, refresh
//! denormalized counts, write the audit record and accumulate per-key
//! totals. Every step for one event runs on the caller's transaction and
//! commits or rolls back together.
//!
//! Skips are normal control flow. Raised errors abort the event's
//! transaction; the sync loop retries the batch from the same watermark.

use std::sync::Arc;

use alloy::primitives::B256;
use murmur_core::{ConfirmationStatus, ContentKind, RecordAction};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::listener::events::{
    AirdropEvent, CommentEvent, EventMeta, LedgerEvent, PostEvent, ProofSubmittedEvent,
    SignupEvent, StateRootEvent, VoteEvent,
};
use crate::nullifier::NullifierGuard;
use crate::proof_gate::{GateOutcome, ProofGate, RejectReason};
use crate::signals::{ProofSignals, ReputationSignals};
use crate::storage::{ContentRow, ProofRow, RecordRow, Storage, VoteRow};
use crate::verifier::ProofVerifier;

/// Result of projecting one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event's mutation was applied.
    Projected,
    /// The event was skipped as expected-invalid; the reason is logged.
    Skipped(RejectReason),
}

/// The Entity Projector.
#[derive(Clone)]
pub struct Projector {
    gate: ProofGate,
}

impl Projector {
    /// Create a projector over the given verification capability.
    pub fn new(verifier: Arc<dyn ProofVerifier>) -> Self {
        Self {
            gate: ProofGate::new(verifier),
        }
    }

    /// Project one decoded event onto the caller's transaction.
    pub async fn apply(
        &self,
        conn: &mut SqliteConnection,
        event: &LedgerEvent,
    ) -> Result<Applied, SyncError> {
        match event {
            LedgerEvent::Proof(ev) => self.record_proof(conn, ev).await,
            LedgerEvent::StateRoot(ev) => self.record_state_root(conn, ev).await,
            LedgerEvent::Signup(ev) => self.apply_grant(conn, GrantKind::Signup, ev.into()).await,
            LedgerEvent::Post(ev) => self.apply_post(conn, ev).await,
            LedgerEvent::Comment(ev) => self.apply_comment(conn, ev).await,
            LedgerEvent::Vote(ev) => self.apply_vote(conn, ev).await,
            LedgerEvent::Airdrop(ev) => {
                self.apply_grant(conn, GrantKind::Airdrop, ev.into()).await
            }
        }
    }

    /// Record a submitted proof for later reference.
    ///
    /// Signals are decoded eagerly to pin the claimed state root; a
    /// submission whose signals do not fit its own circuit layout is stored
    /// pre-marked invalid instead of wedging the batch.
    async fn record_proof(
        &self,
        conn: &mut SqliteConnection,
        ev: &ProofSubmittedEvent,
    ) -> Result<Applied, SyncError> {
        let (state_root, valid) = match ProofSignals::decode(ev.kind, &ev.public_signals) {
            Ok(signals) => (signals.state_root(), None),
            Err(e) => {
                warn!(
                    epoch = ev.epoch,
                    proof_index = ev.proof_index,
                    error = %e,
                    "submitted proof has malformed signals, storing as invalid"
                );
                (B256::ZERO, Some(false))
            }
        };

        Storage::insert_proof(
            &mut *conn,
            &ProofRow {
                epoch: ev.epoch,
                proof_index: ev.proof_index,
                kind: ev.kind,
                public_signals: ev.public_signals.clone(),
                proof: ev.proof.clone(),
                state_root,
                valid,
                created_at: chrono::Utc::now().timestamp(),
            },
        )
        .await?;

        debug!(epoch = ev.epoch, proof_index = ev.proof_index, kind = %ev.kind, "proof recorded");

        Ok(Applied::Projected)
    }

    /// Record an announced global-state-tree root.
    async fn record_state_root(
        &self,
        conn: &mut SqliteConnection,
        ev: &StateRootEvent,
    ) -> Result<Applied, SyncError> {
        Storage::insert_epoch_root(&mut *conn, ev.epoch, &ev.root).await?;
        Ok(Applied::Projected)
    }

    async fn apply_post(
        &self,
        conn: &mut SqliteConnection,
        ev: &PostEvent,
    ) -> Result<Applied, SyncError> {
        let rep = match self
            .gate_reputation(conn, ev.epoch, ev.proof_index, &ev.epoch_key, &ev.meta)
            .await?
        {
            Ok(rep) => rep,
            Err(skipped) => return Ok(skipped),
        };

        if !NullifierGuard::admit(&mut *conn, &rep.nullifiers, ev.epoch, &ev.meta.tx_hash).await? {
            return Ok(skip("post", &ev.meta, RejectReason::DuplicateNullifier));
        }

        let now = chrono::Utc::now().timestamp();

        Storage::upsert_content(
            &mut *conn,
            &ContentRow {
                tx_hash: ev.meta.tx_hash,
                kind: ContentKind::Post,
                epoch: ev.epoch,
                epoch_key: ev.epoch_key,
                content_hash: ev.content_hash,
                parent_tx_hash: None,
                min_rep: ev.min_rep,
                status: ConfirmationStatus::Confirmed,
                child_count: 0,
                block_number: Some(ev.meta.block_number),
                log_index: Some(ev.meta.log_index),
                updated_at: now,
            },
        )
        .await?;

        Storage::upsert_record(
            &mut *conn,
            &RecordRow {
                tx_hash: ev.meta.tx_hash,
                action: RecordAction::Post,
                epoch: ev.epoch,
                from_key: ev.epoch_key,
                to_key: ev.epoch_key,
                upvote: 0,
                downvote: rep.spend_amount,
                confirmed: true,
                created_at: now,
            },
        )
        .await?;

        Storage::accumulate_totals(&mut *conn, &ev.epoch_key, ev.epoch, rep.spend_amount, 0, 0)
            .await?;

        Ok(Applied::Projected)
    }

    async fn apply_comment(
        &self,
        conn: &mut SqliteConnection,
        ev: &CommentEvent,
    ) -> Result<Applied, SyncError> {
        let rep = match self
            .gate_reputation(conn, ev.epoch, ev.proof_index, &ev.epoch_key, &ev.meta)
            .await?
        {
            Ok(rep) => rep,
            Err(skipped) => return Ok(skipped),
        };

        if !NullifierGuard::admit(&mut *conn, &rep.nullifiers, ev.epoch, &ev.meta.tx_hash).await? {
            return Ok(skip("comment", &ev.meta, RejectReason::DuplicateNullifier));
        }

        let now = chrono::Utc::now().timestamp();

        Storage::upsert_content(
            &mut *conn,
            &ContentRow {
                tx_hash: ev.meta.tx_hash,
                kind: ContentKind::Comment,
                epoch: ev.epoch,
                epoch_key: ev.epoch_key,
                content_hash: ev.content_hash,
                parent_tx_hash: Some(ev.parent_tx_hash),
                min_rep: ev.min_rep,
                status: ConfirmationStatus::Confirmed,
                child_count: 0,
                block_number: Some(ev.meta.block_number),
                log_index: Some(ev.meta.log_index),
                updated_at: now,
            },
        )
        .await?;

        // The parent's child count is recomputed by counting in the same
        // transaction; an increment would double-count under redundant
        // delivery.
        let parent = Storage::get_content(&mut *conn, &ev.parent_tx_hash)
            .await?
            .ok_or(SyncError::MissingParent {
                tx_hash: ev.meta.tx_hash,
                parent: ev.parent_tx_hash,
            })?;
        let children = Storage::count_children(&mut *conn, &ev.parent_tx_hash).await?;
        Storage::set_child_count(&mut *conn, &parent.tx_hash, children).await?;

        Storage::upsert_record(
            &mut *conn,
            &RecordRow {
                tx_hash: ev.meta.tx_hash,
                action: RecordAction::Comment,
                epoch: ev.epoch,
                from_key: ev.epoch_key,
                to_key: ev.epoch_key,
                upvote: 0,
                downvote: rep.spend_amount,
                confirmed: true,
                created_at: now,
            },
        )
        .await?;

        Storage::accumulate_totals(&mut *conn, &ev.epoch_key, ev.epoch, rep.spend_amount, 0, 0)
            .await?;

        Ok(Applied::Projected)
    }

    async fn apply_vote(
        &self,
        conn: &mut SqliteConnection,
        ev: &VoteEvent,
    ) -> Result<Applied, SyncError> {
        let rep = match self
            .gate_reputation(conn, ev.epoch, ev.proof_index, &ev.voter_key, &ev.meta)
            .await?
        {
            Ok(rep) => rep,
            Err(skipped) => return Ok(skipped),
        };

        if !NullifierGuard::admit(&mut *conn, &rep.nullifiers, ev.epoch, &ev.meta.tx_hash).await? {
            return Ok(skip("vote", &ev.meta, RejectReason::DuplicateNullifier));
        }

        let now = chrono::Utc::now().timestamp();

        Storage::upsert_vote(
            &mut *conn,
            &VoteRow {
                tx_hash: ev.meta.tx_hash,
                epoch: ev.epoch,
                voter_key: ev.voter_key,
                receiver_key: ev.receiver_key,
                upvote: ev.upvote,
                downvote: ev.downvote,
                status: ConfirmationStatus::Confirmed,
                block_number: Some(ev.meta.block_number),
                log_index: Some(ev.meta.log_index),
                updated_at: now,
            },
        )
        .await?;

        Storage::upsert_record(
            &mut *conn,
            &RecordRow {
                tx_hash: ev.meta.tx_hash,
                action: RecordAction::Vote,
                epoch: ev.epoch,
                from_key: ev.voter_key,
                to_key: ev.receiver_key,
                upvote: ev.upvote,
                downvote: ev.downvote,
                confirmed: true,
                created_at: now,
            },
        )
        .await?;

        // Voter spends the sum of both magnitudes; the receiver's totals
        // take each side separately.
        Storage::accumulate_totals(
            &mut *conn,
            &ev.voter_key,
            ev.epoch,
            ev.upvote + ev.downvote,
            0,
            0,
        )
        .await?;
        Storage::accumulate_totals(
            &mut *conn,
            &ev.receiver_key,
            ev.epoch,
            0,
            ev.upvote,
            ev.downvote,
        )
        .await?;

        Ok(Applied::Projected)
    }

    /// Shared path for signup and airdrop grants.
    async fn apply_grant(
        &self,
        conn: &mut SqliteConnection,
        kind: GrantKind,
        ev: GrantEvent<'_>,
    ) -> Result<Applied, SyncError> {
        let family = kind.family();

        let signals = match self.gate.check(&mut *conn, ev.epoch, ev.proof_index).await? {
            GateOutcome::Valid(signals) => signals,
            GateOutcome::Invalid(reason) => return Ok(skip(family, ev.meta, reason)),
        };

        let ProofSignals::Signup(signup) = signals else {
            return Ok(skip(family, ev.meta, RejectReason::CircuitMismatch));
        };

        if signup.epoch_key != *ev.epoch_key {
            return Ok(skip(family, ev.meta, RejectReason::KeyMismatch));
        }

        // One grant per key per epoch, enforced through the same guard as
        // reputation spends.
        if !NullifierGuard::admit(
            &mut *conn,
            &[signup.grant_nullifier],
            ev.epoch,
            &ev.meta.tx_hash,
        )
        .await?
        {
            return Ok(skip(family, ev.meta, RejectReason::DuplicateNullifier));
        }

        let now = chrono::Utc::now().timestamp();

        Storage::upsert_record(
            &mut *conn,
            &RecordRow {
                tx_hash: ev.meta.tx_hash,
                action: kind.action(),
                epoch: ev.epoch,
                from_key: *ev.epoch_key,
                to_key: *ev.epoch_key,
                upvote: ev.amount,
                downvote: 0,
                confirmed: true,
                created_at: now,
            },
        )
        .await?;

        Storage::accumulate_totals(&mut *conn, ev.epoch_key, ev.epoch, 0, ev.amount, 0).await?;

        Ok(Applied::Projected)
    }

    /// Gate a reputation-spending reference and cross-check its binding.
    async fn gate_reputation(
        &self,
        conn: &mut SqliteConnection,
        epoch: u64,
        proof_index: u64,
        epoch_key: &murmur_core::EpochKey,
        meta: &EventMeta,
    ) -> Result<Result<ReputationSignals, Applied>, SyncError> {
        let signals = match self.gate.check(&mut *conn, epoch, proof_index).await? {
            GateOutcome::Valid(signals) => signals,
            GateOutcome::Invalid(reason) => return Ok(Err(skip("spend", meta, reason))),
        };

        let ProofSignals::Reputation(rep) = signals else {
            return Ok(Err(skip("spend", meta, RejectReason::CircuitMismatch)));
        };

        if rep.epoch_key != *epoch_key {
            return Ok(Err(skip("spend", meta, RejectReason::KeyMismatch)));
        }

        Ok(Ok(rep))
    }
}

#[derive(Clone, Copy)]
enum GrantKind {
    Signup,
    Airdrop,
}

impl GrantKind {
    fn family(&self) -> &'static str {
        match self {
            GrantKind::Signup => "signup",
            GrantKind::Airdrop => "airdrop",
        }
    }

    fn action(&self) -> RecordAction {
        match self {
            GrantKind::Signup => RecordAction::Signup,
            GrantKind::Airdrop => RecordAction::Airdrop,
        }
    }
}

/// Borrowed view shared by the two grant-shaped events.
struct GrantEvent<'a> {
    epoch: u64,
    epoch_key: &'a murmur_core::EpochKey,
    amount: u64,
    proof_index: u64,
    meta: &'a EventMeta,
}

impl<'a> From<&'a SignupEvent> for GrantEvent<'a> {
    fn from(ev: &'a SignupEvent) -> Self {
        Self {
            epoch: ev.epoch,
            epoch_key: &ev.epoch_key,
            amount: ev.amount,
            proof_index: ev.proof_index,
            meta: &ev.meta,
        }
    }
}

impl<'a> From<&'a AirdropEvent> for GrantEvent<'a> {
    fn from(ev: &'a AirdropEvent) -> Self {
        Self {
            epoch: ev.epoch,
            epoch_key: &ev.epoch_key,
            amount: ev.amount,
            proof_index: ev.proof_index,
            meta: &ev.meta,
        }
    }
}

fn skip(family: &'static str, meta: &EventMeta, reason: RejectReason) -> Applied {
    warn!(family, tx = %meta.tx_hash, block = meta.block_number, %reason, "skipping event");
    Applied::Skipped(reason)
}
