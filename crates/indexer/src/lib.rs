//! Ledger synchronization for the Murmur board.
//!
//! This crate mirrors an append-only, proof-gated event ledger (the
//! AnonProtocol base contract plus the MurmurBoard extension contract)
//! into a locally queryable SQLite store. Downstream consumers read only
//! the mirror, never the ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  murmur-indexer (this crate)                │
//! │                                             │
//! │  ┌──────────────┐                           │
//! │  │  Sync Loop   │ ← Ethereum RPC            │
//! │  │ (tokio task) │   AnonProtocol + Board    │
//! │  └──────┬───────┘                           │
//! │         │ ordered events                    │
//! │  ┌──────▼────────┐                          │
//! │  │ TopicRegistry │  unknown topics ignored  │
//! │  └──────┬────────┘                          │
//! │         │ per event, one transaction        │
//! │  ┌──────▼───────┐   ┌────────────────┐      │
//! │  │  Proof-Gate  │ → │ Proof Verifier │      │
//! │  └──────┬───────┘   │ (prover svc)   │      │
//! │         │           └────────────────┘      │
//! │  ┌──────▼─────────┐                         │
//! │  │ NullifierGuard │  double-spend rejection │
//! │  └──────┬─────────┘                         │
//! │         │                                   │
//! │  ┌──────▼──────┐                            │
//! │  │  Projector  │ ← SQLite mirror            │
//! │  │ (idempotent │   content/votes/records/   │
//! │  │  upserts)   │   totals/nullifiers        │
//! │  └─────────────┘                            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Separation of Concerns
//!
//! - **listener**: fetches and orders raw logs, drives the poll loop
//! - **dispatch**: topic0 → handler-family classification
//! - **proof_gate / nullifier**: admission control before any mutation
//! - **projector**: idempotent entity projection
//! - **storage**: the scoped-transaction mirror facade
//!
//! The zero-knowledge proof system itself is an external collaborator
//! behind the [`verifier::ProofVerifier`] trait; circuits are never
//! reimplemented here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod listener;
pub mod nullifier;
pub mod proof_gate;
pub mod projector;
pub mod signals;
pub mod storage;
pub mod verifier;

pub use error::SyncError;
