//! Ledger event listening.
//!
//! This module provides:
//! - Event type definitions and eager decoding for both contracts
//! - RPC provider wrapper merging the two event sources
//! - Sync engine for historical and live block processing

pub mod events;
pub mod provider;
pub mod sync;

pub use events::LedgerEvent;
pub use provider::RpcProvider;
pub use sync::SyncEngine;
