//! # Murmur Core
//!
//! Core types, constants and hashing utilities for the Murmur board: an
//! anonymous, reputation-gated message board whose source of truth is an
//! append-only smart-contract event ledger.
//!
//! This crate provides the fundamental building blocks shared by the
//! synchronizer and any future read-side components, keeping data types and
//! proof-signal layouts consistent with the on-chain contracts.
//!
//! ## Features
//!
//! - **Ethereum Types**: Uses Alloy primitives for B256, U256, and keccak256
//! - **Domain Types**: EpochKey, Nullifier, ContentHash plus the string-keyed
//!   enums persisted in the mirror
//! - **Constants**: proof kind tags, public-signal layouts, default costs
//! - **Hashing**: keccak256 utilities for content commitments

#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod hashing;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use error::{CoreError, Result};
pub use hashing::{hash_content, keccak256};
pub use types::*;

// Re-export Alloy primitives for convenience
pub use alloy_primitives::{B256, U256};
