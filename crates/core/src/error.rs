//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Unknown proof kind tag emitted by the ledger.
    #[error("Unknown proof kind tag: {0}")]
    InvalidProofKind(u8),

    /// Unknown content kind string in the mirror.
    #[error("Unknown content kind: {0}")]
    InvalidContentKind(String),

    /// Unknown confirmation status string in the mirror.
    #[error("Unknown confirmation status: {0}")]
    InvalidStatus(String),

    /// Unknown ledger record action string in the mirror.
    #[error("Unknown record action: {0}")]
    InvalidAction(String),

    /// Public-signal vector does not match the circuit layout.
    #[error("Invalid {circuit} signal layout: expected {expected} signals, got {got}")]
    SignalLayout {
        /// Circuit whose layout was violated.
        circuit: &'static str,
        /// Number of signals the layout requires.
        expected: usize,
        /// Number of signals actually present.
        got: usize,
    },

    /// A ledger amount does not fit the mirror's 64-bit columns.
    #[error("Amount out of range for {0}")]
    AmountOverflow(&'static str),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
