//! Canonical constants for Murmur.
//!
//! These values MUST match the circuits and the MurmurBoard/AnonProtocol
//! contracts exactly; the synchronizer decodes public-signal vectors by
//! position using the layouts below.

/// Number of nullifier slots in the reputation circuit's signal vector.
///
/// Slots a prover does not need are filled with zero and skipped on ingest.
pub const MAX_REP_NULLIFIERS: usize = 10;

/// Reputation to spend when submitting a post.
pub const DEFAULT_POST_COST: u64 = 5;

/// Reputation to spend when submitting a comment.
pub const DEFAULT_COMMENT_COST: u64 = 3;

/// Reputation granted by signup and per-epoch airdrops.
pub const DEFAULT_AIRDROP_AMOUNT: u64 = 30;

// Reputation circuit public-signal layout.
// [0 .. MAX_REP_NULLIFIERS): nullifier region
// then epoch, epoch key, global state tree root, spend amount, min rep.

/// Index of the epoch signal in the reputation circuit.
pub const REP_SIGNAL_EPOCH: usize = MAX_REP_NULLIFIERS;
/// Index of the epoch-key signal in the reputation circuit.
pub const REP_SIGNAL_EPOCH_KEY: usize = MAX_REP_NULLIFIERS + 1;
/// Index of the global-state-tree-root signal in the reputation circuit.
pub const REP_SIGNAL_STATE_ROOT: usize = MAX_REP_NULLIFIERS + 2;
/// Index of the spend-amount signal in the reputation circuit.
pub const REP_SIGNAL_SPEND: usize = MAX_REP_NULLIFIERS + 3;
/// Index of the proved-minimum-reputation signal in the reputation circuit.
pub const REP_SIGNAL_MIN_REP: usize = MAX_REP_NULLIFIERS + 4;
/// Total signal count of the reputation circuit.
pub const REP_SIGNAL_COUNT: usize = MAX_REP_NULLIFIERS + 5;

// Epoch-key circuit public-signal layout.

/// Index of the global-state-tree-root signal in the epoch-key circuit.
pub const EPK_SIGNAL_STATE_ROOT: usize = 0;
/// Index of the epoch signal in the epoch-key circuit.
pub const EPK_SIGNAL_EPOCH: usize = 1;
/// Index of the epoch-key signal in the epoch-key circuit.
pub const EPK_SIGNAL_EPOCH_KEY: usize = 2;
/// Total signal count of the epoch-key circuit.
pub const EPK_SIGNAL_COUNT: usize = 3;

// Signup circuit public-signal layout.

/// Index of the global-state-tree-root signal in the signup circuit.
pub const SIGNUP_SIGNAL_STATE_ROOT: usize = 0;
/// Index of the epoch signal in the signup circuit.
pub const SIGNUP_SIGNAL_EPOCH: usize = 1;
/// Index of the epoch-key signal in the signup circuit.
pub const SIGNUP_SIGNAL_EPOCH_KEY: usize = 2;
/// Index of the epoch-scoped grant nullifier in the signup circuit.
pub const SIGNUP_SIGNAL_GRANT_NULLIFIER: usize = 3;
/// Total signal count of the signup circuit.
pub const SIGNUP_SIGNAL_COUNT: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reputation_layout_is_contiguous() {
        assert_eq!(REP_SIGNAL_EPOCH, MAX_REP_NULLIFIERS);
        assert_eq!(REP_SIGNAL_MIN_REP + 1, REP_SIGNAL_COUNT);
    }

    #[test]
    fn test_signup_layout_is_contiguous() {
        assert_eq!(SIGNUP_SIGNAL_GRANT_NULLIFIER + 1, SIGNUP_SIGNAL_COUNT);
    }
}
