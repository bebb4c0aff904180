//! Public-signal decoding per circuit.
//!
//! Signal vectors are positional; the layouts live in `murmur_core::constants`
//! and must match the circuits exactly. Decoding is eager and validated so
//! the gate and the projector work with typed fields, never raw offsets.

use alloy::primitives::{B256, U256};
use murmur_core::{
    CoreError, EpochKey, Nullifier, EPK_SIGNAL_COUNT, EPK_SIGNAL_EPOCH, EPK_SIGNAL_EPOCH_KEY,
    EPK_SIGNAL_STATE_ROOT, MAX_REP_NULLIFIERS, REP_SIGNAL_COUNT, REP_SIGNAL_EPOCH,
    REP_SIGNAL_EPOCH_KEY, REP_SIGNAL_MIN_REP, REP_SIGNAL_SPEND, REP_SIGNAL_STATE_ROOT,
    SIGNUP_SIGNAL_COUNT, SIGNUP_SIGNAL_EPOCH, SIGNUP_SIGNAL_EPOCH_KEY,
    SIGNUP_SIGNAL_GRANT_NULLIFIER, SIGNUP_SIGNAL_STATE_ROOT,
};
use murmur_core::ProofKind;

/// Decoded epoch-key circuit signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochKeySignals {
    /// Claimed global-state-tree root.
    pub state_root: B256,
    /// Epoch the key is scoped to.
    pub epoch: u64,
    /// The proven epoch key.
    pub epoch_key: EpochKey,
}

impl EpochKeySignals {
    /// Decode from a raw signal vector.
    pub fn decode(signals: &[U256]) -> Result<Self, CoreError> {
        expect_len("epoch_key", signals, EPK_SIGNAL_COUNT)?;

        Ok(Self {
            state_root: B256::from(signals[EPK_SIGNAL_STATE_ROOT]),
            epoch: as_u64(signals[EPK_SIGNAL_EPOCH], "epoch")?,
            epoch_key: EpochKey::from(signals[EPK_SIGNAL_EPOCH_KEY]),
        })
    }
}

/// Decoded reputation circuit signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationSignals {
    /// Nullifier region, zeros included (unused slots).
    pub nullifiers: Vec<Nullifier>,
    /// Epoch the spend is scoped to.
    pub epoch: u64,
    /// The spending epoch key.
    pub epoch_key: EpochKey,
    /// Claimed global-state-tree root.
    pub state_root: B256,
    /// Amount of reputation this proof spends.
    pub spend_amount: u64,
    /// Proved minimum reputation (zero = not claimed).
    pub min_rep: u64,
}

impl ReputationSignals {
    /// Decode from a raw signal vector.
    pub fn decode(signals: &[U256]) -> Result<Self, CoreError> {
        expect_len("reputation", signals, REP_SIGNAL_COUNT)?;

        let nullifiers = signals[..MAX_REP_NULLIFIERS]
            .iter()
            .map(|v| Nullifier::from(*v))
            .collect();

        Ok(Self {
            nullifiers,
            epoch: as_u64(signals[REP_SIGNAL_EPOCH], "epoch")?,
            epoch_key: EpochKey::from(signals[REP_SIGNAL_EPOCH_KEY]),
            state_root: B256::from(signals[REP_SIGNAL_STATE_ROOT]),
            spend_amount: as_u64(signals[REP_SIGNAL_SPEND], "spend_amount")?,
            min_rep: as_u64(signals[REP_SIGNAL_MIN_REP], "min_rep")?,
        })
    }
}

/// Decoded signup circuit signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupSignals {
    /// Claimed global-state-tree root.
    pub state_root: B256,
    /// Epoch of the signup.
    pub epoch: u64,
    /// The proven epoch key.
    pub epoch_key: EpochKey,
    /// Epoch-scoped grant nullifier (one grant per key per epoch).
    pub grant_nullifier: Nullifier,
}

impl SignupSignals {
    /// Decode from a raw signal vector.
    pub fn decode(signals: &[U256]) -> Result<Self, CoreError> {
        expect_len("signup", signals, SIGNUP_SIGNAL_COUNT)?;

        Ok(Self {
            state_root: B256::from(signals[SIGNUP_SIGNAL_STATE_ROOT]),
            epoch: as_u64(signals[SIGNUP_SIGNAL_EPOCH], "epoch")?,
            epoch_key: EpochKey::from(signals[SIGNUP_SIGNAL_EPOCH_KEY]),
            grant_nullifier: Nullifier::from(signals[SIGNUP_SIGNAL_GRANT_NULLIFIER]),
        })
    }
}

/// Signals decoded according to a proof's recorded kind tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofSignals {
    /// Epoch-key circuit.
    EpochKey(EpochKeySignals),
    /// Reputation circuit.
    Reputation(ReputationSignals),
    /// Signup circuit.
    Signup(SignupSignals),
}

impl ProofSignals {
    /// Decode a raw signal vector for the given circuit.
    pub fn decode(kind: ProofKind, signals: &[U256]) -> Result<Self, CoreError> {
        match kind {
            ProofKind::EpochKey => EpochKeySignals::decode(signals).map(ProofSignals::EpochKey),
            ProofKind::Reputation => {
                ReputationSignals::decode(signals).map(ProofSignals::Reputation)
            }
            ProofKind::Signup => SignupSignals::decode(signals).map(ProofSignals::Signup),
        }
    }

    /// Epoch the signals are scoped to.
    pub fn epoch(&self) -> u64 {
        match self {
            ProofSignals::EpochKey(s) => s.epoch,
            ProofSignals::Reputation(s) => s.epoch,
            ProofSignals::Signup(s) => s.epoch,
        }
    }

    /// Epoch key the signals bind to.
    pub fn epoch_key(&self) -> EpochKey {
        match self {
            ProofSignals::EpochKey(s) => s.epoch_key,
            ProofSignals::Reputation(s) => s.epoch_key,
            ProofSignals::Signup(s) => s.epoch_key,
        }
    }

    /// Claimed global-state-tree root.
    pub fn state_root(&self) -> B256 {
        match self {
            ProofSignals::EpochKey(s) => s.state_root,
            ProofSignals::Reputation(s) => s.state_root,
            ProofSignals::Signup(s) => s.state_root,
        }
    }

    /// Spend-token set carried by these signals.
    ///
    /// Zero placeholders are included; the Nullifier Guard strips them.
    pub fn nullifiers(&self) -> Vec<Nullifier> {
        match self {
            ProofSignals::EpochKey(_) => Vec::new(),
            ProofSignals::Reputation(s) => s.nullifiers.clone(),
            ProofSignals::Signup(s) => vec![s.grant_nullifier],
        }
    }
}


fn expect_len(circuit: &'static str, signals: &[U256], expected: usize) -> Result<(), CoreError> {
    if signals.len() != expected {
        return Err(CoreError::SignalLayout {
            circuit,
            expected,
            got: signals.len(),
        });
    }
    Ok(())
}

fn as_u64(value: U256, what: &'static str) -> Result<u64, CoreError> {
    u64::try_from(value).map_err(|_| CoreError::AmountOverflow(what))
}

#[cfg(test)]
mod tests {
    use super::test_vectors::*;
    use super::*;

    #[test]
    fn test_reputation_decode() {
        let root = B256::repeat_byte(0x0a);
        let raw = reputation_signals(&[55, 56], 3, 777, root, 5);

        let signals = ReputationSignals::decode(&raw).unwrap();
        assert_eq!(signals.epoch, 3);
        assert_eq!(signals.epoch_key, EpochKey::from(U256::from(777u64)));
        assert_eq!(signals.state_root, root);
        assert_eq!(signals.spend_amount, 5);
        assert_eq!(signals.nullifiers.len(), MAX_REP_NULLIFIERS);
        assert!(!signals.nullifiers[0].is_zero());
        assert!(!signals.nullifiers[1].is_zero());
        assert!(signals.nullifiers[2].is_zero());
    }

    #[test]
    fn test_signup_decode() {
        let root = B256::repeat_byte(0x0b);
        let raw = signup_signals(4, 888, root, 91);

        let signals = SignupSignals::decode(&raw).unwrap();
        assert_eq!(signals.epoch, 4);
        assert_eq!(signals.grant_nullifier, Nullifier::from(U256::from(91u64)));
        assert_eq!(signals.state_root, root);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = ReputationSignals::decode(&[U256::ZERO; 3]).unwrap_err();
        assert!(matches!(err, CoreError::SignalLayout { .. }));

        let err = SignupSignals::decode(&[U256::ZERO; 9]).unwrap_err();
        assert!(matches!(err, CoreError::SignalLayout { .. }));

        let err = EpochKeySignals::decode(&[]).unwrap_err();
        assert!(matches!(err, CoreError::SignalLayout { .. }));
    }

    #[test]
    fn test_tagged_decode_matches_kind() {
        let root = B256::repeat_byte(0x0c);
        let raw = signup_signals(1, 2, root, 3);

        let decoded = ProofSignals::decode(ProofKind::Signup, &raw).unwrap();
        assert!(matches!(decoded, ProofSignals::Signup(_)));
        assert_eq!(decoded.epoch(), 1);
        assert_eq!(decoded.nullifiers().len(), 1);

        // The same vector is not a valid reputation layout
        assert!(ProofSignals::decode(ProofKind::Reputation, &raw).is_err());
    }
}
