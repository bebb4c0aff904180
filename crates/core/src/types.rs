//! Core types for Murmur.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// Re-export Alloy types for convenience
pub use alloy_primitives::B256 as Bytes32;

/// An epoch-scoped pseudonymous key (field element committed on-chain).
///
/// Identities never appear on the ledger directly; every value-bearing event
/// is attributed to an epoch key derived for that epoch alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochKey(pub B256);

impl EpochKey {
    /// Create a new EpochKey from a 32-byte value.
    pub const fn new(bytes: B256) -> Self {
        EpochKey(bytes)
    }

    /// Get the inner B256.
    pub const fn inner(&self) -> &B256 {
        &self.0
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_ref()
    }
}

impl From<B256> for EpochKey {
    fn from(b: B256) -> Self {
        EpochKey(b)
    }
}

impl From<[u8; 32]> for EpochKey {
    fn from(bytes: [u8; 32]) -> Self {
        EpochKey(B256::from(bytes))
    }
}

impl From<U256> for EpochKey {
    fn from(v: U256) -> Self {
        EpochKey(B256::from(v))
    }
}

impl fmt::Display for EpochKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single-use spend token derived from a reputation or signup proof.
///
/// A zero nullifier marks an unused slot in a proof's nullifier region and
/// is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(pub B256);

impl Nullifier {
    /// Create a new Nullifier from a 32-byte value.
    pub const fn new(bytes: B256) -> Self {
        Nullifier(bytes)
    }

    /// Get the inner B256.
    pub const fn inner(&self) -> &B256 {
        &self.0
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_ref()
    }

    /// Whether this is the zero placeholder for an unused slot.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<B256> for Nullifier {
    fn from(b: B256) -> Self {
        Nullifier(b)
    }
}

impl From<[u8; 32]> for Nullifier {
    fn from(bytes: [u8; 32]) -> Self {
        Nullifier(B256::from(bytes))
    }
}

impl From<U256> for Nullifier {
    fn from(v: U256) -> Self {
        Nullifier(B256::from(v))
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keccak commitment to a piece of board content.
///
/// The ledger carries only this hash; bodies live off-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub B256);

impl ContentHash {
    /// Create a new ContentHash from a 32-byte value.
    pub const fn new(bytes: B256) -> Self {
        ContentHash(bytes)
    }

    /// Get the inner B256.
    pub const fn inner(&self) -> &B256 {
        &self.0
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_ref()
    }
}

impl From<B256> for ContentHash {
    fn from(b: B256) -> Self {
        ContentHash(b)
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        ContentHash(B256::from(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a mirrored content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Top-level post.
    Post,

    /// Comment attached to a parent post.
    Comment,
}

impl ContentKind {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Comment => "comment",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentKind::Post),
            "comment" => Ok(ContentKind::Comment),
            _ => Err(CoreError::InvalidContentKind(s.to_string())),
        }
    }
}

/// Confirmation status of a mirrored row.
///
/// `Pending` rows are written optimistically by the submission path before
/// the ledger confirms the transaction; the synchronizer flips them to
/// `Confirmed` in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// Written optimistically, not yet seen on the ledger.
    Pending,

    /// Confirmed by a ledger event.
    Confirmed,
}

impl ConfirmationStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::Pending => "pending",
            ConfirmationStatus::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for ConfirmationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConfirmationStatus::Pending),
            "confirmed" => Ok(ConfirmationStatus::Confirmed),
            _ => Err(CoreError::InvalidStatus(s.to_string())),
        }
    }
}

/// Action recorded by an audit ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordAction {
    /// Initial signup grant.
    Signup,

    /// Post submission cost.
    Post,

    /// Comment submission cost.
    Comment,

    /// Vote magnitudes (spent by voter, received by target).
    Vote,

    /// Per-epoch airdrop grant.
    Airdrop,
}

impl RecordAction {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordAction::Signup => "signup",
            RecordAction::Post => "post",
            RecordAction::Comment => "comment",
            RecordAction::Vote => "vote",
            RecordAction::Airdrop => "airdrop",
        }
    }
}

impl std::str::FromStr for RecordAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(RecordAction::Signup),
            "post" => Ok(RecordAction::Post),
            "comment" => Ok(RecordAction::Comment),
            "vote" => Ok(RecordAction::Vote),
            "airdrop" => Ok(RecordAction::Airdrop),
            _ => Err(CoreError::InvalidAction(s.to_string())),
        }
    }
}

/// Circuit family a recorded proof belongs to.
///
/// The tag is emitted on-chain with the proof submission and selects the
/// verification circuit when the proof is later referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    /// Epoch-key ownership proof.
    EpochKey,

    /// Reputation spend proof (carries the nullifier region).
    Reputation,

    /// Signup proof (carries the grant nullifier).
    Signup,
}

impl ProofKind {
    /// On-chain tag value.
    pub const fn tag(&self) -> u8 {
        match self {
            ProofKind::EpochKey => 1,
            ProofKind::Reputation => 2,
            ProofKind::Signup => 3,
        }
    }

    /// Resolve a kind from its on-chain tag.
    pub fn from_tag(tag: u8) -> Result<Self, CoreError> {
        match tag {
            1 => Ok(ProofKind::EpochKey),
            2 => Ok(ProofKind::Reputation),
            3 => Ok(ProofKind::Signup),
            _ => Err(CoreError::InvalidProofKind(tag)),
        }
    }

    /// Circuit name, used for prover-service requests and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofKind::EpochKey => "epoch_key",
            ProofKind::Reputation => "reputation",
            ProofKind::Signup => "signup",
        }
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullifier_zero_detection() {
        assert!(Nullifier::from([0u8; 32]).is_zero());
        assert!(!Nullifier::from([1u8; 32]).is_zero());
        assert!(Nullifier::from(U256::ZERO).is_zero());
    }

    #[test]
    fn test_epoch_key_from_u256_round_trip() {
        let v = U256::from(123456u64);
        let key = EpochKey::from(v);
        assert_eq!(U256::from_be_bytes(*key.as_bytes()), v);
    }

    #[test]
    fn test_content_kind_str_conversion() {
        assert_eq!(ContentKind::Post.as_str(), "post");
        assert_eq!(ContentKind::Comment.as_str(), "comment");

        assert_eq!("post".parse::<ContentKind>().unwrap(), ContentKind::Post);
        assert_eq!(
            "comment".parse::<ContentKind>().unwrap(),
            ContentKind::Comment
        );
        assert!("thread".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_status_str_conversion() {
        assert_eq!(
            "pending".parse::<ConfirmationStatus>().unwrap(),
            ConfirmationStatus::Pending
        );
        assert_eq!(
            "confirmed".parse::<ConfirmationStatus>().unwrap(),
            ConfirmationStatus::Confirmed
        );
        assert!("settled".parse::<ConfirmationStatus>().is_err());
    }

    #[test]
    fn test_record_action_str_conversion() {
        for action in [
            RecordAction::Signup,
            RecordAction::Post,
            RecordAction::Comment,
            RecordAction::Vote,
            RecordAction::Airdrop,
        ] {
            assert_eq!(action.as_str().parse::<RecordAction>().unwrap(), action);
        }
        assert!("burn".parse::<RecordAction>().is_err());
    }

    #[test]
    fn test_proof_kind_tag_round_trip() {
        for kind in [ProofKind::EpochKey, ProofKind::Reputation, ProofKind::Signup] {
            assert_eq!(ProofKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(ProofKind::from_tag(0).is_err());
        assert!(ProofKind::from_tag(9).is_err());
    }
}
