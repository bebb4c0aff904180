//! Topic classification for raw ledger logs.
//!
//! A registry maps an event's topic0 to its handler family. The base
//! protocol's entries and the board extension's entries are merged once at
//! startup, with the extension winning on collision, so new event families
//! slot in without touching the sync loop. Topics the registry does not
//! know are ignored: the ledger may emit events newer than this mirror's
//! schema.

use alloy::primitives::B256;
use alloy::sol_types::SolEvent;
use std::collections::HashMap;

use crate::listener::events::{
    AirdropSubmitted, CommentSubmitted, PostSubmitted, ProofSubmitted, StateRootCommitted,
    UserSignedUp, VoteSubmitted,
};

/// Handler family for a classified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Proof recorded by the base protocol.
    ProofSubmitted,
    /// State-tree root announced by the base protocol.
    StateRootCommitted,
    /// Identity signup on the base protocol.
    UserSignedUp,
    /// Post on the board.
    PostSubmitted,
    /// Comment on the board.
    CommentSubmitted,
    /// Vote on the board.
    VoteSubmitted,
    /// Airdrop claim on the board.
    AirdropSubmitted,
}

/// Static topic0 → handler mapping, built once at startup.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    topics: HashMap<B256, EventKind>,
}

impl TopicRegistry {
    /// Base protocol entries.
    pub fn base() -> Vec<(B256, EventKind)> {
        vec![
            (ProofSubmitted::SIGNATURE_HASH, EventKind::ProofSubmitted),
            (
                StateRootCommitted::SIGNATURE_HASH,
                EventKind::StateRootCommitted,
            ),
            (UserSignedUp::SIGNATURE_HASH, EventKind::UserSignedUp),
        ]
    }

    /// Board extension entries.
    pub fn board() -> Vec<(B256, EventKind)> {
        vec![
            (PostSubmitted::SIGNATURE_HASH, EventKind::PostSubmitted),
            (
                CommentSubmitted::SIGNATURE_HASH,
                EventKind::CommentSubmitted,
            ),
            (VoteSubmitted::SIGNATURE_HASH, EventKind::VoteSubmitted),
            (
                AirdropSubmitted::SIGNATURE_HASH,
                EventKind::AirdropSubmitted,
            ),
        ]
    }

    /// Build a registry from base entries plus overrides.
    ///
    /// Override entries win when both map the same topic.
    pub fn with_overrides(
        base: Vec<(B256, EventKind)>,
        overrides: Vec<(B256, EventKind)>,
    ) -> Self {
        let mut topics = HashMap::new();
        for (topic, kind) in base.into_iter().chain(overrides) {
            topics.insert(topic, kind);
        }
        Self { topics }
    }

    /// The full registry for a Murmur deployment: base + board.
    pub fn merged() -> Self {
        Self::with_overrides(Self::base(), Self::board())
    }

    /// Classify a topic0. `None` means the topic is unknown and the event
    /// should be ignored.
    pub fn classify(&self, topic0: &B256) -> Option<EventKind> {
        self.topics.get(topic0).copied()
    }

    /// Number of mapped topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether the registry maps no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_registry_covers_both_contracts() {
        let registry = TopicRegistry::merged();
        assert_eq!(registry.len(), 7);

        assert_eq!(
            registry.classify(&PostSubmitted::SIGNATURE_HASH),
            Some(EventKind::PostSubmitted)
        );
        assert_eq!(
            registry.classify(&ProofSubmitted::SIGNATURE_HASH),
            Some(EventKind::ProofSubmitted)
        );
    }

    #[test]
    fn test_unknown_topic_is_ignored() {
        let registry = TopicRegistry::merged();
        assert_eq!(registry.classify(&B256::repeat_byte(0x77)), None);
    }

    #[test]
    fn test_override_precedence_on_collision() {
        let topic = B256::repeat_byte(0x42);
        let registry = TopicRegistry::with_overrides(
            vec![(topic, EventKind::UserSignedUp)],
            vec![(topic, EventKind::PostSubmitted)],
        );

        assert_eq!(registry.classify(&topic), Some(EventKind::PostSubmitted));
        assert_eq!(registry.len(), 1);
    }
}
