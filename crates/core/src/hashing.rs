//! Hashing utilities for Murmur.
//!
//! Provides keccak256 hashing and the content-commitment helper matching
//! the on-chain convention (the ledger carries hashes, never bodies).

use crate::types::ContentHash;
use alloy_primitives::{keccak256 as alloy_keccak256, B256};

/// Compute keccak256 hash of input data.
///
/// This is a re-export of Alloy's keccak256 for convenience.
///
/// # Example
///
/// ```
/// use murmur_core::hashing::keccak256;
///
/// let data = b"hello";
/// let hash = keccak256(data);
/// ```
pub fn keccak256(data: &[u8]) -> B256 {
    alloy_keccak256(data)
}

/// Compute the canonical content commitment for a body.
///
/// This must match the hash the submission path writes on-chain:
/// `keccak256(utf8(body))`.
///
/// # Example
///
/// ```
/// use murmur_core::hashing::hash_content;
///
/// let hash = hash_content("gm, anonymously");
/// assert_eq!(hash, hash_content("gm, anonymously"));
/// ```
pub fn hash_content(body: &str) -> ContentHash {
    ContentHash::from(alloy_keccak256(body.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_keccak256() {
        // Known Keccak256 vector (not SHA3-256!)
        let input = b"";
        let expected = B256::from(hex!(
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        ));
        assert_eq!(keccak256(input), expected);
    }

    #[test]
    fn test_hash_content_is_deterministic() {
        let a = hash_content("hello board");
        let b = hash_content("hello board");
        let c = hash_content("hello board!");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
