//! Cryptographic hashing utilities for the ledger
//!
//! Provides SHA-256 based hashing used for block hashes, transaction IDs,
//! merkle roots and the leading-zero proof-of-work convention.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for block hashes in Bitcoin-style blockchains
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes double SHA-256 hash and returns it as a hex string
pub fn double_sha256_hex(data: &[u8]) -> String {
    hex::encode(double_sha256(data))
}

/// Count the leading `'0'` hex digits of a hash string.
///
/// This is the proof-of-work measure used throughout the crate: a block at
/// difficulty `d` must have a hash with at least `d` leading zero digits,
/// and the same count serves as the per-block work proxy for fork choice.
pub fn leading_zero_digits(hash: &str) -> u32 {
    hash.chars().take_while(|c| *c == '0').count() as u32
}

/// Checks if a hex-encoded hash meets the difficulty target
/// (at least `difficulty` leading zero hex digits)
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    leading_zero_digits(hash) >= difficulty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let hash = sha256(b"hello world");
        assert_eq!(hash.len(), 32);
        assert_eq!(
            hex::encode(&hash),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_double_sha256_differs() {
        let single = sha256(b"data");
        let double = double_sha256(b"data");
        assert_ne!(single, double);
        assert_eq!(double, sha256(&single));
    }

    #[test]
    fn test_leading_zero_digits() {
        assert_eq!(leading_zero_digits("000abc"), 3);
        assert_eq!(leading_zero_digits("abc"), 0);
        assert_eq!(leading_zero_digits("0000"), 4);
        assert_eq!(leading_zero_digits(""), 0);
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("000fce", 3));
        assert!(meets_difficulty("000fce", 2));
        assert!(!meets_difficulty("000fce", 4));
        assert!(meets_difficulty("deadbeef", 0));
    }
}
