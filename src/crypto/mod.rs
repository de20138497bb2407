//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing and the leading-zero proof-of-work convention
//! - ECDSA key management (secp256k1)
//! - Merkle tree calculations

pub mod hash;
pub mod keys;
pub mod merkle;

pub use hash::{
    double_sha256, double_sha256_hex, leading_zero_digits, meets_difficulty, sha256, sha256_hex,
};
pub use keys::{public_key_from_hex, sign_message, verify_signature, KeyError, KeyPair};
pub use merkle::{calculate_merkle_root, calculate_merkle_root_hex};
