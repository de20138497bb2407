//! UTXO Ledger: consensus-critical chain state management
//!
//! This crate provides the validation core of a proof-of-work ledger:
//! - UTXO set with atomic spend, lock, and snapshot semantics
//! - Block and chain validation with longest-chain fork resolution
//! - Median-time-past and future-drift timestamp rules
//! - Orphan block pooling, finality tiers, and difficulty retargeting
//! - Resource and economic guardrails (size, dust, supply, reorg depth)
//! - Self-verifying filesystem checkpoints with two-phase retention
//!
//! # Example
//!
//! ```rust
//! use utxo_ledger::consensus::ConsensusManager;
//! use utxo_ledger::core::Block;
//! use utxo_ledger::utxo::UtxoManager;
//!
//! // Fund an address and check the balance
//! let utxos = UtxoManager::new();
//! utxos.add_utxo("alice", "tx001", 0, 100.0, "").unwrap();
//! assert_eq!(utxos.get_balance("alice"), 100.0);
//!
//! // Validate a freshly mined chain, with the UTXO set answering
//! // balance queries
//! let genesis = Block::genesis(1);
//! let consensus = ConsensusManager::default();
//! assert!(consensus.validate_chain(&[genesis], &utxos).is_ok());
//! ```

pub mod checkpoint;
pub mod consensus;
pub mod core;
pub mod crypto;
pub mod security;
pub mod utxo;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointConfig, CheckpointManager};
pub use consensus::{
    BlockValidationError, ConsensusManager, DifficultyAdjuster, FinalityLevel, FinalityTracker,
    ForkDecision, OrphanBlockPool,
};
pub use core::{Block, OutPoint, Transaction, TxKind, MAX_SUPPLY};
pub use crypto::KeyPair;
pub use security::{SecurityConfig, SecurityError, SecurityManager};
pub use utxo::{BalanceOracle, UtxoManager, UtxoSnapshot};
