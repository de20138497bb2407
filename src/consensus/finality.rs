//! Confirmation-count finality tracking
//!
//! Confirmations are `chain_height - block_index`. Tiers map confirmation
//! counts to "safe to treat as irreversible" guarantees; blocks past the
//! hard tier may be explicitly finalized and are then excluded from any
//! future reorganization.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Confirmations for soft finality
pub const SOFT_FINALITY_CONFIRMATIONS: u64 = 6;

/// Confirmations for medium finality
pub const MEDIUM_FINALITY_CONFIRMATIONS: u64 = 20;

/// Confirmations for hard finality
pub const HARD_FINALITY_CONFIRMATIONS: u64 = 100;

/// Increasing irreversibility guarantees
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FinalityLevel {
    /// Fewer than 6 confirmations: still plausibly reorganized away
    Pending,
    /// ≥ 6 confirmations
    Soft,
    /// ≥ 20 confirmations
    Medium,
    /// ≥ 100 confirmations
    Hard,
}

/// Tracks finality per block height
#[derive(Debug, Default)]
pub struct FinalityTracker {
    /// Hashes explicitly marked irreversible
    finalized: HashSet<String>,
    /// Highest explicitly finalized height
    finalized_height: Option<u64>,
}

impl FinalityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirmations a block at `block_index` has under `chain_height`
    pub fn confirmations(chain_height: u64, block_index: u64) -> u64 {
        chain_height.saturating_sub(block_index)
    }

    /// Finality tier for a block at `block_index`
    pub fn level(chain_height: u64, block_index: u64) -> FinalityLevel {
        let confirmations = Self::confirmations(chain_height, block_index);
        if confirmations >= HARD_FINALITY_CONFIRMATIONS {
            FinalityLevel::Hard
        } else if confirmations >= MEDIUM_FINALITY_CONFIRMATIONS {
            FinalityLevel::Medium
        } else if confirmations >= SOFT_FINALITY_CONFIRMATIONS {
            FinalityLevel::Soft
        } else {
            FinalityLevel::Pending
        }
    }

    /// Explicitly mark a hard-final block irreversible. Returns `false`
    /// if the block has not yet reached the hard tier.
    pub fn mark_finalized(
        &mut self,
        block_hash: &str,
        block_index: u64,
        chain_height: u64,
    ) -> bool {
        if Self::level(chain_height, block_index) != FinalityLevel::Hard {
            return false;
        }
        self.finalized.insert(block_hash.to_string());
        self.finalized_height = Some(
            self.finalized_height
                .map_or(block_index, |h| h.max(block_index)),
        );
        log::info!("Block {} at height {} finalized", block_hash, block_index);
        true
    }

    pub fn is_finalized(&self, block_hash: &str) -> bool {
        self.finalized.contains(block_hash)
    }

    /// A reorganization may not touch finalized heights
    pub fn is_reorg_allowed(&self, fork_height: u64) -> bool {
        match self.finalized_height {
            Some(finalized) => fork_height > finalized,
            None => true,
        }
    }

    pub fn finalized_height(&self) -> Option<u64> {
        self.finalized_height
    }
}
