//! Consensus: block/chain validation and the auxiliary refinements
//! layered on top of it (orphan pool, finality, difficulty, ordering)

pub mod difficulty;
pub mod finality;
pub mod manager;
pub mod ordering;
pub mod orphan;

pub use difficulty::{DifficultyAdjuster, DifficultyConfig};
pub use finality::{
    FinalityLevel, FinalityTracker, HARD_FINALITY_CONFIRMATIONS, MEDIUM_FINALITY_CONFIRMATIONS,
    SOFT_FINALITY_CONFIRMATIONS,
};
pub use manager::{
    median_time_past, BlockValidationError, ConsensusConfig, ConsensusManager, ForkDecision,
    IntegrityReport, MAX_FUTURE_BLOCK_TIME, MTP_BLOCK_COUNT,
};
pub use ordering::{sort_block_transactions, validate_transaction_order, OrderingError};
pub use orphan::{OrphanBlockPool, OrphanEntry, MAX_ORPHAN_BLOCKS, ORPHAN_BLOCK_TTL};
