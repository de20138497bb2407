//! Security hardening guardrails
//!
//! Independent resource/economic checks composed in a fixed order by
//! `validate_new_transaction` / `validate_new_block`. Every check rejects
//! rather than failing open: anything it cannot account for (including a
//! serialization failure) counts against the limit.

use crate::consensus::{median_time_past, MAX_FUTURE_BLOCK_TIME, MTP_BLOCK_COUNT};
use crate::core::{Block, Transaction, MAX_SUPPLY};
use crate::utxo::{validate_amount, UtxoManager};
use serde::Serialize;
use thiserror::Error;

/// Reasons a transaction, block, or state transition is rejected
#[derive(Error, Debug, PartialEq)]
pub enum SecurityError {
    #[error("Transaction too large: {size} bytes (max {max})")]
    TransactionTooLarge { size: usize, max: usize },
    #[error("Block too large: {size} bytes (max {max})")]
    BlockTooLarge { size: usize, max: usize },
    #[error("Too many transactions in block: {count} (max {max})")]
    TooManyTransactions { count: usize, max: usize },
    #[error("Dust amount {amount} below minimum {minimum}")]
    Dust { amount: f64, minimum: f64 },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Arithmetic overflow: result exceeds supply cap")]
    Overflow,
    #[error("Mempool full: {count} pending transactions (max {max})")]
    MempoolFull { count: usize, max: usize },
    #[error("Mempool size exceeded: {bytes} bytes pending (max {max})")]
    MempoolBytesExceeded { bytes: usize, max: usize },
    #[error("Reorganization too deep: {depth} blocks (max {max})")]
    ReorgTooDeep { depth: u64, max: u64 },
    #[error("Reorganization fork point {fork_height} at or before checkpoint height {checkpoint_height}")]
    ReorgBeforeCheckpoint {
        fork_height: u64,
        checkpoint_height: u64,
    },
    #[error("Total supply {supply} exceeds maximum {max}")]
    SupplyExceeded { supply: f64, max: f64 },
    #[error("Coinbase pays {paid}, allowed at most {allowed}")]
    CoinbaseOverpays { paid: f64, allowed: f64 },
    #[error("Block timestamp {got} violates median-time-past {median}")]
    MedianTimePastViolation { got: i64, median: i64 },
    #[error("Block timestamp {got} too far in the future (now {now})")]
    TimestampTooFarInFuture { got: i64, now: i64 },
    #[error("Emergency action locked until height {unlock_height} (current {current_height})")]
    EmergencyTimelocked {
        unlock_height: u64,
        current_height: u64,
    },
}

/// Configurable ceilings and thresholds
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Maximum serialized transaction size in bytes
    pub max_tx_bytes: usize,
    /// Maximum serialized block size in bytes
    pub max_block_bytes: usize,
    /// Maximum transactions per block
    pub max_block_txs: usize,
    /// Minimum economical transfer amount
    pub dust_limit: f64,
    /// Hard supply cap
    pub max_supply: f64,
    /// Mempool admission ceilings
    pub max_mempool_txs: usize,
    pub max_mempool_bytes: usize,
    /// Maximum reorganization depth
    pub max_reorg_depth: u64,
    /// Blocks an emergency governance action must wait before execution
    pub emergency_timelock_blocks: u64,
    /// Median-time-past window
    pub mtp_window: usize,
    /// Maximum future timestamp drift, seconds
    pub max_future_drift: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_tx_bytes: 100_000,
            max_block_bytes: 1_000_000,
            max_block_txs: 10_000,
            dust_limit: 0.00001,
            max_supply: MAX_SUPPLY,
            max_mempool_txs: 10_000,
            max_mempool_bytes: 300_000_000,
            max_reorg_depth: 100,
            emergency_timelock_blocks: 144,
            mtp_window: MTP_BLOCK_COUNT,
            max_future_drift: MAX_FUTURE_BLOCK_TIME,
        }
    }
}

/// Composes the independent guardrails over blocks, transactions,
/// mempool admission, reorganizations, and supply.
#[derive(Debug, Clone, Default)]
pub struct SecurityManager {
    config: SecurityConfig,
}

impl SecurityManager {
    pub fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Serialized JSON length; a value that cannot be serialized counts
    /// as unbounded so it is rejected by any size ceiling.
    fn serialized_len<T: Serialize>(value: &T) -> usize {
        serde_json::to_vec(value).map(|v| v.len()).unwrap_or(usize::MAX)
    }

    pub fn validate_transaction_size(&self, tx: &Transaction) -> Result<(), SecurityError> {
        let size = Self::serialized_len(tx);
        if size > self.config.max_tx_bytes {
            return Err(SecurityError::TransactionTooLarge {
                size,
                max: self.config.max_tx_bytes,
            });
        }
        Ok(())
    }

    pub fn validate_block_size(&self, block: &Block) -> Result<(), SecurityError> {
        let size = Self::serialized_len(block);
        if size > self.config.max_block_bytes {
            return Err(SecurityError::BlockTooLarge {
                size,
                max: self.config.max_block_bytes,
            });
        }
        let count = block.tx_count();
        if count > self.config.max_block_txs {
            return Err(SecurityError::TooManyTransactions {
                count,
                max: self.config.max_block_txs,
            });
        }
        Ok(())
    }

    /// Dust protection; coinbase and other privileged mints are exempt
    pub fn validate_dust(&self, tx: &Transaction) -> Result<(), SecurityError> {
        if tx.is_privileged() {
            return Ok(());
        }
        if tx.amount < self.config.dust_limit {
            return Err(SecurityError::Dust {
                amount: tx.amount,
                minimum: self.config.dust_limit,
            });
        }
        Ok(())
    }

    /// Overflow protection: finite, non-negative, within the cap, at
    /// most 8 fractional digits.
    pub fn validate_amount(&self, amount: f64) -> Result<(), SecurityError> {
        validate_amount(amount).map_err(|e| SecurityError::InvalidAmount(e.to_string()))?;
        if amount > self.config.max_supply {
            return Err(SecurityError::SupplyExceeded {
                supply: amount,
                max: self.config.max_supply,
            });
        }
        Ok(())
    }

    /// Addition that refuses results above the supply cap
    pub fn safe_add(&self, a: f64, b: f64) -> Result<f64, SecurityError> {
        let sum = a + b;
        if !sum.is_finite() || sum > self.config.max_supply {
            return Err(SecurityError::Overflow);
        }
        Ok(sum)
    }

    /// Mempool admission: count and cumulative byte ceilings
    pub fn validate_mempool_admission(
        &self,
        pending_count: usize,
        pending_bytes: usize,
        tx: &Transaction,
    ) -> Result<(), SecurityError> {
        if pending_count >= self.config.max_mempool_txs {
            return Err(SecurityError::MempoolFull {
                count: pending_count,
                max: self.config.max_mempool_txs,
            });
        }
        let projected = pending_bytes.saturating_add(Self::serialized_len(tx));
        if projected > self.config.max_mempool_bytes {
            return Err(SecurityError::MempoolBytesExceeded {
                bytes: projected,
                max: self.config.max_mempool_bytes,
            });
        }
        Ok(())
    }

    /// Reorg protection: bounded depth, and the fork point must lie
    /// strictly after the last recorded checkpoint.
    pub fn validate_reorg(
        &self,
        fork_height: u64,
        current_height: u64,
        checkpoint_height: Option<u64>,
    ) -> Result<(), SecurityError> {
        let depth = current_height.saturating_sub(fork_height);
        if depth > self.config.max_reorg_depth {
            return Err(SecurityError::ReorgTooDeep {
                depth,
                max: self.config.max_reorg_depth,
            });
        }
        if let Some(checkpoint_height) = checkpoint_height {
            if fork_height <= checkpoint_height {
                return Err(SecurityError::ReorgBeforeCheckpoint {
                    fork_height,
                    checkpoint_height,
                });
            }
        }
        Ok(())
    }

    /// Total circulating supply (raw numeric total) must not exceed the cap
    pub fn validate_total_supply(&self, supply: f64) -> Result<(), SecurityError> {
        if !supply.is_finite() || supply > self.config.max_supply {
            return Err(SecurityError::SupplyExceeded {
                supply,
                max: self.config.max_supply,
            });
        }
        Ok(())
    }

    /// Sum unspent UTXO values and check against the cap
    pub fn validate_utxo_supply(&self, utxos: &UtxoManager) -> Result<(), SecurityError> {
        self.validate_total_supply(utxos.total_value())
    }

    /// Inflation-bug detection: the coinbase may pay at most the
    /// expected reward plus the block's total fees.
    pub fn validate_coinbase(
        &self,
        block: &Block,
        expected_reward: f64,
    ) -> Result<(), SecurityError> {
        let Some(coinbase) = block.coinbase_tx() else {
            return Ok(());
        };
        let allowed = expected_reward + block.total_fees();
        let paid = coinbase.total_output();
        // Small epsilon absorbs float accumulation over the fee sum
        if paid > allowed + 1e-8 {
            return Err(SecurityError::CoinbaseOverpays { paid, allowed });
        }
        Ok(())
    }

    /// Timestamp rules: strictly above the median of the trailing window
    /// and no further than the drift bound into the future.
    pub fn validate_timestamp(
        &self,
        timestamp: i64,
        chain: &[Block],
        now: i64,
    ) -> Result<(), SecurityError> {
        if let Some(median) = median_time_past(chain, self.config.mtp_window) {
            if timestamp <= median {
                return Err(SecurityError::MedianTimePastViolation {
                    got: timestamp,
                    median,
                });
            }
        }
        if timestamp > now + self.config.max_future_drift {
            return Err(SecurityError::TimestampTooFarInFuture {
                got: timestamp,
                now,
            });
        }
        Ok(())
    }

    /// Emergency governance actions wait a fixed block-height delay,
    /// independent of normal governance timing.
    pub fn validate_emergency_timelock(
        &self,
        action_height: u64,
        current_height: u64,
    ) -> Result<(), SecurityError> {
        let unlock_height = action_height + self.config.emergency_timelock_blocks;
        if current_height < unlock_height {
            return Err(SecurityError::EmergencyTimelocked {
                unlock_height,
                current_height,
            });
        }
        Ok(())
    }

    /// Fixed-order transaction admission: size, amount, dust, mempool
    /// capacity. First failure wins.
    pub fn validate_new_transaction(
        &self,
        tx: &Transaction,
        pending_count: usize,
        pending_bytes: usize,
    ) -> Result<(), SecurityError> {
        self.validate_transaction_size(tx)?;
        self.validate_amount(tx.amount)?;
        self.validate_dust(tx)?;
        self.validate_mempool_admission(pending_count, pending_bytes, tx)?;
        Ok(())
    }

    /// Fixed-order block admission: size limits, coinbase inflation,
    /// per-transaction amount and dust rules, timestamp rules.
    pub fn validate_new_block(
        &self,
        block: &Block,
        expected_reward: f64,
        chain: &[Block],
        now: i64,
    ) -> Result<(), SecurityError> {
        self.validate_block_size(block)?;
        self.validate_coinbase(block, expected_reward)?;
        for tx in &block.transactions {
            self.validate_amount(tx.amount)?;
            self.validate_dust(tx)?;
        }
        self.validate_timestamp(block.timestamp, chain, now)?;
        Ok(())
    }
}
