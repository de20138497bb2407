//! Block and chain validation, fork choice, and chain integrity
//!
//! Validation is read-only over the chain: a block or chain is either
//! accepted or rejected with a typed reason. Invalid input from peers is
//! routine, so every check surfaces `Result` rather than panicking.

use crate::core::{genesis_prev_hash, Block, TransactionError, SUPPORTED_BLOCK_VERSIONS};
use crate::crypto::{leading_zero_digits, meets_difficulty};
use crate::utxo::BalanceOracle;
use thiserror::Error;

/// Number of trailing blocks in the median-time-past window (Bitcoin uses 11)
pub const MTP_BLOCK_COUNT: usize = 11;

/// Maximum allowed block timestamp drift into the future (2 hours)
pub const MAX_FUTURE_BLOCK_TIME: i64 = 7200;

/// Reasons a block or chain fails validation
#[derive(Error, Debug, PartialEq)]
pub enum BlockValidationError {
    #[error("Invalid block hash")]
    InvalidHash,
    #[error("Unsupported block header version: {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid proof of work")]
    InvalidProofOfWork,
    #[error("Previous hash mismatch")]
    PreviousHashMismatch,
    #[error("Invalid block index: expected {expected}, got {got}")]
    InvalidIndex { expected: u64, got: u64 },
    #[error("Block index mismatch: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("Block timestamp {got} is not after previous block timestamp {previous}")]
    TimestampBeforePrevious { got: i64, previous: i64 },
    #[error("Block timestamp {got} violates median-time-past {median}")]
    MedianTimePastViolation { got: i64, median: i64 },
    #[error("Invalid signature in transaction {0}")]
    InvalidSignature(String),
    #[error("Insufficient balance: sender {sender} has {available}, needs {required}")]
    InsufficientBalance {
        sender: String,
        required: f64,
        available: f64,
    },
    #[error("Chain is empty")]
    EmptyChain,
    #[error("Genesis block must have index 0, got {0}")]
    GenesisIndex(u64),
    #[error("Genesis block previous hash is not the zero sentinel")]
    GenesisPreviousHash,
    #[error("Block {index}: {source}")]
    AtBlock {
        index: u64,
        #[source]
        source: Box<BlockValidationError>,
    },
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<TransactionError> for BlockValidationError {
    fn from(err: TransactionError) -> Self {
        BlockValidationError::Transaction(err.to_string())
    }
}

/// Outcome of fork resolution: the winning chain index (if any) plus a
/// human-readable reason, including explicit tie reporting
#[derive(Debug, Clone, PartialEq)]
pub struct ForkDecision {
    pub winner: Option<usize>,
    pub reason: String,
}

/// Non-mutating chain scan result
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityReport {
    pub is_intact: bool,
    pub issues: Vec<String>,
}

/// Consensus validation configuration
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Header versions the validator accepts
    pub supported_versions: Vec<u32>,
    /// Median-time-past window size
    pub mtp_window: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            supported_versions: SUPPORTED_BLOCK_VERSIONS.to_vec(),
            mtp_window: MTP_BLOCK_COUNT,
        }
    }
}

/// Validates individual blocks and whole chains, resolves forks by
/// length with cumulative work as the tiebreak, and reports integrity.
#[derive(Debug, Clone, Default)]
pub struct ConsensusManager {
    config: ConsensusConfig,
}

/// Median of the last `window` timestamps in `chain`.
///
/// The canonical rule is strict: a new block's timestamp must be
/// **greater than** this value. Upper median for even window sizes.
pub fn median_time_past(chain: &[Block], window: usize) -> Option<i64> {
    if chain.is_empty() || window == 0 {
        return None;
    }
    let start = chain.len().saturating_sub(window);
    let mut timestamps: Vec<i64> = chain[start..].iter().map(|b| b.timestamp).collect();
    timestamps.sort_unstable();
    Some(timestamps[timestamps.len() / 2])
}

impl ConsensusManager {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Pure proof-of-work check: the hash's leading run of `'0'` hex
    /// digits must be at least `difficulty` long.
    pub fn verify_proof_of_work(block: &Block, difficulty: u32) -> bool {
        meets_difficulty(&block.hash, difficulty)
    }

    /// Validate one block.
    ///
    /// With `previous` given, linkage, index, timestamp and
    /// median-time-past (over `chain`, the blocks below this one) are
    /// enforced. Without a parent but with a non-empty chain attached,
    /// the block's index must equal the chain length.
    pub fn validate_block(
        &self,
        block: &Block,
        previous: Option<&Block>,
        chain: &[Block],
    ) -> Result<(), BlockValidationError> {
        if !block.verify_hash() {
            return Err(BlockValidationError::InvalidHash);
        }
        if !self.config.supported_versions.contains(&block.version) {
            return Err(BlockValidationError::UnsupportedVersion(block.version));
        }
        if !Self::verify_proof_of_work(block, block.difficulty) {
            return Err(BlockValidationError::InvalidProofOfWork);
        }

        if let Some(prev) = previous {
            if block.previous_hash != prev.hash {
                return Err(BlockValidationError::PreviousHashMismatch);
            }
            if block.index != prev.index + 1 {
                return Err(BlockValidationError::InvalidIndex {
                    expected: prev.index + 1,
                    got: block.index,
                });
            }
            if block.timestamp <= prev.timestamp {
                return Err(BlockValidationError::TimestampBeforePrevious {
                    got: block.timestamp,
                    previous: prev.timestamp,
                });
            }
            if let Some(median) = median_time_past(chain, self.config.mtp_window) {
                if block.timestamp <= median {
                    return Err(BlockValidationError::MedianTimePastViolation {
                        got: block.timestamp,
                        median,
                    });
                }
            }
        } else if !chain.is_empty() && block.index != chain.len() as u64 {
            return Err(BlockValidationError::IndexMismatch {
                expected: chain.len() as u64,
                got: block.index,
            });
        }

        Ok(())
    }

    /// Validate every transaction in a block: privileged kinds are
    /// skipped, the rest need a verifying signature and a sender balance
    /// covering amount plus fee.
    pub fn validate_block_transactions(
        &self,
        block: &Block,
        oracle: &dyn BalanceOracle,
    ) -> Result<(), BlockValidationError> {
        for tx in &block.transactions {
            if tx.is_privileged() {
                continue;
            }
            if !tx.verify_signature()? {
                return Err(BlockValidationError::InvalidSignature(tx.txid.clone()));
            }
            let available = oracle.get_balance(&tx.sender);
            let required = tx.amount + tx.fee;
            if available < required {
                return Err(BlockValidationError::InsufficientBalance {
                    sender: tx.sender.clone(),
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Validate a full chain: genesis rules, then every successor
    /// against its predecessor plus its transactions. First failure
    /// aborts with the offending height attached.
    pub fn validate_chain(
        &self,
        chain: &[Block],
        oracle: &dyn BalanceOracle,
    ) -> Result<(), BlockValidationError> {
        let genesis = chain.first().ok_or(BlockValidationError::EmptyChain)?;
        if genesis.index != 0 {
            return Err(BlockValidationError::GenesisIndex(genesis.index));
        }
        if genesis.previous_hash != genesis_prev_hash() {
            return Err(BlockValidationError::GenesisPreviousHash);
        }

        for i in 1..chain.len() {
            let at = |source: BlockValidationError| BlockValidationError::AtBlock {
                index: chain[i].index,
                source: Box::new(source),
            };
            self.validate_block(&chain[i], Some(&chain[i - 1]), &chain[..i])
                .map_err(at)?;
            self.validate_block_transactions(&chain[i], oracle)
                .map_err(at)?;
        }
        Ok(())
    }

    /// Resolve competing chains: among candidates passing full
    /// validation, the strictly longest wins; equal lengths fall back
    /// to cumulative work, and a full tie keeps the first candidate.
    pub fn resolve_forks(
        &self,
        chains: &[Vec<Block>],
        oracle: &dyn BalanceOracle,
    ) -> ForkDecision {
        if chains.is_empty() {
            return ForkDecision {
                winner: None,
                reason: "No chains provided".to_string(),
            };
        }

        let valid: Vec<usize> = chains
            .iter()
            .enumerate()
            .filter_map(|(i, chain)| match self.validate_chain(chain, oracle) {
                Ok(()) => Some(i),
                Err(err) => {
                    log::debug!("Fork candidate {} rejected: {}", i, err);
                    None
                }
            })
            .collect();

        if valid.is_empty() {
            return ForkDecision {
                winner: None,
                reason: "No valid chains".to_string(),
            };
        }

        let best_len = valid.iter().map(|&i| chains[i].len()).max().unwrap_or(0);
        let longest: Vec<usize> = valid
            .iter()
            .copied()
            .filter(|&i| chains[i].len() == best_len)
            .collect();

        let mut winner = longest[0];
        let mut best_work = Self::calculate_chain_work(&chains[winner]);
        for &i in &longest[1..] {
            let work = Self::calculate_chain_work(&chains[i]);
            if work > best_work {
                winner = i;
                best_work = work;
            }
        }
        let reason = if longest.len() > 1 {
            format!(
                "Tie between chains {:?} at length {}; selected chain {} by cumulative work",
                longest, best_len, winner
            )
        } else {
            format!("Chain {} selected: longest valid chain ({} blocks)", winner, best_len)
        };
        ForkDecision {
            winner: Some(winner),
            reason,
        }
    }

    /// Scan the chain for index-sequence gaps and validation failures
    /// without mutating anything.
    pub fn check_chain_integrity(&self, chain: &[Block]) -> IntegrityReport {
        let mut issues = Vec::new();

        for (i, block) in chain.iter().enumerate() {
            if block.index != i as u64 {
                issues.push(format!(
                    "Index gap at position {}: block carries index {}",
                    i, block.index
                ));
            }
            let previous = if i > 0 { Some(&chain[i - 1]) } else { None };
            if let Err(err) = self.validate_block(block, previous, &chain[..i]) {
                issues.push(format!("Block {} failed validation: {}", block.index, err));
            }
        }

        IntegrityReport {
            is_intact: issues.is_empty(),
            issues,
        }
    }

    /// Cumulative proof-of-work proxy: sum of leading zero hex digits
    /// over all block hashes.
    pub fn calculate_chain_work(blocks: &[Block]) -> u64 {
        blocks
            .iter()
            .map(|b| leading_zero_digits(&b.hash) as u64)
            .sum()
    }

    /// Decide whether `candidate` should replace `current`: never if the
    /// candidate is invalid; yes if strictly longer; on equal length only
    /// if its cumulative work is strictly greater.
    pub fn should_replace_chain(
        &self,
        current: &[Block],
        candidate: &[Block],
        oracle: &dyn BalanceOracle,
    ) -> bool {
        if self.validate_chain(candidate, oracle).is_err() {
            return false;
        }
        if candidate.len() > current.len() {
            return true;
        }
        if candidate.len() == current.len() {
            return Self::calculate_chain_work(candidate) > Self::calculate_chain_work(current);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    /// Oracle with a fixed balance for every address
    struct FlatOracle(f64);

    impl BalanceOracle for FlatOracle {
        fn get_balance(&self, _address: &str) -> f64 {
            self.0
        }
    }

    fn build_chain(len: usize, difficulty: u32) -> Vec<Block> {
        let mut chain = vec![Block::genesis(difficulty)];
        for i in 1..len {
            let prev = chain.last().unwrap();
            let mut block = Block::new(
                i as u64,
                prev.hash.clone(),
                vec![Transaction::coinbase("miner", 50.0)],
                difficulty,
            );
            // Keep timestamps strictly increasing past the MTP window
            block.timestamp = prev.timestamp + 10;
            block.mine();
            chain.push(block);
        }
        chain
    }

    #[test]
    fn test_validate_block_accepts_good_block() {
        let manager = ConsensusManager::default();
        let chain = build_chain(3, 1);
        let (last, rest) = chain.split_last().unwrap();
        assert!(manager
            .validate_block(last, rest.last(), rest)
            .is_ok());
    }

    #[test]
    fn test_validate_block_rejects_tampered_hash() {
        let manager = ConsensusManager::default();
        let chain = build_chain(2, 1);
        let mut block = chain[1].clone();
        block.nonce += 1;
        assert_eq!(
            manager.validate_block(&block, Some(&chain[0]), &chain[..1]),
            Err(BlockValidationError::InvalidHash)
        );
    }

    #[test]
    fn test_validate_block_rejects_unsupported_version() {
        let manager = ConsensusManager::default();
        let mut block = Block::genesis(1);
        block.version = 99;
        block.hash = block.calculate_hash();
        // Hash recomputes fine; version check is next
        let err = manager.validate_block(&block, None, &[]).unwrap_err();
        assert_eq!(err, BlockValidationError::UnsupportedVersion(99));
    }

    #[test]
    fn test_validate_block_rejects_bad_pow() {
        let manager = ConsensusManager::default();
        let mut block = Block::genesis(0);
        block.difficulty = 60;
        block.hash = block.calculate_hash();
        assert_eq!(
            manager.validate_block(&block, None, &[]),
            Err(BlockValidationError::InvalidProofOfWork)
        );
    }

    #[test]
    fn test_validate_block_rejects_linkage_errors() {
        let manager = ConsensusManager::default();
        let chain = build_chain(2, 1);

        let mut wrong_parent = chain[1].clone();
        wrong_parent.previous_hash = "f".repeat(64);
        wrong_parent.hash = wrong_parent.calculate_hash();
        wrong_parent.mine();
        assert_eq!(
            manager.validate_block(&wrong_parent, Some(&chain[0]), &chain[..1]),
            Err(BlockValidationError::PreviousHashMismatch)
        );

        let mut wrong_index = chain[1].clone();
        wrong_index.index = 5;
        wrong_index.mine();
        assert!(matches!(
            manager.validate_block(&wrong_index, Some(&chain[0]), &chain[..1]),
            Err(BlockValidationError::InvalidIndex { expected: 1, got: 5 })
        ));
    }

    #[test]
    fn test_index_mismatch_without_explicit_parent() {
        let manager = ConsensusManager::default();
        let chain = build_chain(3, 1);
        let mut block = chain[2].clone();
        block.index = 7;
        block.mine();
        assert!(matches!(
            manager.validate_block(&block, None, &chain),
            Err(BlockValidationError::IndexMismatch { expected: 3, got: 7 })
        ));
    }

    #[test]
    fn test_median_time_past_enforced() {
        let manager = ConsensusManager::default();
        let mut chain = build_chain(12, 1);

        // Drag the tip's timestamp below the window median so a block can
        // be newer than its parent yet still fail the median rule
        let tip_ts = chain.first().unwrap().timestamp + 1;
        chain.last_mut().unwrap().timestamp = tip_ts;
        let median = median_time_past(&chain, MTP_BLOCK_COUNT).unwrap();
        assert!(median > tip_ts);
        let prev = chain.last().unwrap();

        let mut block = Block::new(
            prev.index + 1,
            prev.hash.clone(),
            vec![Transaction::coinbase("miner", 50.0)],
            1,
        );
        block.timestamp = median; // newer than parent, equal to median
        block.mine();

        let err = manager.validate_block(&block, Some(prev), &chain).unwrap_err();
        assert!(matches!(
            err,
            BlockValidationError::MedianTimePastViolation { .. }
        ));
    }

    #[test]
    fn test_median_time_past_math() {
        let mut chain = build_chain(3, 0);
        chain[0].timestamp = 100;
        chain[1].timestamp = 300;
        chain[2].timestamp = 200;
        assert_eq!(median_time_past(&chain, 11), Some(200));
        assert_eq!(median_time_past(&[], 11), None);
    }

    #[test]
    fn test_validate_chain_genesis_rules() {
        let manager = ConsensusManager::default();
        let oracle = FlatOracle(0.0);

        assert_eq!(
            manager.validate_chain(&[], &oracle),
            Err(BlockValidationError::EmptyChain)
        );

        let mut bad_index = Block::genesis(1);
        bad_index.index = 1;
        bad_index.mine();
        assert_eq!(
            manager.validate_chain(&[bad_index], &oracle),
            Err(BlockValidationError::GenesisIndex(1))
        );

        let mut bad_parent = Block::genesis(1);
        bad_parent.previous_hash = "f".repeat(64);
        bad_parent.mine();
        assert_eq!(
            manager.validate_chain(&[bad_parent], &oracle),
            Err(BlockValidationError::GenesisPreviousHash)
        );
    }

    #[test]
    fn test_validate_chain_good() {
        let manager = ConsensusManager::default();
        let chain = build_chain(5, 1);
        assert!(manager.validate_chain(&chain, &FlatOracle(0.0)).is_ok());
    }

    #[test]
    fn test_insufficient_balance_rejected() {
        let manager = ConsensusManager::default();
        let kp = crate::crypto::KeyPair::generate();
        let mut tx = Transaction::transfer("alice", "bob", 10.0, 0.5);
        tx.sign(&kp).unwrap();

        let block = Block::new(1, genesis_prev_hash(), vec![tx], 0);
        let err = manager
            .validate_block_transactions(&block, &FlatOracle(5.0))
            .unwrap_err();
        assert!(matches!(
            err,
            BlockValidationError::InsufficientBalance { .. }
        ));
        assert!(manager
            .validate_block_transactions(&block, &FlatOracle(11.0))
            .is_ok());
    }

    #[test]
    fn test_unsigned_transaction_rejected() {
        let manager = ConsensusManager::default();
        let tx = Transaction::transfer("alice", "bob", 10.0, 0.5);
        let block = Block::new(1, genesis_prev_hash(), vec![tx], 0);
        assert!(matches!(
            manager.validate_block_transactions(&block, &FlatOracle(100.0)),
            Err(BlockValidationError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_fork_choice_longest_wins() {
        let manager = ConsensusManager::default();
        let oracle = FlatOracle(0.0);
        let chain_a = build_chain(3, 1);
        let chain_b = build_chain(5, 1);

        let decision = manager.resolve_forks(&[chain_a, chain_b], &oracle);
        assert_eq!(decision.winner, Some(1));
        assert!(decision.reason.contains('5'));
    }

    #[test]
    fn test_fork_choice_tampered_candidate_loses() {
        let manager = ConsensusManager::default();
        let oracle = FlatOracle(0.0);
        let chain_a = build_chain(3, 1);
        let mut chain_b = build_chain(5, 1);
        chain_b[2].hash = "deadbeef".to_string();

        let decision = manager.resolve_forks(&[chain_a, chain_b], &oracle);
        assert_eq!(decision.winner, Some(0));
    }

    #[test]
    fn test_fork_choice_empty_and_invalid() {
        let manager = ConsensusManager::default();
        let oracle = FlatOracle(0.0);

        let decision = manager.resolve_forks(&[], &oracle);
        assert_eq!(decision.winner, None);
        assert_eq!(decision.reason, "No chains provided");

        let mut broken = build_chain(2, 1);
        broken[1].hash = "00".to_string();
        let decision = manager.resolve_forks(&[broken], &oracle);
        assert_eq!(decision.winner, None);
        assert_eq!(decision.reason, "No valid chains");
    }

    #[test]
    fn test_fork_choice_reports_tie() {
        let manager = ConsensusManager::default();
        let oracle = FlatOracle(0.0);
        let chain = build_chain(3, 1);

        let decision = manager.resolve_forks(&[chain.clone(), chain], &oracle);
        assert_eq!(decision.winner, Some(0));
        assert!(decision.reason.contains("Tie"));
    }

    #[test]
    fn test_chain_integrity_detects_gap() {
        let manager = ConsensusManager::default();
        let mut chain = build_chain(4, 1);
        chain[2].index = 9;

        let report = manager.check_chain_integrity(&chain);
        assert!(!report.is_intact);
        assert!(!report.issues.is_empty());

        let clean = build_chain(4, 1);
        assert!(manager.check_chain_integrity(&clean).is_intact);
    }

    #[test]
    fn test_chain_work_monotone_in_difficulty() {
        let easy = build_chain(3, 1);
        let hard = build_chain(3, 2);
        assert!(
            ConsensusManager::calculate_chain_work(&hard)
                >= ConsensusManager::calculate_chain_work(&easy)
        );
    }

    #[test]
    fn test_should_replace_chain() {
        let manager = ConsensusManager::default();
        let oracle = FlatOracle(0.0);
        let short = build_chain(3, 1);
        let long = build_chain(5, 1);

        assert!(manager.should_replace_chain(&short, &long, &oracle));
        assert!(!manager.should_replace_chain(&long, &short, &oracle));

        // Invalid candidate never replaces, regardless of length
        let mut broken = build_chain(6, 1);
        broken[3].hash = "bad".to_string();
        assert!(!manager.should_replace_chain(&short, &broken, &oracle));

        // Equal length falls back to strictly greater work
        assert!(!manager.should_replace_chain(&long.clone(), &long, &oracle));
    }
}
