//! Block implementation for the ledger
//!
//! A block carries a flat header (index, linkage, merkle root, timestamp,
//! proof-of-work fields) plus an ordered transaction list. Hashes are
//! double SHA-256 over the header fields; proof of work counts leading
//! zero hex digits against the declared difficulty.

use crate::core::transaction::Transaction;
use crate::crypto::{calculate_merkle_root, double_sha256_hex, meets_difficulty};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current block header version
pub const BLOCK_VERSION: u32 = 1;

/// Header versions the validator accepts
pub const SUPPORTED_BLOCK_VERSIONS: [u32; 1] = [BLOCK_VERSION];

/// The `previous_hash` sentinel carried by the genesis block
pub fn genesis_prev_hash() -> String {
    "0".repeat(64)
}

/// A block in the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Block height; genesis is 0 and heights are strictly sequential
    pub index: u64,
    /// Header version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Hash of the parent block (64-zero sentinel for genesis)
    pub previous_hash: String,
    /// Self hash; must match recomputation and satisfy proof of work
    pub hash: String,
    /// Merkle root over the transaction IDs
    pub merkle_root: String,
    /// Creation time (Unix seconds)
    pub timestamp: i64,
    /// Proof-of-work nonce
    pub nonce: u64,
    /// Required leading zero hex digits in `hash`
    pub difficulty: u32,
    /// Optional miner signature over the block hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Optional miner public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner_pubkey: Option<String>,
    /// Ordered transaction list
    pub transactions: Vec<Transaction>,
}

fn default_version() -> u32 {
    BLOCK_VERSION
}

impl Block {
    /// Create a new unmined block on top of a parent
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
    ) -> Self {
        let merkle_root = Self::merkle_root_of(&transactions);
        let mut block = Self {
            index,
            version: BLOCK_VERSION,
            previous_hash,
            hash: String::new(),
            merkle_root,
            timestamp: Utc::now().timestamp(),
            nonce: 0,
            difficulty,
            signature: None,
            miner_pubkey: None,
            transactions,
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Create and mine the genesis block
    pub fn genesis(difficulty: u32) -> Self {
        let coinbase = Transaction::coinbase("genesis", 0.0);
        let mut block = Self::new(0, genesis_prev_hash(), vec![coinbase], difficulty);
        block.mine();
        block
    }

    /// Merkle root over the transaction IDs
    pub fn merkle_root_of(transactions: &[Transaction]) -> String {
        let tx_hashes: Vec<Vec<u8>> = transactions
            .iter()
            .filter_map(|tx| hex::decode(&tx.txid).ok())
            .collect();
        hex::encode(calculate_merkle_root(&tx_hashes))
    }

    /// Recompute the block hash from the header fields
    pub fn calculate_hash(&self) -> String {
        let data = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.version,
            self.index,
            self.previous_hash,
            self.merkle_root,
            self.timestamp,
            self.difficulty,
            self.nonce
        );
        double_sha256_hex(data.as_bytes())
    }

    /// Mine the block: search for a nonce whose hash meets the difficulty.
    /// Returns the number of attempts.
    pub fn mine(&mut self) -> u64 {
        let mut attempts = 0u64;
        loop {
            self.nonce = attempts;
            self.hash = self.calculate_hash();
            if self.is_valid_pow() {
                return attempts;
            }
            attempts += 1;
            if attempts == u64::MAX {
                return attempts;
            }
        }
    }

    /// Check the stored hash satisfies the declared difficulty
    pub fn is_valid_pow(&self) -> bool {
        meets_difficulty(&self.hash, self.difficulty)
    }

    /// Check the stored hash matches recomputation
    pub fn verify_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    /// Check the stored merkle root matches the transaction list
    pub fn verify_merkle_root(&self) -> bool {
        self.merkle_root == Self::merkle_root_of(&self.transactions)
    }

    /// The coinbase transaction, if the block leads with one
    pub fn coinbase_tx(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_privileged())
    }

    /// Sum of fees over non-privileged transactions
    pub fn total_fees(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|tx| !tx.is_privileged())
            .map(|tx| tx.fee)
            .sum()
    }

    /// Serialized size in bytes (JSON, the ledger's accounting unit)
    pub fn serialized_size(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }

    /// Number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}
