//! Serialized UTXO-set snapshot format
//!
//! The wire format is `{address: [{txid, vout, amount, script_pubkey,
//! spent}, ...]}`, the shape consumed by checkpoints and restore.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One serialized output entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub txid: String,
    pub vout: u32,
    pub amount: f64,
    #[serde(default)]
    pub script_pubkey: String,
    #[serde(default)]
    pub spent: bool,
}

/// A full dump of the UTXO set, keyed by owning address.
///
/// `BTreeMap` keeps the serialized form deterministic; per-address entry
/// order is the manager's insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtxoSnapshot {
    pub accounts: BTreeMap<String, Vec<UtxoRecord>>,
}

impl UtxoSnapshot {
    /// Number of entries across all addresses, spent included
    pub fn len(&self) -> usize {
        self.accounts.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.values().all(|v| v.is_empty())
    }

    /// Sum of unspent amounts across the snapshot
    pub fn unspent_value(&self) -> f64 {
        self.accounts
            .values()
            .flatten()
            .filter(|r| !r.spent)
            .map(|r| r.amount)
            .sum()
    }
}
