//! Authoritative unspent-transaction-output set
//!
//! The `UtxoManager` is the sole source of truth for spendable balances.
//! All state lives behind one mutex; every public operation acquires it
//! once and either fully succeeds or fully fails, so the running totals
//! always match the live index.

use crate::core::{OutPoint, Transaction, MAX_SUPPLY};
use crate::crypto::{calculate_merkle_root, sha256};
use crate::utxo::snapshot::{UtxoRecord, UtxoSnapshot};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// UTXO validation errors: caller-correctable input problems,
/// surfaced eagerly at the mutation boundary
#[derive(Error, Debug, PartialEq)]
pub enum UtxoError {
    #[error("Amount is not a finite number")]
    AmountNotFinite,
    #[error("Amount is negative: {0}")]
    AmountNegative(f64),
    #[error("Amount {0} exceeds maximum supply")]
    AmountExceedsSupply(f64),
    #[error("Amount {0} has more than 8 decimal places")]
    AmountPrecision(f64),
    #[error("UTXO {0} already exists")]
    DuplicateOutpoint(OutPoint),
    #[error("Duplicate input {0} within transaction")]
    DuplicateInput(OutPoint),
    #[error("UTXO {0} not found for sender")]
    MissingUtxo(OutPoint),
    #[error("UTXO {0} is already spent")]
    AlreadySpent(OutPoint),
}

/// Validate an amount at the add boundary: finite, non-negative,
/// within the supply cap, at most 8 fractional digits.
pub fn validate_amount(amount: f64) -> Result<(), UtxoError> {
    if amount.is_nan() || amount.is_infinite() {
        return Err(UtxoError::AmountNotFinite);
    }
    if amount < 0.0 {
        return Err(UtxoError::AmountNegative(amount));
    }
    if amount > MAX_SUPPLY {
        return Err(UtxoError::AmountExceedsSupply(amount));
    }
    let scaled = amount * 1e8;
    if (scaled - scaled.round()).abs() > 1e-6 {
        return Err(UtxoError::AmountPrecision(amount));
    }
    Ok(())
}

/// One unspent (or spent-pending-compaction) transaction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub address: String,
    pub amount: f64,
    pub script_pubkey: String,
    pub spent: bool,
}

/// Structured result of a consistency audit
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    pub is_consistent: bool,
    pub count_mismatch: bool,
    pub value_mismatch: bool,
    pub duplicates_found: Vec<OutPoint>,
    pub cached_count: u64,
    pub actual_count: u64,
    pub cached_value: f64,
    pub actual_value: f64,
}

#[derive(Debug, Default)]
struct UtxoState {
    /// Global index for O(1) lookup by `(txid, vout)`
    entries: HashMap<OutPoint, Utxo>,
    /// Per-address outpoints in insertion order
    by_address: HashMap<String, Vec<OutPoint>>,
    /// Outpoints reserved by in-flight transaction builds
    locked: HashSet<OutPoint>,
    /// Running count of unspent entries
    total_utxos: u64,
    /// Running sum of unspent value
    total_value: f64,
}

impl UtxoState {
    fn unspent(&self, outpoint: &OutPoint) -> Option<&Utxo> {
        self.entries.get(outpoint).filter(|u| !u.spent)
    }
}

/// Thread-safe owner of the full UTXO set.
///
/// Share via `Arc`; all operations take `&self` and serialize on the
/// internal lock.
#[derive(Debug, Default)]
pub struct UtxoManager {
    state: Mutex<UtxoState>,
}

/// Confirmed-balance view consumed by consensus validation
pub trait BalanceOracle: Send + Sync {
    /// Spendable (unspent, unlocked) value held by `address`
    fn get_balance(&self, address: &str) -> f64;
}

impl UtxoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new unspent output. Amounts are validated here, never at
    /// read time; the new UTXO is immediately visible to balance queries.
    pub fn add_utxo(
        &self,
        address: &str,
        txid: &str,
        vout: u32,
        amount: f64,
        script_pubkey: &str,
    ) -> Result<(), UtxoError> {
        validate_amount(amount)?;

        let outpoint = OutPoint::new(txid, vout);
        let mut state = self.state.lock();
        if state.entries.contains_key(&outpoint) {
            return Err(UtxoError::DuplicateOutpoint(outpoint));
        }

        state.entries.insert(
            outpoint.clone(),
            Utxo {
                outpoint: outpoint.clone(),
                address: address.to_string(),
                amount,
                script_pubkey: script_pubkey.to_string(),
                spent: false,
            },
        );
        state
            .by_address
            .entry(address.to_string())
            .or_default()
            .push(outpoint);
        state.total_utxos += 1;
        state.total_value += amount;
        Ok(())
    }

    /// Mark a UTXO spent. Returns `false` if it does not exist, belongs
    /// to a different address, or is already spent; among concurrent
    /// callers racing one UTXO exactly one observes `true`.
    pub fn mark_utxo_spent(&self, address: &str, txid: &str, vout: u32) -> bool {
        let outpoint = OutPoint::new(txid, vout);
        let mut state = self.state.lock();
        let Some(utxo) = state.entries.get_mut(&outpoint) else {
            return false;
        };
        if utxo.address != address || utxo.spent {
            return false;
        }
        utxo.spent = true;
        let amount = utxo.amount;
        state.total_utxos -= 1;
        state.total_value -= amount;
        state.locked.remove(&outpoint);
        true
    }

    /// Spendable balance: unspent, non-locked value for the address
    pub fn get_balance(&self, address: &str) -> f64 {
        let state = self.state.lock();
        let Some(outpoints) = state.by_address.get(address) else {
            return 0.0;
        };
        outpoints
            .iter()
            .filter(|op| !state.locked.contains(op))
            .filter_map(|op| state.unspent(op))
            .map(|u| u.amount)
            .sum()
    }

    /// Select unspent, unlocked UTXOs covering `required_amount`, in
    /// per-address insertion order (oldest first). Returns an empty
    /// vector on insufficient funds.
    pub fn find_spendable_utxos(&self, address: &str, required_amount: f64) -> Vec<Utxo> {
        let state = self.state.lock();
        let Some(outpoints) = state.by_address.get(address) else {
            return Vec::new();
        };

        let mut selected = Vec::new();
        let mut gathered = 0.0;
        for op in outpoints {
            if state.locked.contains(op) {
                continue;
            }
            if let Some(utxo) = state.unspent(op) {
                gathered += utxo.amount;
                selected.push(utxo.clone());
                if gathered >= required_amount {
                    return selected;
                }
            }
        }
        Vec::new()
    }

    /// Soft-reserve UTXOs for an in-flight transaction build.
    /// All-or-nothing: if any is unknown, spent, or already locked,
    /// nothing is locked and `false` is returned.
    pub fn lock_utxos(&self, outpoints: &[OutPoint]) -> bool {
        let mut state = self.state.lock();
        let lockable = outpoints
            .iter()
            .all(|op| state.unspent(op).is_some() && !state.locked.contains(op));
        if !lockable {
            return false;
        }
        for op in outpoints {
            state.locked.insert(op.clone());
        }
        true
    }

    /// Release reservations; unlocking a UTXO that is not locked is a no-op
    pub fn unlock_utxos(&self, outpoints: &[OutPoint]) {
        let mut state = self.state.lock();
        for op in outpoints {
            state.locked.remove(op);
        }
    }

    /// Release reservations by `"txid:vout"` string keys
    pub fn unlock_utxos_by_keys(&self, keys: &[String]) {
        let outpoints: Vec<OutPoint> = keys
            .iter()
            .filter_map(|key| {
                let (txid, vout) = key.rsplit_once(':')?;
                Some(OutPoint::new(txid, vout.parse().ok()?))
            })
            .collect();
        self.unlock_utxos(&outpoints);
    }

    /// Create one UTXO per output of the transaction, keyed by the
    /// transaction's own txid and output index.
    ///
    /// Validation (amounts, outpoint collisions) completes before any
    /// output is inserted, so a rejected transaction has zero side
    /// effects.
    pub fn process_transaction_outputs(&self, tx: &Transaction) -> Result<(), UtxoError> {
        let outputs = tx.effective_outputs();
        for output in &outputs {
            validate_amount(output.amount)?;
        }

        let mut state = self.state.lock();
        for vout in 0..outputs.len() {
            let outpoint = OutPoint::new(tx.txid.clone(), vout as u32);
            if state.entries.contains_key(&outpoint) {
                return Err(UtxoError::DuplicateOutpoint(outpoint));
            }
        }

        for (vout, output) in outputs.iter().enumerate() {
            let outpoint = OutPoint::new(tx.txid.clone(), vout as u32);
            state.entries.insert(
                outpoint.clone(),
                Utxo {
                    outpoint: outpoint.clone(),
                    address: output.address.clone(),
                    amount: output.amount,
                    script_pubkey: String::new(),
                    spent: false,
                },
            );
            state
                .by_address
                .entry(output.address.clone())
                .or_default()
                .push(outpoint);
            state.total_utxos += 1;
            state.total_value += output.amount;
        }
        Ok(())
    }

    /// Spend every input of the transaction.
    ///
    /// Privileged transactions are a no-op. Validation (duplicate
    /// inputs, existence, unspent, ownership) completes before any UTXO
    /// is marked, so a rejected transaction has zero side effects.
    pub fn process_transaction_inputs(&self, tx: &Transaction) -> Result<(), UtxoError> {
        if tx.is_privileged() {
            return Ok(());
        }
        if let Some(dup) = tx.duplicate_input() {
            return Err(UtxoError::DuplicateInput(dup.clone()));
        }

        let mut state = self.state.lock();
        for op in &tx.inputs {
            match state.entries.get(op) {
                None => return Err(UtxoError::MissingUtxo(op.clone())),
                Some(utxo) if utxo.spent => return Err(UtxoError::AlreadySpent(op.clone())),
                Some(utxo) if utxo.address != tx.sender => {
                    return Err(UtxoError::MissingUtxo(op.clone()))
                }
                Some(_) => {}
            }
        }

        for op in &tx.inputs {
            if let Some(utxo) = state.entries.get_mut(op) {
                utxo.spent = true;
                let amount = utxo.amount;
                state.total_utxos -= 1;
                state.total_value -= amount;
                state.locked.remove(op);
            }
        }
        Ok(())
    }

    /// Full deep copy of the set for checkpointing and rollback
    pub fn snapshot(&self) -> UtxoSnapshot {
        let state = self.state.lock();
        let mut snapshot = UtxoSnapshot::default();
        for (address, outpoints) in &state.by_address {
            let records = outpoints
                .iter()
                .filter_map(|op| state.entries.get(op))
                .map(|u| UtxoRecord {
                    txid: u.outpoint.txid.clone(),
                    vout: u.outpoint.vout,
                    amount: u.amount,
                    script_pubkey: u.script_pubkey.clone(),
                    spent: u.spent,
                })
                .collect();
            snapshot.accounts.insert(address.clone(), records);
        }
        snapshot
    }

    /// Replace the entire set with the snapshot's contents.
    /// Totals are recomputed from the restored entries.
    pub fn restore(&self, snapshot: &UtxoSnapshot) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.by_address.clear();
        state.locked.clear();
        state.total_utxos = 0;
        state.total_value = 0.0;

        for (address, records) in &snapshot.accounts {
            for record in records {
                let outpoint = OutPoint::new(record.txid.clone(), record.vout);
                state.entries.insert(
                    outpoint.clone(),
                    Utxo {
                        outpoint: outpoint.clone(),
                        address: address.clone(),
                        amount: record.amount,
                        script_pubkey: record.script_pubkey.clone(),
                        spent: record.spent,
                    },
                );
                state
                    .by_address
                    .entry(address.clone())
                    .or_default()
                    .push(outpoint);
                if !record.spent {
                    state.total_utxos += 1;
                    state.total_value += record.amount;
                }
            }
        }
        log::info!(
            "Restored UTXO set: {} unspent entries, total value {}",
            state.total_utxos,
            state.total_value
        );
    }

    /// Deterministic hash over the full set contents: identical across
    /// repeated calls on unchanged state, different after any add/spend.
    pub fn calculate_merkle_root(&self) -> String {
        let state = self.state.lock();
        let mut leaves: Vec<String> = state
            .entries
            .values()
            .map(|u| {
                format!(
                    "{}|{}|{}|{}|{}",
                    u.address, u.outpoint.txid, u.outpoint.vout, u.amount, u.spent
                )
            })
            .collect();
        leaves.sort();
        let hashes: Vec<Vec<u8>> = leaves.iter().map(|l| sha256(l.as_bytes())).collect();
        hex::encode(calculate_merkle_root(&hashes))
    }

    /// Recompute count and value from the live index and compare against
    /// the cached running totals; also detect duplicate outpoints in the
    /// per-address listings.
    pub fn verify_utxo_consistency(&self) -> ConsistencyReport {
        let state = self.state.lock();

        let actual_count = state.entries.values().filter(|u| !u.spent).count() as u64;
        let actual_value: f64 = state
            .entries
            .values()
            .filter(|u| !u.spent)
            .map(|u| u.amount)
            .sum();

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for op in state.by_address.values().flatten() {
            if !seen.insert(op.clone()) {
                duplicates.push(op.clone());
            }
        }

        let count_mismatch = actual_count != state.total_utxos;
        let value_mismatch = (actual_value - state.total_value).abs() > 1e-8;

        ConsistencyReport {
            is_consistent: !count_mismatch && !value_mismatch && duplicates.is_empty(),
            count_mismatch,
            value_mismatch,
            duplicates_found: duplicates,
            cached_count: state.total_utxos,
            actual_count,
            cached_value: state.total_value,
            actual_value,
        }
    }

    /// Physically remove spent entries. Unspent entries and balances are
    /// untouched. Returns the number removed.
    pub fn compact_utxo_set(&self) -> usize {
        let mut state = self.state.lock();
        let spent: Vec<OutPoint> = state
            .entries
            .values()
            .filter(|u| u.spent)
            .map(|u| u.outpoint.clone())
            .collect();

        for op in &spent {
            state.entries.remove(op);
            state.locked.remove(op);
        }
        for outpoints in state.by_address.values_mut() {
            outpoints.retain(|op| !spent.contains(op));
        }
        state.by_address.retain(|_, ops| !ops.is_empty());

        if !spent.is_empty() {
            log::debug!("Compacted UTXO set: removed {} spent entries", spent.len());
        }
        spent.len()
    }

    /// Running count of unspent entries
    pub fn total_utxos(&self) -> u64 {
        self.state.lock().total_utxos
    }

    /// Running sum of unspent value
    pub fn total_value(&self) -> f64 {
        self.state.lock().total_value
    }
}

impl BalanceOracle for UtxoManager {
    fn get_balance(&self, address: &str) -> f64 {
        UtxoManager::get_balance(self, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TxOutput;
    use std::sync::Arc;
    use std::thread;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn seeded_manager() -> UtxoManager {
        let manager = UtxoManager::new();
        manager.add_utxo("addr1", "tx001", 0, 100.0, "").unwrap();
        manager.add_utxo("addr1", "tx002", 0, 25.0, "").unwrap();
        manager.add_utxo("addr2", "tx003", 1, 10.0, "").unwrap();
        manager
    }

    #[test]
    fn test_add_rejects_bad_amounts() {
        let manager = UtxoManager::new();
        assert_eq!(
            manager.add_utxo("a", "t", 0, f64::NAN, ""),
            Err(UtxoError::AmountNotFinite)
        );
        assert_eq!(
            manager.add_utxo("a", "t", 0, f64::INFINITY, ""),
            Err(UtxoError::AmountNotFinite)
        );
        assert_eq!(
            manager.add_utxo("a", "t", 0, -1.0, ""),
            Err(UtxoError::AmountNegative(-1.0))
        );
        assert!(matches!(
            manager.add_utxo("a", "t", 0, MAX_SUPPLY + 1.0, ""),
            Err(UtxoError::AmountExceedsSupply(_))
        ));
        assert!(matches!(
            manager.add_utxo("a", "t", 0, 0.123456789, ""),
            Err(UtxoError::AmountPrecision(_))
        ));
        // Nothing was admitted
        assert_eq!(manager.total_utxos(), 0);
    }

    #[test]
    fn test_double_spend_excluded() {
        let manager = UtxoManager::new();
        manager.add_utxo("ADDR1", "tx001", 0, 100.0, "").unwrap();

        assert!(manager.mark_utxo_spent("ADDR1", "tx001", 0));
        assert!(!manager.mark_utxo_spent("ADDR1", "tx001", 0));
        assert_eq!(manager.get_balance("ADDR1"), 0.0);
    }

    #[test]
    fn test_spend_wrong_address_fails() {
        let manager = seeded_manager();
        assert!(!manager.mark_utxo_spent("addr2", "tx001", 0));
        assert_eq!(manager.get_balance("addr1"), 125.0);
    }

    #[test]
    fn test_balance_unknown_address() {
        let manager = seeded_manager();
        assert_eq!(manager.get_balance("nobody"), 0.0);
    }

    #[test]
    fn test_find_spendable_utxos() {
        let manager = seeded_manager();

        let picked = manager.find_spendable_utxos("addr1", 110.0);
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().map(|u| u.amount).sum::<f64>() >= 110.0);

        // Insufficient funds yields an empty selection
        assert!(manager.find_spendable_utxos("addr1", 1000.0).is_empty());
        // Selection order is insertion order
        assert_eq!(picked[0].outpoint, OutPoint::new("tx001", 0));
    }

    #[test]
    fn test_lock_unlock_semantics() {
        let manager = seeded_manager();
        let op = OutPoint::new("tx001", 0);

        assert!(manager.lock_utxos(std::slice::from_ref(&op)));
        // Locking an already-locked UTXO fails
        assert!(!manager.lock_utxos(std::slice::from_ref(&op)));
        // Locked value is excluded from balance and selection
        assert_eq!(manager.get_balance("addr1"), 25.0);
        assert!(manager.find_spendable_utxos("addr1", 50.0).is_empty());

        // Unlock is idempotent
        manager.unlock_utxos(std::slice::from_ref(&op));
        manager.unlock_utxos(std::slice::from_ref(&op));
        assert_eq!(manager.get_balance("addr1"), 125.0);
    }

    #[test]
    fn test_unlock_by_keys() {
        let manager = seeded_manager();
        let op = OutPoint::new("tx002", 0);
        assert!(manager.lock_utxos(std::slice::from_ref(&op)));

        manager.unlock_utxos_by_keys(&["tx002:0".to_string()]);
        assert_eq!(manager.get_balance("addr1"), 125.0);
    }

    #[test]
    fn test_process_outputs_then_inputs() {
        let manager = UtxoManager::new();
        let coinbase = Transaction::coinbase("alice", 50.0);
        manager.process_transaction_outputs(&coinbase).unwrap();
        assert_eq!(manager.get_balance("alice"), 50.0);

        let mut transfer = Transaction::transfer("alice", "bob", 50.0, 0.0);
        transfer.inputs = vec![OutPoint::new(coinbase.txid.clone(), 0)];
        manager.process_transaction_inputs(&transfer).unwrap();
        manager.process_transaction_outputs(&transfer).unwrap();

        assert_eq!(manager.get_balance("alice"), 0.0);
        assert_eq!(manager.get_balance("bob"), 50.0);
        assert!(manager.verify_utxo_consistency().is_consistent);
    }

    #[test]
    fn test_process_outputs_invalid_rejected_without_side_effects() {
        let manager = UtxoManager::new();
        let mut tx = Transaction::transfer("alice", "bob", 10.0, 0.0);
        tx.outputs = vec![
            TxOutput {
                address: "bob".to_string(),
                amount: 10.0,
            },
            TxOutput {
                address: "carol".to_string(),
                amount: f64::NAN,
            },
        ];

        assert_eq!(
            manager.process_transaction_outputs(&tx),
            Err(UtxoError::AmountNotFinite)
        );
        // The valid first output was not committed
        assert_eq!(manager.get_balance("bob"), 0.0);
        assert_eq!(manager.total_utxos(), 0);
        assert!(manager.verify_utxo_consistency().is_consistent);
    }

    #[test]
    fn test_process_outputs_outpoint_collision_rejected_atomically() {
        let manager = UtxoManager::new();
        let coinbase = Transaction::coinbase("alice", 50.0);
        manager.process_transaction_outputs(&coinbase).unwrap();

        // Replaying the same transaction collides on (txid, 0)
        assert!(matches!(
            manager.process_transaction_outputs(&coinbase),
            Err(UtxoError::DuplicateOutpoint(_))
        ));
        assert_eq!(manager.get_balance("alice"), 50.0);
        assert_eq!(manager.total_utxos(), 1);
    }

    #[test]
    fn test_process_inputs_duplicate_rejected_without_side_effects() {
        let manager = seeded_manager();
        let mut tx = Transaction::transfer("addr1", "bob", 100.0, 0.0);
        tx.inputs = vec![OutPoint::new("tx001", 0), OutPoint::new("tx001", 0)];

        assert!(matches!(
            manager.process_transaction_inputs(&tx),
            Err(UtxoError::DuplicateInput(_))
        ));
        assert_eq!(manager.get_balance("addr1"), 125.0);
    }

    #[test]
    fn test_process_inputs_missing_rejected_atomically() {
        let manager = seeded_manager();
        let mut tx = Transaction::transfer("addr1", "bob", 125.0, 0.0);
        tx.inputs = vec![OutPoint::new("tx001", 0), OutPoint::new("ghost", 0)];

        assert!(matches!(
            manager.process_transaction_inputs(&tx),
            Err(UtxoError::MissingUtxo(_))
        ));
        // The existing input was not marked spent
        assert_eq!(manager.get_balance("addr1"), 125.0);
    }

    #[test]
    fn test_privileged_inputs_noop() {
        let manager = UtxoManager::new();
        let coinbase = Transaction::coinbase("miner", 50.0);
        assert!(manager.process_transaction_inputs(&coinbase).is_ok());
    }

    #[test]
    fn test_snapshot_round_trip() {
        init_logs();
        let manager = seeded_manager();
        manager.mark_utxo_spent("addr2", "tx003", 1);

        let before_count = manager.total_utxos();
        let before_value = manager.total_value();
        let snapshot = manager.snapshot();

        manager.restore(&snapshot);
        assert_eq!(manager.total_utxos(), before_count);
        assert!((manager.total_value() - before_value).abs() < 1e-8);
        assert_eq!(manager.get_balance("addr1"), 125.0);
        assert_eq!(manager.get_balance("addr2"), 0.0);
        assert!(manager.verify_utxo_consistency().is_consistent);
    }

    #[test]
    fn test_merkle_root_deterministic() {
        let manager = seeded_manager();
        let root1 = manager.calculate_merkle_root();
        let root2 = manager.calculate_merkle_root();
        assert_eq!(root1, root2);

        manager.mark_utxo_spent("addr1", "tx001", 0);
        assert_ne!(manager.calculate_merkle_root(), root1);
    }

    #[test]
    fn test_compact_removes_only_spent() {
        let manager = seeded_manager();
        manager.mark_utxo_spent("addr1", "tx001", 0);

        assert_eq!(manager.compact_utxo_set(), 1);
        assert_eq!(manager.get_balance("addr1"), 25.0);
        assert_eq!(manager.total_utxos(), 2);
        // Idempotent once clean
        assert_eq!(manager.compact_utxo_set(), 0);
    }

    #[test]
    fn test_consistency_report_fields() {
        let manager = seeded_manager();
        let report = manager.verify_utxo_consistency();
        assert!(report.is_consistent);
        assert!(!report.count_mismatch);
        assert!(!report.value_mismatch);
        assert!(report.duplicates_found.is_empty());
        assert_eq!(report.actual_count, 3);
    }

    #[test]
    fn test_concurrent_spend_exactly_one_winner() {
        init_logs();
        let manager = Arc::new(UtxoManager::new());
        manager.add_utxo("addr1", "tx001", 0, 100.0, "").unwrap();
        manager.add_utxo("addr1", "tx002", 0, 40.0, "").unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let manager = Arc::clone(&manager);
            handles.push(thread::spawn(move || {
                manager.mark_utxo_spent("addr1", "tx001", 0)
            }));
        }
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| **r).count(), 1);
        assert_eq!(results.iter().filter(|r| !**r).count(), 9);
        assert_eq!(manager.get_balance("addr1"), 40.0);
        assert!(manager.verify_utxo_consistency().is_consistent);
    }
}
