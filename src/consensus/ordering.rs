//! Canonical intra-block transaction ordering
//!
//! Coinbase first, then fee descending, timestamp ascending, and
//! lexicographic txid as the final tiebreak.

use crate::core::Transaction;
use std::cmp::Ordering;
use thiserror::Error;

/// Violations of the canonical order
#[derive(Error, Debug, PartialEq)]
pub enum OrderingError {
    #[error("First transaction must be coinbase")]
    MissingCoinbase,
    #[error("Privileged transaction at position {0} must lead the block")]
    MisplacedCoinbase(usize),
    #[error("Fee order violated at position {0}: fees must be non-increasing")]
    FeeOrder(usize),
    #[error("Timestamp order violated at position {0}: equal-fee transactions must be time-ordered")]
    TimestampOrder(usize),
}

/// The canonical comparator for non-coinbase transactions
fn canonical_cmp(a: &Transaction, b: &Transaction) -> Ordering {
    b.fee
        .partial_cmp(&a.fee)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.txid.cmp(&b.txid))
}

/// Sort a block's transactions into canonical order: coinbase leads,
/// the rest by descending fee / ascending timestamp / ascending txid.
pub fn sort_block_transactions(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| match (a.is_privileged(), b.is_privileged()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => canonical_cmp(a, b),
    });
}

/// Check that a transaction list already satisfies the canonical
/// relation: coinbase first, fee non-increasing, and among equal fees
/// timestamps non-decreasing.
pub fn validate_transaction_order(transactions: &[Transaction]) -> Result<(), OrderingError> {
    if transactions.is_empty() {
        return Ok(());
    }
    if !transactions[0].is_privileged() {
        return Err(OrderingError::MissingCoinbase);
    }

    let rest = &transactions[1..];
    for (offset, tx) in rest.iter().enumerate() {
        let pos = offset + 1;
        if tx.is_privileged() {
            return Err(OrderingError::MisplacedCoinbase(pos));
        }
        if offset == 0 {
            continue;
        }
        let prev = &rest[offset - 1];
        if tx.fee > prev.fee {
            return Err(OrderingError::FeeOrder(pos));
        }
        if tx.fee == prev.fee && tx.timestamp < prev.timestamp {
            return Err(OrderingError::TimestampOrder(pos));
        }
    }
    Ok(())
}
