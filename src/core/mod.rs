//! Core data model
//!
//! This module contains the fundamental building blocks:
//! - Transactions (outpoint inputs, addressed outputs, privileged kinds)
//! - Blocks (proof of work over leading zero hex digits)

pub mod block;
pub mod transaction;

pub use block::{genesis_prev_hash, Block, BLOCK_VERSION, SUPPORTED_BLOCK_VERSIONS};
pub use transaction::{
    OutPoint, Transaction, TransactionError, TxKind, TxOutput, AMOUNT_DECIMALS, MAX_SUPPLY,
};
