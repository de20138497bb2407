//! UTXO set management
//!
//! The authoritative unspent-output set with spend/lock/snapshot
//! semantics, plus the serialized snapshot format checkpoints consume.

pub mod manager;
pub mod snapshot;

pub use manager::{
    validate_amount, BalanceOracle, ConsistencyReport, Utxo, UtxoError, UtxoManager,
};
pub use snapshot::{UtxoRecord, UtxoSnapshot};
