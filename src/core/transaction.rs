//! Transaction model for the UTXO ledger
//!
//! Transactions reference previously created outputs by `(txid, vout)` and
//! create new addressed outputs. Privileged kinds (coinbase, system,
//! airdrop) mint value and bypass signature and balance checks.

use crate::crypto::{public_key_from_hex, sha256, verify_signature, KeyError, KeyPair};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hard cap on total coin supply
pub const MAX_SUPPLY: f64 = 21_000_000.0;

/// Maximum fractional digits an amount may carry
pub const AMOUNT_DECIMALS: u32 = 8;

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Transaction is not signed")]
    Unsigned,
    #[error("Duplicate input {0} within transaction")]
    DuplicateInput(OutPoint),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// The privilege class of a transaction sender.
///
/// Privileged kinds create value by fiat and are exempt from signature
/// and balance validation; `Normal` transfers must prove ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    #[default]
    Normal,
    Coinbase,
    System,
    Airdrop,
}

impl TxKind {
    /// Privileged kinds bypass signature and balance checks
    pub fn is_privileged(&self) -> bool {
        !matches!(self, TxKind::Normal)
    }
}

/// Reference to a previously created output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction that created the output
    pub txid: String,
    /// Index of the output within that transaction
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: impl Into<String>, vout: u32) -> Self {
        Self {
            txid: txid.into(),
            vout,
        }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// A newly created output: amount locked to an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: String,
    pub amount: f64,
}

/// A ledger transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (hash of transaction data)
    pub txid: String,
    /// Privilege class of the sender
    #[serde(default)]
    pub kind: TxKind,
    /// Sender address (ignored for balance checks on privileged kinds)
    pub sender: String,
    /// Recipient address
    pub recipient: String,
    /// Transferred amount
    pub amount: f64,
    /// Fee paid to the miner
    #[serde(default)]
    pub fee: f64,
    /// Creation time (Unix seconds)
    pub timestamp: i64,
    /// Spent outputs, empty for privileged transactions
    #[serde(default)]
    pub inputs: Vec<OutPoint>,
    /// Created outputs; empty means the single sender→recipient transfer
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
    /// Hex-encoded ECDSA signature over `signing_data`
    #[serde(default)]
    pub signature: String,
    /// Hex-encoded compressed public key of the sender
    #[serde(default)]
    pub public_key: String,
}

impl Transaction {
    /// Create an unsigned transfer between two addresses
    pub fn transfer(sender: &str, recipient: &str, amount: f64, fee: f64) -> Self {
        let mut tx = Self {
            txid: String::new(),
            kind: TxKind::Normal,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
            fee,
            timestamp: Utc::now().timestamp(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            signature: String::new(),
            public_key: String::new(),
        };
        tx.txid = tx.calculate_txid();
        tx
    }

    /// Create a coinbase (mining reward) transaction
    pub fn coinbase(recipient: &str, amount: f64) -> Self {
        Self::privileged(TxKind::Coinbase, recipient, amount)
    }

    /// Create a privileged (coinbase/system/airdrop) transaction
    pub fn privileged(kind: TxKind, recipient: &str, amount: f64) -> Self {
        let sender = match kind {
            TxKind::Coinbase => "COINBASE",
            TxKind::System => "SYSTEM",
            TxKind::Airdrop => "AIRDROP",
            TxKind::Normal => "",
        };
        let mut tx = Self {
            txid: String::new(),
            kind,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
            fee: 0.0,
            timestamp: Utc::now().timestamp(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            signature: String::new(),
            public_key: String::new(),
        };
        tx.txid = tx.calculate_txid();
        tx
    }

    /// Whether this transaction bypasses signature and balance checks
    pub fn is_privileged(&self) -> bool {
        self.kind.is_privileged()
    }

    /// Calculate the transaction ID from its content
    pub fn calculate_txid(&self) -> String {
        let data = format!(
            "{:?}|{}|{}|{}|{}|{}|{:?}|{:?}",
            self.kind,
            self.sender,
            self.recipient,
            self.amount,
            self.fee,
            self.timestamp,
            self.inputs,
            self.outputs,
        );
        hex::encode(sha256(data.as_bytes()))
    }

    /// The digest covered by the sender's signature
    pub fn signing_data(&self) -> Vec<u8> {
        let data = format!(
            "{:?}|{}|{}|{}|{}|{}|{:?}|{:?}",
            self.kind,
            self.sender,
            self.recipient,
            self.amount,
            self.fee,
            self.timestamp,
            self.inputs,
            self.outputs,
        );
        sha256(data.as_bytes())
    }

    /// Sign the transaction with the sender's key pair
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<(), TransactionError> {
        let signature = key_pair.sign(&self.signing_data())?;
        self.signature = hex::encode(signature);
        self.public_key = key_pair.public_key_hex();
        self.txid = self.calculate_txid();
        Ok(())
    }

    /// Verify the signature against the embedded public key.
    ///
    /// Privileged transactions always verify; unsigned normal
    /// transactions verify as `false`.
    pub fn verify_signature(&self) -> Result<bool, TransactionError> {
        if self.is_privileged() {
            return Ok(true);
        }
        if self.signature.is_empty() || self.public_key.is_empty() {
            return Ok(false);
        }

        let public_key = public_key_from_hex(&self.public_key)?;
        let signature =
            hex::decode(&self.signature).map_err(|_| TransactionError::InvalidSignature)?;
        Ok(verify_signature(
            &public_key,
            &self.signing_data(),
            &signature,
        )?)
    }

    /// Find the first input referenced more than once, if any
    pub fn duplicate_input(&self) -> Option<&OutPoint> {
        let mut seen = std::collections::HashSet::new();
        self.inputs.iter().find(|op| !seen.insert(*op))
    }

    /// The outputs this transaction creates.
    ///
    /// Multi-output transactions list them explicitly; the plain
    /// sender→recipient form synthesizes a single output.
    pub fn effective_outputs(&self) -> Vec<TxOutput> {
        if !self.outputs.is_empty() {
            return self.outputs.clone();
        }
        vec![TxOutput {
            address: self.recipient.clone(),
            amount: self.amount,
        }]
    }

    /// Serialized size in bytes (JSON, the ledger's accounting unit)
    pub fn serialized_size(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }

    /// Total value of created outputs
    pub fn total_output(&self) -> f64 {
        self.effective_outputs().iter().map(|o| o.amount).sum()
    }
}
