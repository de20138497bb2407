//! Filesystem checkpoints
//!
//! Periodic chain-state snapshots written as `cp_<height>.json` files.
//! Writes are atomic (temp file, read-back verification, rename) and
//! retention is two-phase: expired checkpoints are moved into a
//! `pruned/` archive, never hard-deleted.

use crate::core::Block;
use crate::crypto::sha256_hex;
use crate::utxo::{UtxoManager, UtxoSnapshot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Checkpoint I/O and integrity errors
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Checkpoint hash mismatch at height {height}")]
    HashMismatch { height: u64 },
    #[error("Checkpoint write verification failed at height {height}")]
    WriteVerification { height: u64 },
}

/// A self-verifying chain-state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Height of the checkpointed block
    pub height: u64,
    /// Hash of the checkpointed block
    pub block_hash: String,
    /// Parent hash of the checkpointed block
    pub previous_hash: String,
    /// Full UTXO set at this height
    pub utxo_snapshot: UtxoSnapshot,
    /// Block timestamp
    pub timestamp: i64,
    /// Block difficulty
    pub difficulty: u32,
    /// Circulating supply at this height
    pub total_supply: f64,
    /// Block merkle root
    pub merkle_root: String,
    /// Block nonce
    pub nonce: u64,
    /// SHA-256 over the scalar fields; recomputed and compared on load
    pub checkpoint_hash: String,
}

impl Checkpoint {
    /// Build a checkpoint from a block and the current UTXO set
    pub fn new(block: &Block, utxo_snapshot: UtxoSnapshot, total_supply: f64) -> Self {
        let mut checkpoint = Self {
            height: block.index,
            block_hash: block.hash.clone(),
            previous_hash: block.previous_hash.clone(),
            utxo_snapshot,
            timestamp: block.timestamp,
            difficulty: block.difficulty,
            total_supply,
            merkle_root: block.merkle_root.clone(),
            nonce: block.nonce,
            checkpoint_hash: String::new(),
        };
        checkpoint.checkpoint_hash = checkpoint.calculate_hash();
        checkpoint
    }

    /// Hash over the scalar fields; the UTXO snapshot is covered
    /// indirectly through `total_supply` and the block linkage.
    pub fn calculate_hash(&self) -> String {
        let data = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.height,
            self.block_hash,
            self.previous_hash,
            self.timestamp,
            self.difficulty,
            self.total_supply,
            self.merkle_root,
            self.nonce
        );
        sha256_hex(data.as_bytes())
    }

    /// Check the stored hash matches recomputation
    pub fn verify(&self) -> Result<(), CheckpointError> {
        if self.checkpoint_hash != self.calculate_hash() {
            return Err(CheckpointError::HashMismatch {
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Checkpoint cadence and retention
#[derive(Debug, Clone)]
pub struct CheckpointConfig {
    /// Directory holding `cp_<height>.json` files
    pub data_dir: PathBuf,
    /// Blocks between checkpoints
    pub interval: u64,
    /// How many recent checkpoints to keep on the hot path
    pub retention: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".checkpoints"),
            interval: 100,
            retention: 5,
        }
    }
}

/// Manages the checkpoint directory
#[derive(Debug)]
pub struct CheckpointManager {
    config: CheckpointConfig,
    /// Height of the newest checkpoint on disk
    latest_height: Option<u64>,
}

impl CheckpointManager {
    /// Open (creating if needed) the checkpoint directory and scan it
    /// for existing checkpoints.
    pub fn new(config: CheckpointConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.data_dir)?;
        let mut manager = Self {
            config,
            latest_height: None,
        };
        manager.latest_height = manager.scan_heights()?.last().copied();
        Ok(manager)
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    fn checkpoint_path(&self, height: u64) -> PathBuf {
        self.config.data_dir.join(format!("cp_{}.json", height))
    }

    fn pruned_dir(&self) -> PathBuf {
        self.config.data_dir.join("pruned")
    }

    /// Heights with a checkpoint file present, ascending
    fn scan_heights(&self) -> Result<Vec<u64>, CheckpointError> {
        let mut heights = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(height) = name
                .strip_prefix("cp_")
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|digits| digits.parse().ok())
            {
                heights.push(height);
            }
        }
        heights.sort_unstable();
        Ok(heights)
    }

    /// Whether `height` sits on a checkpoint boundary
    pub fn should_create_checkpoint(&self, height: u64) -> bool {
        height > 0 && height % self.config.interval == 0
    }

    /// Snapshot chain state at `block` and write it atomically. The
    /// previous file at this height (if any) survives as `.backup`
    /// until the new write is verified.
    pub fn create_checkpoint(
        &mut self,
        block: &Block,
        utxos: &UtxoManager,
        total_supply: f64,
    ) -> Result<Checkpoint, CheckpointError> {
        let checkpoint = Checkpoint::new(block, utxos.snapshot(), total_supply);
        let path = self.checkpoint_path(checkpoint.height);
        let temp_path = path.with_extension("json.tmp");
        let backup_path = path.with_extension("json.backup");

        if path.exists() {
            fs::rename(&path, &backup_path)?;
        }

        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &checkpoint)?;
        writer.flush()?;

        // Read back before the rename so a torn write never replaces
        // the previous checkpoint
        let verified = Self::read_checkpoint(&temp_path).is_some();
        if !verified {
            let _ = fs::remove_file(&temp_path);
            if backup_path.exists() {
                fs::rename(&backup_path, &path)?;
            }
            return Err(CheckpointError::WriteVerification {
                height: checkpoint.height,
            });
        }

        fs::rename(&temp_path, &path)?;
        if backup_path.exists() {
            fs::remove_file(&backup_path)?;
        }

        self.latest_height = Some(
            self.latest_height
                .map_or(checkpoint.height, |h| h.max(checkpoint.height)),
        );
        log::info!(
            "Checkpoint created at height {} ({})",
            checkpoint.height,
            checkpoint.block_hash
        );

        self.prune_old_checkpoints()?;
        Ok(checkpoint)
    }

    /// Parse and hash-verify a checkpoint file. Corrupt or tampered
    /// files are logged and treated as absent.
    fn read_checkpoint(path: &Path) -> Option<Checkpoint> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(_) => return None,
        };
        let checkpoint: Checkpoint = match serde_json::from_reader(BufReader::new(file)) {
            Ok(cp) => cp,
            Err(e) => {
                log::warn!("Ignoring corrupt checkpoint {}: {}", path.display(), e);
                return None;
            }
        };
        if let Err(e) = checkpoint.verify() {
            log::warn!("Ignoring tampered checkpoint {}: {}", path.display(), e);
            return None;
        }
        Some(checkpoint)
    }

    /// Load the checkpoint at `height`, if present and intact
    pub fn load_checkpoint(&self, height: u64) -> Option<Checkpoint> {
        Self::read_checkpoint(&self.checkpoint_path(height))
    }

    /// Load the newest intact checkpoint, walking backwards past any
    /// corrupt files.
    pub fn load_latest_checkpoint(&self) -> Option<Checkpoint> {
        let heights = self.scan_heights().ok()?;
        heights
            .iter()
            .rev()
            .find_map(|&height| self.load_checkpoint(height))
    }

    /// Height of the newest checkpoint on disk
    pub fn latest_height(&self) -> Option<u64> {
        self.latest_height
    }

    /// Whether `height` lies strictly below the latest checkpoint
    pub fn is_before_checkpoint(&self, height: u64) -> bool {
        self.latest_height.is_some_and(|latest| height < latest)
    }

    /// Move checkpoints beyond the retention window into `pruned/`
    pub fn prune_old_checkpoints(&mut self) -> Result<(), CheckpointError> {
        let heights = self.scan_heights()?;
        if heights.len() <= self.config.retention {
            return Ok(());
        }

        let pruned_dir = self.pruned_dir();
        fs::create_dir_all(&pruned_dir)?;

        let excess = heights.len() - self.config.retention;
        for &height in heights.iter().take(excess) {
            let from = self.checkpoint_path(height);
            let to = pruned_dir.join(format!("cp_{}.json", height));
            fs::rename(&from, &to)?;
            log::debug!("Checkpoint at height {} moved to archive", height);
        }
        Ok(())
    }

    /// Cross-check a local checkpoint against peer reports. Confirmed
    /// when at least `quorum` of the peers that reported this height
    /// agree on both hashes; with no reports there is nothing to
    /// contradict, so the checkpoint stands.
    pub fn verify_with_peers(
        checkpoint: &Checkpoint,
        peer_reports: &[PeerCheckpointReport],
        quorum: f64,
    ) -> bool {
        if peer_reports.is_empty() {
            return true;
        }
        let agreeing = peer_reports
            .iter()
            .filter(|report| {
                report.checkpoint_hash == checkpoint.checkpoint_hash
                    && report.block_hash == checkpoint.block_hash
            })
            .count();
        (agreeing as f64) >= (peer_reports.len() as f64) * quorum
    }
}

/// A peer's view of a checkpoint at some height
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerCheckpointReport {
    pub checkpoint_hash: String,
    pub block_hash: String,
}

/// Default peer agreement fraction
pub const PEER_QUORUM: f64 = 2.0 / 3.0;
