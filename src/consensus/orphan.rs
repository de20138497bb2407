//! Orphan block pool
//!
//! Blocks whose parent is not yet known are parked here, indexed both by
//! their own hash and by the parent hash they wait on, so arrival of the
//! parent can cascade-connect its orphans.

use crate::core::Block;
use std::collections::HashMap;

/// Maximum number of orphan blocks kept in memory
pub const MAX_ORPHAN_BLOCKS: usize = 100;

/// Seconds an orphan may wait for its parent before expiring
pub const ORPHAN_BLOCK_TTL: i64 = 3600;

/// An orphan block waiting for its parent
#[derive(Debug, Clone)]
pub struct OrphanEntry {
    pub block: Block,
    pub parent_hash: String,
    /// Insertion time (Unix seconds), drives TTL and capacity eviction
    pub received_at: i64,
}

impl OrphanEntry {
    pub fn is_expired(&self, now: i64, ttl: i64) -> bool {
        now - self.received_at > ttl
    }
}

/// Bounded pool of parentless blocks
#[derive(Debug)]
pub struct OrphanBlockPool {
    orphans: HashMap<String, OrphanEntry>,
    by_parent: HashMap<String, Vec<String>>,
    max_size: usize,
    ttl: i64,
}

impl Default for OrphanBlockPool {
    fn default() -> Self {
        Self::new()
    }
}

impl OrphanBlockPool {
    pub fn new() -> Self {
        Self::with_limits(MAX_ORPHAN_BLOCKS, ORPHAN_BLOCK_TTL)
    }

    pub fn with_limits(max_size: usize, ttl: i64) -> Self {
        Self {
            orphans: HashMap::new(),
            by_parent: HashMap::new(),
            max_size,
            ttl,
        }
    }

    /// Add an orphan. Duplicates are ignored; once capacity is exceeded
    /// the single oldest orphan (by insertion time) is evicted first.
    pub fn add_orphan(&mut self, block: Block, now: i64) -> bool {
        let block_hash = block.hash.clone();
        if self.orphans.contains_key(&block_hash) {
            return false;
        }

        if self.orphans.len() >= self.max_size {
            self.evict_oldest();
        }

        let parent_hash = block.previous_hash.clone();
        self.orphans.insert(
            block_hash.clone(),
            OrphanEntry {
                block,
                parent_hash: parent_hash.clone(),
                received_at: now,
            },
        );
        self.by_parent.entry(parent_hash).or_default().push(block_hash);
        true
    }

    /// All orphans waiting on the given parent hash
    pub fn get_orphans_by_parent(&self, parent_hash: &str) -> Vec<Block> {
        self.by_parent
            .get(parent_hash)
            .map(|hashes| {
                hashes
                    .iter()
                    .filter_map(|h| self.orphans.get(h))
                    .map(|entry| entry.block.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove an orphan once it has been connected
    pub fn remove_orphan(&mut self, block_hash: &str) -> Option<Block> {
        let entry = self.orphans.remove(block_hash)?;
        if let Some(siblings) = self.by_parent.get_mut(&entry.parent_hash) {
            siblings.retain(|h| h != block_hash);
            if siblings.is_empty() {
                self.by_parent.remove(&entry.parent_hash);
            }
        }
        Some(entry.block)
    }

    /// Drop every orphan older than the TTL; returns how many were removed
    pub fn cleanup_expired_orphans(&mut self, now: i64) -> usize {
        let expired: Vec<String> = self
            .orphans
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl))
            .map(|(hash, _)| hash.clone())
            .collect();

        for hash in &expired {
            self.remove_orphan(hash);
        }
        if !expired.is_empty() {
            log::debug!("Evicted {} expired orphan blocks", expired.len());
        }
        expired.len()
    }

    pub fn contains(&self, block_hash: &str) -> bool {
        self.orphans.contains_key(block_hash)
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .orphans
            .iter()
            .min_by_key(|(_, entry)| entry.received_at)
            .map(|(hash, _)| hash.clone());
        if let Some(hash) = oldest {
            self.remove_orphan(&hash);
        }
    }
}
