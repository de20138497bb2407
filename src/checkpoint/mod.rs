//! Periodic chain-state checkpoints on the filesystem

pub mod manager;

pub use manager::{
    Checkpoint, CheckpointConfig, CheckpointError, CheckpointManager, PeerCheckpointReport,
    PEER_QUORUM,
};
