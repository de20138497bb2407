//! Dynamic difficulty adjustment
//!
//! Every fixed window of blocks the actual elapsed time is compared to
//! the expected time (`target_block_time * window_size`); difficulty is
//! scaled by the clamped ratio.

use serde::{Deserialize, Serialize};

/// Retarget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Blocks between adjustments
    pub window_size: u64,
    /// Target seconds per block
    pub target_block_time: i64,
    /// Ratio clamp: adjustments stay within [1/max, max]
    pub max_adjustment_factor: f64,
    pub min_difficulty: u32,
    pub max_difficulty: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            target_block_time: 60,
            max_adjustment_factor: 4.0,
            min_difficulty: 1,
            max_difficulty: 16,
        }
    }
}

/// Windowed difficulty retargeting
#[derive(Debug, Clone, Default)]
pub struct DifficultyAdjuster {
    config: DifficultyConfig,
}

impl DifficultyAdjuster {
    pub fn new(config: DifficultyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Whether `height` sits on a retarget boundary
    pub fn should_adjust(&self, height: u64) -> bool {
        height > 0 && height % self.config.window_size == 0
    }

    /// Compute the next difficulty from the window's first and last
    /// block timestamps. Ratio = expected / actual elapsed, clamped to
    /// `[1/max_factor, max_factor]`; the result is clamped to
    /// `[min_difficulty, max_difficulty]`.
    pub fn adjust(&self, current_difficulty: u32, window_start_ts: i64, window_end_ts: i64) -> u32 {
        let expected = (self.config.target_block_time * self.config.window_size as i64) as f64;
        let actual = (window_end_ts - window_start_ts).max(1) as f64;

        let max_factor = self.config.max_adjustment_factor;
        let ratio = (expected / actual).clamp(1.0 / max_factor, max_factor);

        let adjusted = (current_difficulty as f64 * ratio).round() as u32;
        let new_difficulty = adjusted.clamp(self.config.min_difficulty, self.config.max_difficulty);

        if new_difficulty != current_difficulty {
            log::info!(
                "Difficulty adjusted {} -> {} (elapsed {}s, expected {}s)",
                current_difficulty,
                new_difficulty,
                actual,
                expected
            );
        }
        new_difficulty
    }
}
