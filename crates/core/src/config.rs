//! Engine configuration

use crate::scoring::clamp_start_level;
use crate::types::{BOARD_HEIGHT, BOARD_WIDTH, SPAWN_GRACE_MS};

/// Settings fixed for the lifetime of a [`GameState`](crate::GameState)
///
/// Out-of-range values are clamped when the engine is built: board sides to
/// `MIN_BOARD_DIM..=MAX_BOARD_DIM`, the starting level to `1..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub width: u8,
    pub height: u8,
    pub starting_level: u32,
    /// Window after a spawn in which a blocked drop does not lock (0 disables it)
    pub spawn_grace_ms: u32,
    /// Bag seed
    pub seed: u32,
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_starting_level(mut self, level: u32) -> Self {
        self.starting_level = clamp_start_level(level);
        self
    }

    pub fn with_spawn_grace_ms(mut self, ms: u32) -> Self {
        self.spawn_grace_ms = ms;
        self
    }

    pub fn with_size(mut self, width: u8, height: u8) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            starting_level: 1,
            spawn_grace_ms: SPAWN_GRACE_MS,
            seed: 1,
        }
    }
}
