use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Grid sizes a game may be configured with.
pub const GRID_SIZE_RANGE: RangeInclusive<usize> = 4..=10;

/// Cells that can never hold a pit: the start, the gold and the wumpus.
const RESERVED_CELLS: usize = 3;

/// Represents errors that make a configuration unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid size must be between 4 and 10, got {0}")]
    GridSize(usize),
    #[error("Invalid number of pits: {pits} (at most {max} fit on a {size}x{size} grid)")]
    PitCount { pits: usize, size: usize, max: usize },
    #[error("Layout is {layout}x{layout} but the configuration asks for {configured}x{configured}")]
    LayoutMismatch { layout: usize, configured: usize },
    #[error("Layout has {layout} pits but the configuration asks for {configured}")]
    LayoutPitMismatch { layout: usize, configured: usize },
}

/// Score deltas applied by the coordinator.
///
/// Costs are stored as negative numbers and simply added to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoring {
    pub move_cost: i64,
    pub shoot_cost: i64,
    pub grab_gold_reward: i64,
    pub climb_out_reward: i64,
    pub fall_in_pit_cost: i64,
    pub wumpus_kill_cost: i64,
    pub wumpus_defeat_reward: i64,
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring {
            move_cost: -1,
            shoot_cost: -10,
            grab_gold_reward: 1000,
            climb_out_reward: 10,
            fall_in_pit_cost: -1000,
            wumpus_kill_cost: -1000,
            wumpus_defeat_reward: 500,
        }
    }
}

/// Static parameters for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub grid_size: usize,
    pub pit_count: usize,
    #[serde(default)]
    pub scoring: Scoring,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_size: 5,
            pit_count: 3,
            scoring: Scoring::default(),
        }
    }
}

impl GameConfig {
    pub fn new(grid_size: usize, pit_count: usize) -> Result<Self, ConfigError> {
        let config = GameConfig {
            grid_size,
            pit_count,
            ..GameConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// The largest pit count that still leaves room for start, gold and wumpus.
    pub fn max_pits(grid_size: usize) -> usize {
        (grid_size * grid_size).saturating_sub(RESERVED_CELLS)
    }

    /// Checks grid size and pit count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !GRID_SIZE_RANGE.contains(&self.grid_size) {
            return Err(ConfigError::GridSize(self.grid_size));
        }
        let max = Self::max_pits(self.grid_size);
        if self.pit_count > max {
            return Err(ConfigError::PitCount {
                pits: self.pit_count,
                size: self.grid_size,
                max,
            });
        }
        Ok(())
    }
}
