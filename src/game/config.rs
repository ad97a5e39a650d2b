use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::action::Direction;
use super::state::Position;

/// How new food is placed after the snake eats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodPlacement {
    /// Any cell on the board, including cells under the snake
    #[default]
    Uniform,
    /// Only cells the snake does not occupy
    AvoidSnake,
}

/// Largest supported board edge. Keeps cell coordinates and cell counts
/// well inside `i32`.
pub const MAX_BOARD_SIZE: usize = 1024;

/// Reasons a configuration is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board size must be at least 1")]
    EmptyBoard,
    #[error("board size {board_size} exceeds the maximum of {max}")]
    BoardTooLarge { board_size: usize, max: usize },
    #[error("initial snake must have at least one segment")]
    EmptySnake,
    #[error("initial snake segment ({x}, {y}) is outside a {board_size}x{board_size} board")]
    SnakeOutOfBounds { x: i32, y: i32, board_size: usize },
    #[error("initial snake occupies ({x}, {y}) more than once")]
    DuplicateSegment { x: i32, y: i32 },
    #[error("initial food ({x}, {y}) is outside a {board_size}x{board_size} board")]
    FoodOutOfBounds { x: i32, y: i32, board_size: usize },
    #[error("initial food ({x}, {y}) is on the initial snake")]
    FoodOnSnake { x: i32, y: i32 },
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width and height of the (square) board
    pub board_size: usize,
    /// Snake body on start and after reset, head first
    pub initial_snake: Vec<Position>,
    /// Food cell on start and after reset
    pub initial_food: Position,
    pub initial_direction: Direction,
    /// Time between two simulation steps
    pub tick_interval_ms: u64,
    pub food_placement: FoodPlacement,
    /// Seed for food placement; random when unset
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 20,
            initial_snake: vec![Position::new(10, 10)],
            initial_food: Position::new(15, 15),
            initial_direction: Direction::Right,
            tick_interval_ms: 150,
            food_placement: FoodPlacement::Uniform,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a configuration for a custom board size.
    ///
    /// The snake starts at the centre and the food at three quarters of the
    /// way across, matching the defaults on a 20x20 board. On boards too
    /// small for that the food sits one cell right of the snake. A 1x1 board
    /// has no room for both and fails validation.
    pub fn new(board_size: usize) -> Self {
        let centre = (board_size / 2) as i32;
        let snake = Position::new(centre, centre);

        let offset = (board_size / 2 + board_size / 4) as i32;
        let mut food = Position::new(offset, offset);
        if food == snake && board_size > 1 {
            food = Position::new((centre + 1) % board_size as i32, centre);
        }

        Self {
            board_size,
            initial_snake: vec![snake],
            initial_food: food,
            ..Self::default()
        }
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig =
            serde_json::from_str(&json).context("Failed to deserialize config")?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if self.board_size > MAX_BOARD_SIZE {
            return Err(ConfigError::BoardTooLarge {
                board_size: self.board_size,
                max: MAX_BOARD_SIZE,
            });
        }
        if self.initial_snake.is_empty() {
            return Err(ConfigError::EmptySnake);
        }

        let mut seen = HashSet::with_capacity(self.initial_snake.len());
        for &Position { x, y } in &self.initial_snake {
            if !Position::new(x, y).is_within(self.board_size) {
                return Err(ConfigError::SnakeOutOfBounds {
                    x,
                    y,
                    board_size: self.board_size,
                });
            }
            if !seen.insert((x, y)) {
                return Err(ConfigError::DuplicateSegment { x, y });
            }
        }

        let Position { x, y } = self.initial_food;
        if !self.initial_food.is_within(self.board_size) {
            return Err(ConfigError::FoodOutOfBounds {
                x,
                y,
                board_size: self.board_size,
            });
        }
        if self.initial_snake.contains(&self.initial_food) {
            return Err(ConfigError::FoodOnSnake { x, y });
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }

        Ok(())
    }
}
