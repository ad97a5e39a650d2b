//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! A front-end drives it by calling `set_direction` on input, `step` on every tick,
//! and reading `state` to draw a frame.

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use config::{ConfigError, FoodPlacement, GameConfig, MAX_BOARD_SIZE};
pub use engine::{GameEngine, StepOutcome, StepResult};
pub use state::{GamePhase, GameSnapshot, Position, Snake};
