use serde::{Deserialize, Serialize};

use super::action::Direction;

/// A cell on the game board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move one cell in `direction` on a `board_size` x `board_size` torus.
    ///
    /// Leaving one edge re-enters on the opposite edge.
    pub fn wrapped_step(&self, direction: Direction, board_size: usize) -> Self {
        let n = board_size as i32;
        let (dx, dy) = direction.delta();
        Self {
            x: (self.x + dx).rem_euclid(n),
            y: (self.y + dy).rem_euclid(n),
        }
    }

    pub fn is_within(&self, board_size: usize) -> bool {
        let n = board_size as i32;
        (0..n).contains(&self.x) && (0..n).contains(&self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// The snake, head first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: Vec<Position>,
}

impl Snake {
    /// Returns `None` for an empty body.
    pub fn from_cells(body: Vec<Position>) -> Option<Self> {
        if body.is_empty() {
            None
        } else {
            Some(Self { body })
        }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn cells(&self) -> &[Position] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Build the body the snake would have after moving its head to
    /// `new_head`. The tail is kept when `grow` is set.
    pub fn advanced(&self, new_head: Position, grow: bool) -> Snake {
        let mut body = Vec::with_capacity(self.body.len() + 1);
        body.push(new_head);
        body.extend_from_slice(&self.body);
        if !grow {
            body.pop();
        }
        Snake { body }
    }

    /// True if the head shares a cell with any later segment.
    pub fn head_hits_body(&self) -> bool {
        let head = self.head();
        self.body[1..].contains(&head)
    }
}

/// Phase of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first direction input
    Ready,
    Playing,
    /// The snake ran into itself; only `reset` leaves this phase
    GameOver,
}

/// Read-only copy of the engine state, handed to renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub snake: Vec<Position>,
    pub food: Position,
    pub score: u32,
    pub phase: GamePhase,
    pub board_size: usize,
}

impl GameSnapshot {
    /// `None` only for a hand-built snapshot; the engine never publishes an
    /// empty snake.
    pub fn head(&self) -> Option<Position> {
        self.snake.first().copied()
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}
