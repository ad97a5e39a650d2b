use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    action::Direction,
    config::{ConfigError, FoodPlacement, GameConfig},
    state::{GamePhase, GameSnapshot, Position, Snake},
};

/// What a single call to [`GameEngine::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not playing; nothing changed
    Idle,
    /// The snake moved without eating
    Moved,
    /// The snake ate and grew by one segment
    Grew,
    /// The head ran into the body; the game is over
    Collided,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub outcome: StepOutcome,
    /// State after the step
    pub state: GameSnapshot,
}

/// The game engine that owns the state of one snake session
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
    snake: Snake,
    food: Position,
    /// Direction the next step will move in
    direction: Direction,
    /// Direction the snake last moved in
    heading: Direction,
    score: u32,
    phase: GamePhase,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create an engine that draws food positions from `rng`
    pub fn with_rng(config: GameConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let snake =
            Snake::from_cells(config.initial_snake.clone()).ok_or(ConfigError::EmptySnake)?;

        Ok(Self {
            food: config.initial_food,
            direction: config.initial_direction,
            heading: config.initial_direction,
            score: 0,
            phase: GamePhase::Ready,
            snake,
            rng,
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Direction the next step will move in
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Request a new direction.
    ///
    /// While ready this also starts the game and records the request, except
    /// that a snake longer than one segment keeps its initial direction when
    /// asked to reverse. While playing, a request opposite to the active
    /// direction, or to the direction of the last move, is ignored. Game over
    /// ignores input; call [`GameEngine::reset`] first.
    pub fn set_direction(&mut self, requested: Direction) {
        match self.phase {
            GamePhase::Ready => {
                self.phase = GamePhase::Playing;
                if self.snake.len() > 1 && self.heading.is_opposite(requested) {
                    trace!("Ignoring reversal to {:?} on start", requested);
                } else {
                    self.direction = requested;
                    self.heading = requested;
                }
                info!("Game started heading {:?}", self.direction);
            }
            GamePhase::Playing => {
                if self.direction.is_opposite(requested) || self.heading.is_opposite(requested) {
                    trace!(
                        "Ignoring reversal to {:?} (active {:?}, last moved {:?})",
                        requested,
                        self.direction,
                        self.heading
                    );
                } else {
                    self.direction = requested;
                }
            }
            GamePhase::GameOver => {}
        }
    }

    /// Advance the simulation by one tick
    pub fn step(&mut self) -> StepResult {
        let outcome = self.advance();
        StepResult {
            outcome,
            state: self.state(),
        }
    }

    fn advance(&mut self) -> StepOutcome {
        if self.phase != GamePhase::Playing {
            return StepOutcome::Idle;
        }

        let new_head = self
            .snake
            .head()
            .wrapped_step(self.direction, self.config.board_size);
        self.heading = self.direction;

        let ate_food = new_head == self.food;
        let moved = self.snake.advanced(new_head, ate_food);

        if ate_food {
            self.score += 1;
            self.food = self.place_food(&moved);
            debug!(
                "Ate food at ({}, {}), score {}, next food at ({}, {})",
                new_head.x, new_head.y, self.score, self.food.x, self.food.y
            );
        }

        if moved.head_hits_body() {
            self.phase = GamePhase::GameOver;
            info!(
                "Game over at ({}, {}) with score {} and length {}",
                new_head.x,
                new_head.y,
                self.score,
                self.snake.len()
            );
            return StepOutcome::Collided;
        }

        self.snake = moved;
        if ate_food {
            StepOutcome::Grew
        } else {
            StepOutcome::Moved
        }
    }

    /// Pick the next food cell. The default placement does not avoid the
    /// snake, so food may land under the body.
    fn place_food(&mut self, snake: &Snake) -> Position {
        let n = self.config.board_size;

        if self.config.food_placement == FoodPlacement::AvoidSnake && snake.len() < n * n {
            let free: Vec<Position> = (0..n as i32)
                .flat_map(|y| (0..n as i32).map(move |x| Position::new(x, y)))
                .filter(|pos| !snake.contains(*pos))
                .collect();
            return free[self.rng.gen_range(0..free.len())];
        }

        let x = self.rng.gen_range(0..n) as i32;
        let y = self.rng.gen_range(0..n) as i32;
        Position::new(x, y)
    }

    /// Restore the starting snake, food, direction and score.
    ///
    /// The food RNG keeps its position in the stream.
    pub fn reset(&mut self) -> GameSnapshot {
        // Validated in the constructor, so the initial snake is non-empty
        if let Some(snake) = Snake::from_cells(self.config.initial_snake.clone()) {
            self.snake = snake;
        }
        self.food = self.config.initial_food;
        self.direction = self.config.initial_direction;
        self.heading = self.config.initial_direction;
        self.score = 0;
        self.phase = GamePhase::Ready;
        info!("Game reset");
        self.state()
    }

    /// Copy of the current state
    pub fn state(&self) -> GameSnapshot {
        GameSnapshot {
            snake: self.snake.cells().to_vec(),
            food: self.food,
            score: self.score,
            phase: self.phase,
            board_size: self.config.board_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::MAX_BOARD_SIZE;

    fn engine(config: GameConfig) -> GameEngine {
        GameEngine::with_rng(config, StdRng::seed_from_u64(42)).unwrap()
    }

    fn engine_with_snake(snake: &[(i32, i32)], direction: Direction) -> GameEngine {
        engine(GameConfig {
            initial_snake: snake.iter().copied().map(Position::from).collect(),
            initial_direction: direction,
            ..Default::default()
        })
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(GameConfig::default());
        let state = engine.state();

        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.snake, vec![Position::new(10, 10)]);
        assert_eq!(state.food, Position::new(15, 15));
        assert_eq!(state.score, 0);
        assert_eq!(state.board_size, 20);
        assert_eq!(engine.direction(), Direction::Right);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            board_size: 0,
            ..Default::default()
        };
        assert_eq!(GameEngine::new(config).err(), Some(ConfigError::EmptyBoard));

        let config = GameConfig {
            board_size: 1 << 20,
            ..Default::default()
        };
        assert_eq!(
            GameEngine::new(config).err(),
            Some(ConfigError::BoardTooLarge {
                board_size: 1 << 20,
                max: MAX_BOARD_SIZE
            })
        );
    }

    #[test]
    fn test_step_while_ready_is_noop() {
        let mut engine = engine(GameConfig::default());
        let before = engine.state();

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Idle);
        assert_eq!(result.state, before);
    }

    #[test]
    fn test_first_input_starts_and_steers() {
        let mut engine = engine(GameConfig::default());

        engine.set_direction(Direction::Up);

        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.direction(), Direction::Up);

        let result = engine.step();
        assert_eq!(result.outcome, StepOutcome::Moved);
        assert_eq!(result.state.head(), Some(Position::new(10, 9)));
    }

    #[test]
    fn test_single_cell_snake_may_start_backwards() {
        let mut engine = engine(GameConfig::default());
        engine.set_direction(Direction::Left);
        assert_eq!(engine.direction(), Direction::Left);
    }

    #[test]
    fn test_long_snake_cannot_start_backwards() {
        let mut engine = engine_with_snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right);

        engine.set_direction(Direction::Left);

        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.direction(), Direction::Right);
    }

    #[test]
    fn test_movement_wraps_on_every_edge() {
        let cases = [
            ((19, 4), Direction::Right, (0, 4)),
            ((0, 4), Direction::Left, (19, 4)),
            ((4, 19), Direction::Down, (4, 0)),
            ((4, 0), Direction::Up, (4, 19)),
        ];

        for (start, dir, expected) in cases {
            let mut engine = engine_with_snake(&[start], dir);
            engine.set_direction(dir);
            let result = engine.step();
            assert_eq!(result.state.head(), Some(Position::from(expected)), "{:?}", dir);
        }
    }

    #[test]
    fn test_shift_keeps_length() {
        let mut engine = engine_with_snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right);
        engine.set_direction(Direction::Right);

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Moved);
        assert_eq!(
            result.state.snake,
            vec![Position::new(6, 5), Position::new(5, 5), Position::new(4, 5)]
        );
        assert_eq!(result.state.score, 0);
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let mut engine = engine(GameConfig {
            initial_snake: vec![Position::new(14, 15)],
            ..Default::default()
        });
        engine.set_direction(Direction::Right);

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Grew);
        assert_eq!(result.state.score, 1);
        assert_eq!(
            result.state.snake,
            vec![Position::new(15, 15), Position::new(14, 15)]
        );
        assert!(result.state.food.is_within(20));
    }

    #[test]
    fn test_food_is_only_eaten_on_exact_match() {
        let mut engine = engine(GameConfig::default());
        engine.set_direction(Direction::Right);

        for _ in 0..5 {
            engine.step();
        }
        let state = engine.state();

        // Same column as the food but a different row
        assert_eq!(state.head(), Some(Position::new(15, 10)));
        assert_eq!(state.snake.len(), 1);
        assert_eq!(state.score, 0);
        assert_eq!(state.food, Position::new(15, 15));
    }

    #[test]
    fn test_self_collision_ends_game_and_keeps_snake() {
        // Head at (5, 5) moving left, body curls around below it
        let mut engine = engine_with_snake(
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::Left,
        );
        engine.set_direction(Direction::Down);
        let before = engine.state().snake;

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Collided);
        assert_eq!(result.state.phase, GamePhase::GameOver);
        assert_eq!(result.state.snake, before);
    }

    #[test]
    fn test_moving_into_vacated_tail_is_safe() {
        // A 2x2 loop: the head follows the tail around
        let mut engine = engine_with_snake(&[(5, 5), (5, 6), (6, 6), (6, 5)], Direction::Up);
        engine.set_direction(Direction::Right);

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Moved);
        assert_eq!(result.state.head(), Some(Position::new(6, 5)));
        assert_eq!(result.state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_collision_on_food_still_scores() {
        let mut engine = engine_with_snake(
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::Left,
        );
        // Food respawned under the body where the head is about to land
        engine.food = Position::new(5, 6);
        engine.set_direction(Direction::Down);
        let before = engine.state().snake;

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Collided);
        assert_eq!(result.state.score, 1);
        assert_eq!(result.state.snake, before);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut engine = engine(GameConfig::default());
        engine.set_direction(Direction::Right);

        engine.set_direction(Direction::Left);
        assert_eq!(engine.direction(), Direction::Right);

        engine.set_direction(Direction::Up);
        assert_eq!(engine.direction(), Direction::Up);
    }

    #[test]
    fn test_reversal_checked_against_last_move() {
        let mut engine = engine_with_snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right);
        engine.set_direction(Direction::Right);
        engine.step();

        // Up then Left between two ticks would fold the snake onto itself
        engine.set_direction(Direction::Up);
        engine.set_direction(Direction::Left);
        assert_eq!(engine.direction(), Direction::Up);

        let result = engine.step();
        assert_eq!(result.outcome, StepOutcome::Moved);
        assert_eq!(result.state.head(), Some(Position::new(6, 4)));

        // After moving up, Left is a valid turn
        engine.set_direction(Direction::Left);
        assert_eq!(engine.direction(), Direction::Left);
    }

    #[test]
    fn test_reversal_of_pending_turn_is_ignored() {
        let mut engine = engine_with_snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right);
        engine.set_direction(Direction::Right);
        engine.step();

        // Down is opposite to the queued Up, even though the snake moved Right
        engine.set_direction(Direction::Up);
        engine.set_direction(Direction::Down);
        assert_eq!(engine.direction(), Direction::Up);

        let result = engine.step();
        assert_eq!(result.state.head(), Some(Position::new(6, 4)));
    }

    #[test]
    fn test_game_over_ignores_step_and_input() {
        let mut engine = engine_with_snake(
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::Left,
        );
        engine.set_direction(Direction::Down);
        engine.step();
        let frozen = engine.state();
        assert_eq!(frozen.phase, GamePhase::GameOver);

        engine.set_direction(Direction::Left);
        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Idle);
        assert_eq!(result.state, frozen);
        assert_eq!(engine.direction(), Direction::Down);
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let config = GameConfig {
            initial_snake: vec![Position::new(14, 15)],
            ..Default::default()
        };
        let mut engine = engine(config);
        let initial = engine.state();

        engine.set_direction(Direction::Right);
        engine.step();
        assert_eq!(engine.state().score, 1);
        assert_eq!(engine.state().snake.len(), 2);
        engine.set_direction(Direction::Down);
        engine.step();

        let after_reset = engine.reset();
        assert_eq!(after_reset, initial);
        assert_eq!(engine.direction(), Direction::Right);

        // Idempotent
        assert_eq!(engine.reset(), initial);
    }

    #[test]
    fn test_reset_after_game_over_allows_new_game() {
        let mut engine = engine_with_snake(
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::Left,
        );
        engine.set_direction(Direction::Down);
        engine.step();
        assert_eq!(engine.phase(), GamePhase::GameOver);

        engine.reset();
        assert_eq!(engine.phase(), GamePhase::Ready);

        engine.set_direction(Direction::Up);
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.step().outcome, StepOutcome::Moved);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut engine = engine(GameConfig::default());
        let mut snapshot = engine.state();
        snapshot.snake.push(Position::new(0, 0));
        snapshot.score = 99;

        assert_eq!(engine.state().snake.len(), 1);
        assert_eq!(engine.state().score, 0);

        engine.set_direction(Direction::Right);
        engine.step();
        assert_eq!(snapshot.snake.len(), 2);
    }

    #[test]
    fn test_seeded_food_is_reproducible() {
        let config = GameConfig {
            initial_snake: vec![Position::new(14, 15)],
            seed: Some(1234),
            ..Default::default()
        };

        let mut a = GameEngine::new(config.clone()).unwrap();
        let mut b = GameEngine::new(config).unwrap();
        a.set_direction(Direction::Right);
        b.set_direction(Direction::Right);

        assert_eq!(a.step().state.food, b.step().state.food);
    }

    #[test]
    fn test_uniform_placement_can_land_under_snake() {
        // 2x2 board: after eating, three of the four cells are snake
        let config = GameConfig {
            board_size: 2,
            initial_snake: vec![Position::new(0, 0), Position::new(0, 1)],
            initial_food: Position::new(1, 0),
            initial_direction: Direction::Right,
            food_placement: FoodPlacement::Uniform,
            ..Default::default()
        };

        let mut landed_on_snake = 0;
        for seed in 0..32 {
            let mut engine =
                GameEngine::with_rng(config.clone(), StdRng::seed_from_u64(seed)).unwrap();
            engine.set_direction(Direction::Right);
            let result = engine.step();
            assert_eq!(result.outcome, StepOutcome::Grew);
            assert!(result.state.food.is_within(2));
            if result.state.snake.contains(&result.state.food) {
                landed_on_snake += 1;
            }
        }

        assert!(landed_on_snake > 0);
    }

    #[test]
    fn test_avoid_snake_placement_skips_body() {
        // 2x2 board: after eating, only one free cell remains
        let config = GameConfig {
            board_size: 2,
            initial_snake: vec![Position::new(0, 0), Position::new(0, 1)],
            initial_food: Position::new(1, 0),
            initial_direction: Direction::Right,
            food_placement: FoodPlacement::AvoidSnake,
            ..Default::default()
        };

        for seed in 0..16 {
            let mut engine =
                GameEngine::with_rng(config.clone(), StdRng::seed_from_u64(seed)).unwrap();
            engine.set_direction(Direction::Right);
            let result = engine.step();
            assert_eq!(result.outcome, StepOutcome::Grew);
            assert_eq!(result.state.food, Position::new(1, 1));
        }
    }

    #[test]
    fn test_avoid_snake_full_board_falls_back() {
        // The snake fills the 2x2 board once it eats
        let config = GameConfig {
            board_size: 2,
            initial_snake: vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 1),
            ],
            initial_food: Position::new(1, 0),
            initial_direction: Direction::Right,
            food_placement: FoodPlacement::AvoidSnake,
            ..Default::default()
        };
        let mut engine = engine(config);
        engine.set_direction(Direction::Right);

        let result = engine.step();

        assert_eq!(result.outcome, StepOutcome::Grew);
        assert_eq!(result.state.snake.len(), 4);
        assert!(result.state.food.is_within(2));
    }
}
