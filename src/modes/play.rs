//! Interactive terminal session
//!
//! Runs one engine on a single task: the tick timer, key events, and frame
//! rendering are multiplexed with `tokio::select!`, so `step` and
//! `set_direction` never interleave.

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

use crate::game::{
    ConfigError, Direction, GameConfig, GameEngine, GamePhase, GameSnapshot, StepOutcome,
};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::SessionStats;
use crate::render::Renderer;

/// Render at ~30 FPS
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

pub struct PlayMode {
    engine: GameEngine,
    state: GameSnapshot,
    stats: SessionStats,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl PlayMode {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let engine = GameEngine::new(config)?;
        let state = engine.state();

        Ok(Self {
            engine,
            state,
            stats: SessionStats::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        info!(
            "Session started on a {0}x{0} board, tick {1} ms",
            self.engine.config().board_size,
            self.engine.config().tick_interval_ms
        );

        let result = self.run_game_loop(&mut terminal).await;
        if let Err(err) = &result {
            error!("Game loop failed: {:#}", err);
        }

        self.cleanup_terminal(&mut terminal)?;

        info!(
            "Session ended after {} games, best score {}",
            self.stats.games_played, self.stats.best_score
        );
        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = interval(self.engine.config().tick_interval());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut render_timer = interval(FRAME_INTERVAL);
        render_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(err)) => {
                            return Err(err).context("Failed to read terminal event");
                        }
                        None => self.should_quit = true,
                    }
                }

                // Game logic tick; a no-op unless playing
                _ = tick_timer.tick() => {
                    self.tick();
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.stats.update();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.state, &self.stats);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            self.apply(action);
        }
    }

    /// Feed one key action into the engine
    fn apply(&mut self, action: KeyAction) {
        match action {
            KeyAction::Steer(direction) => {
                match self.engine.phase() {
                    // Any direction key after a loss restarts and steers
                    GamePhase::GameOver => {
                        self.restart();
                        self.start(direction);
                    }
                    GamePhase::Ready => self.start(direction),
                    GamePhase::Playing => self.engine.set_direction(direction),
                }
                self.state = self.engine.state();
            }
            KeyAction::Restart => self.restart(),
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    fn start(&mut self, direction: Direction) {
        self.engine.set_direction(direction);
        self.stats.on_game_start();
    }

    fn restart(&mut self) {
        self.state = self.engine.reset();
        self.stats.on_reset();
    }

    fn tick(&mut self) {
        let result = self.engine.step();
        if result.outcome == StepOutcome::Collided {
            self.stats.on_game_over(result.state.score);
        }
        self.state = result.state;
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
