use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{GamePhase, GameSnapshot, Position};
use crate::metrics::SessionStats;

/// Draws a [`GameSnapshot`] to the terminal. Holds no game state.
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, state: &GameSnapshot, stats: &SessionStats) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(3), // Phase message
                Constraint::Length(1), // Controls
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(state, stats), chunks[0]);
        frame.render_widget(self.render_board(state), chunks[1]);
        frame.render_widget(self.render_message(state), chunks[2]);
        frame.render_widget(self.render_controls(), chunks[3]);
    }

    fn render_board(&self, state: &GameSnapshot) -> Paragraph<'_> {
        let head = state.head();
        let mut lines = Vec::with_capacity(state.board_size);

        for y in 0..state.board_size {
            let mut spans = Vec::with_capacity(state.board_size);

            for x in 0..state.board_size {
                let pos = Position::new(x as i32, y as i32);

                let cell = if Some(pos) == head {
                    let color = if state.is_over() { Color::Red } else { Color::Cyan };
                    Span::styled("■ ", Style::default().fg(color).add_modifier(Modifier::BOLD))
                } else if state.snake.contains(&pos) {
                    Span::styled("□ ", Style::default().fg(Color::Green))
                } else if pos == state.food {
                    Span::styled(
                        "O ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(" Snake "),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, state: &GameSnapshot, stats: &SessionStats) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let text = vec![Line::from(vec![
            Span::styled("Score: ", label),
            Span::styled(state.score.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(stats.best_score.max(state.score).to_string(), value),
            Span::raw("    "),
            Span::styled("Length: ", label),
            Span::styled(state.snake.len().to_string(), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(stats.format_time(), value),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_message(&self, state: &GameSnapshot) -> Paragraph<'_> {
        let text = match state.phase {
            GamePhase::Ready => vec![Line::from(Span::styled(
                "Press any arrow key to start",
                Style::default().fg(Color::Yellow),
            ))],
            GamePhase::Playing => Vec::new(),
            GamePhase::GameOver => vec![
                Line::from(vec![
                    Span::styled(
                        "Game Over!",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                    Span::styled(
                        state.score.to_string(),
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Press an arrow key or ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        "R",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(" to play again", Style::default().fg(Color::Gray)),
                ]),
            ],
        };

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to move | "),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" to restart | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
