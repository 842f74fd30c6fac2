//! Terminal user interface for recording with live spectrum visualization.
//!
//! Renders the frequency spectrum of the take in progress plus a footer with
//! the recording indicator and elapsed time, and translates key presses into
//! recording commands.

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::Sparkline,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use crate::recording::visualizer::SpectrumAnalyzer;

/// User input command during recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCommand {
    /// Keep recording (no key pressed)
    Continue,
    /// Stop and save the take to the store (Enter)
    Save,
    /// Stop and export the take to MP3 ('d')
    Export,
    /// Stop and discard (Escape or 'q')
    Cancel,
    /// Pause/resume recording (Space)
    TogglePause,
}

/// Recording screen: spectrum bars over the full terminal with a status footer.
pub struct RecordTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    analyzer: SpectrumAnalyzer,
    terminal_width: usize,
    sample_rate: u32,
    reference_level_db: i8,
}

impl RecordTui {
    /// Enters alternate screen mode and sets up the spectrum analyzer.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized or raw mode enabled
    pub fn new(sample_rate: u32, reference_level_db: i8) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let terminal_width = terminal.size()?.width as usize;

        Ok(RecordTui {
            terminal,
            analyzer: SpectrumAnalyzer::new(terminal_width),
            terminal_width,
            sample_rate,
            reference_level_db,
        })
    }

    /// Redraws the spectrum and footer for the current frame.
    ///
    /// While paused the spectrum freezes and the meters show the pause
    /// indicator instead of the recording dot.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, samples: &[i16], elapsed: Duration, paused: bool) -> Result<()> {
        let current_width = self.terminal.size()?.width as usize;
        if current_width != self.terminal_width {
            self.terminal_width = current_width;
            self.analyzer.resize(current_width);
        }

        if !paused {
            self.analyzer
                .update(samples, self.sample_rate, self.reference_level_db);
        }

        let bins = self.analyzer.bins().to_vec();

        self.terminal.draw(|frame| {
            let area = frame.area();

            let footer_height = 1;
            let content_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height),
            };

            // Two stacked sparklines give the bars a light-over-dark gradient
            let top_height = content_area.height / 3 * 2;
            let top_area = Rect {
                x: content_area.x,
                y: content_area.y,
                width: content_area.width,
                height: top_height,
            };

            let top_bars = Sparkline::default().data(&bins).max(100).style(
                Style::default()
                    .bg(Color::Rgb(0, 0, 0))
                    .fg(Color::Rgb(206, 224, 220)),
            );
            frame.render_widget(top_bars, top_area);

            let bottom_area = Rect {
                x: content_area.x,
                y: content_area.y + top_height,
                width: content_area.width,
                height: content_area.height.saturating_sub(top_height),
            };

            let inverted: Vec<u64> = bins.iter().map(|&v| 100_u64.saturating_sub(v)).collect();
            let bottom_bars = Sparkline::default().data(&inverted).max(100).style(
                Style::default()
                    .bg(Color::Rgb(185, 207, 212))
                    .fg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(bottom_bars, bottom_area);

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };

            let indicator = if paused {
                Span::styled("⏸ ", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("● ", Style::default().fg(Color::Red))
            };

            let total_secs = elapsed.as_secs();
            let duration_span = Span::raw(format!("{}:{:02}", total_secs / 60, total_secs % 60));

            let help_span = Span::raw("  space pause, ↵ save, d export mp3, esc/q cancel");

            let footer = ratatui::widgets::Paragraph::new(Line::from(vec![
                indicator,
                duration_span,
                help_span,
            ]))
            .style(
                Style::default()
                    .fg(Color::Rgb(185, 207, 212))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Polls for user input and returns the matching recording command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> Result<RecordCommand> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Enter => {
                        tracing::debug!("Enter pressed: saving take");
                        RecordCommand::Save
                    }
                    KeyCode::Char('d') => {
                        tracing::debug!("'d' pressed: exporting take");
                        RecordCommand::Export
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        tracing::debug!("Escape or 'q' pressed: canceling recording");
                        RecordCommand::Cancel
                    }
                    KeyCode::Char('c')
                        if key
                            .modifiers
                            .contains(crossterm::event::KeyModifiers::CONTROL) =>
                    {
                        tracing::debug!("Ctrl+C pressed: canceling recording");
                        RecordCommand::Cancel
                    }
                    KeyCode::Char(' ') => {
                        tracing::debug!("Space pressed: toggling pause");
                        RecordCommand::TogglePause
                    }
                    _ => RecordCommand::Continue,
                });
            }
        }
        Ok(RecordCommand::Continue)
    }

    /// Restores the terminal and leaves alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )
        .map_err(|e| anyhow!("Failed to leave alternate screen: {e}"))?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
