//! Interactive terminal UI for browsing saved takes.
//!
//! Scrollable list with keyboard navigation, playback toggling through the
//! playback controller, inline rename, and delete.

use crate::playback::PlaybackController;
use crate::store::TakeStore;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState, Padding, Paragraph},
};
use std::io::{self, Stdout};
use std::time::Duration;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const PLAYING_FG: Color = Color::Rgb(120, 220, 120);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const HELP_FG: Color = Color::Rgb(100, 100, 100);

/// Interactive browser over the take store.
pub struct TakesBrowser {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    list_state: ListState,
    /// Cached (id, display_name) pairs, reloaded after every mutation
    entries: Vec<(String, String)>,
    /// Whether the rename input is open
    input_mode: bool,
    input: Input,
    cleaned_up: bool,
}

impl TakesBrowser {
    /// Enters alternate screen mode and loads the current takes.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new(store: &mut TakeStore) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let entries = load_entries(store)?;
        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(0));
        }

        Ok(Self {
            terminal,
            list_state,
            entries,
            input_mode: false,
            input: Input::default(),
            cleaned_up: false,
        })
    }

    /// Runs the browser loop until the user exits.
    ///
    /// Any active playback is stopped on the way out.
    pub fn run(
        &mut self,
        store: &mut TakeStore,
        playback: &mut PlaybackController,
    ) -> Result<()> {
        tracing::debug!("Takes browser started with {} takes", self.entries.len());

        loop {
            // Natural end-of-audio clears the (playing) marker
            playback.poll();
            self.draw(playback.active_id())?;

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }

            let Event::Key(key) = event::read()? else {
                continue;
            };

            if self.input_mode {
                self.handle_rename_input(key, store, playback)?;
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    tracing::debug!("Takes browser exited");
                    break;
                }
                KeyCode::Up => self.list_state.select_previous(),
                KeyCode::Down => self.list_state.select_next(),
                KeyCode::Enter => {
                    if let Some((id, _)) = self.selected() {
                        let id = id.clone();
                        if let Some(take) = store.get(&id)? {
                            playback.toggle_play(&take.id, &take.audio_ref);
                        }
                    }
                }
                KeyCode::Char('r') => {
                    if let Some((_, name)) = self.selected() {
                        self.input = Input::new(name.clone());
                        self.input_mode = true;
                    }
                }
                KeyCode::Char('x') => {
                    if let Some((id, _)) = self.selected() {
                        let id = id.clone();
                        if playback.active_id() == Some(id.as_str()) {
                            playback.stop_active();
                        }
                        store.delete(&id)?;
                        self.reload(store)?;
                    }
                }
                _ => {}
            }
        }

        playback.stop_active();
        self.cleanup()?;
        Ok(())
    }

    /// Handles key presses while the rename input is open.
    fn handle_rename_input(
        &mut self,
        key: KeyEvent,
        store: &mut TakeStore,
        playback: &mut PlaybackController,
    ) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = false;
                self.input = Input::default();
            }
            KeyCode::Enter => {
                let new_name = self.input.value().trim().to_string();
                self.input_mode = false;
                self.input = Input::default();

                if new_name.is_empty() {
                    return Ok(());
                }
                if let Some((id, _)) = self.selected() {
                    let id = id.clone();
                    // The renamed key is a different take id; stop stale playback
                    if playback.active_id() == Some(id.as_str()) {
                        playback.stop_active();
                    }
                    store.rename(&id, &new_name)?;
                    self.reload(store)?;
                }
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
            }
        }
        Ok(())
    }

    fn selected(&self) -> Option<&(String, String)> {
        self.list_state.selected().and_then(|i| self.entries.get(i))
    }

    fn reload(&mut self, store: &mut TakeStore) -> Result<()> {
        self.entries = load_entries(store)?;
        if self.entries.is_empty() {
            self.list_state.select(None);
        } else if self
            .list_state
            .selected()
            .is_some_and(|i| i >= self.entries.len())
        {
            self.list_state.select(Some(self.entries.len() - 1));
        }
        Ok(())
    }

    /// Renders the take list with the playing marker and help footer.
    fn draw(&mut self, active_id: Option<&str>) -> Result<()> {
        let input_mode = self.input_mode;
        let input_value = self.input.value().to_string();
        let input_cursor = self.input.visual_cursor();

        self.terminal.draw(|frame| {
            let area = frame.area();

            let padding_block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG));
            frame.render_widget(&padding_block, area);
            let inner_area = padding_block.inner(area);

            let [list_area, input_area, footer_area] = Layout::vertical([
                Constraint::Min(0),
                Constraint::Length(if input_mode { 3 } else { 0 }),
                Constraint::Length(1),
            ])
            .areas(inner_area);

            let items: Vec<ListItem> = self
                .entries
                .iter()
                .map(|(id, name)| {
                    if active_id == Some(id.as_str()) {
                        ListItem::new(Line::from(vec![
                            Span::styled(name.clone(), Style::default().fg(FG)),
                            Span::styled(" (playing)", Style::default().fg(PLAYING_FG)),
                        ]))
                    } else {
                        ListItem::new(Line::styled(name.clone(), Style::default().fg(FG)))
                    }
                })
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .title(" Takes ")
                        .borders(Borders::ALL)
                        .padding(Padding::bottom(1)),
                )
                .highlight_style(Style::default().bg(HIGHLIGHT_BG))
                .highlight_symbol("> ")
                .highlight_spacing(HighlightSpacing::Always);

            frame.render_stateful_widget(list, list_area, &mut self.list_state);

            if self.entries.is_empty() {
                let empty = Paragraph::new("No takes saved yet. Run 'vrec record' first.")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(HELP_FG));
                frame.render_widget(empty, list_area.inner(Margin::new(2, 2)));
            }

            if input_mode {
                let input_widget = Paragraph::new(input_value.as_str())
                    .style(Style::default().fg(FG))
                    .block(Block::default().title(" Rename ").borders(Borders::ALL));
                frame.render_widget(input_widget, input_area);
                frame.set_cursor_position((
                    input_area.x + 1 + input_cursor as u16,
                    input_area.y + 1,
                ));
            }

            let help_text = if input_mode {
                "↵ confirm, esc cancel"
            } else {
                "↑↓ select, ↵ play/stop, r rename, x delete, esc/q exit"
            };
            let help = Paragraph::new(help_text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(HELP_FG));
            frame.render_widget(help, footer_area);
        })?;

        Ok(())
    }

    /// Cleans up terminal state and restores normal mode.
    fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        tracing::debug!("Takes browser terminal cleanup complete");
        Ok(())
    }
}

impl Drop for TakesBrowser {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn load_entries(store: &mut TakeStore) -> Result<Vec<(String, String)>> {
    Ok(store
        .list()?
        .into_iter()
        .map(|take| (take.id, take.display_name))
        .collect())
}
