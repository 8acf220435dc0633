pub mod render;
pub mod state;

use crate::feed::types::FeedFilter;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use state::{AppState, Screen};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Commands the TUI can send back to the app loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TuiCommand {
    Quit,
    Connect,
    Logout,
    SelectTab(String),
    CycleTab(isize),
    AddTab,
    DeleteTab,
    RenameTab(String),
    ToggleNotifications,
    AddHandle(String),
    RemoveHandle(String),
    AddRss(String),
    SetSearch(String),
    SetFilter(FeedFilter),
    /// Remember the current filter as the active tab's default.
    PinFilter,
    SetTagFilter(Option<String>),
    ToggleLike(String),
    ToggleBookmark(String),
    AddTag { post_id: String, tag: String },
    Summarize,
    DismissSummary,
    UpdateProfileName(String),
    /// Empty clears the avatar.
    UpdateProfileAvatar(String),
}

/// What the single-line input at the bottom is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    RenameTab,
    AddHandle,
    RemoveHandle,
    AddRss,
    AddTag,
    TagFilter,
    EditProfile,
    EditAvatar,
}

impl InputMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::Search => "Search (text, from:user, source:rss, #tag)",
            InputMode::RenameTab => "Stream name",
            InputMode::AddHandle => "Add handle",
            InputMode::RemoveHandle => "Remove handle",
            InputMode::AddRss => "RSS URL",
            InputMode::AddTag => "Add tag",
            InputMode::TagFilter => "Filter by tag (empty clears)",
            InputMode::EditProfile => "Display name",
            InputMode::EditAvatar => "Avatar URL (empty clears)",
        }
    }
}

/// TUI-local state that never leaves the render loop.
#[derive(Debug, Default)]
pub struct UiState {
    pub mode: InputMode,
    pub buffer: String,
    pub selected: usize,
}

impl UiState {
    pub fn clamp_selection(&mut self, post_count: usize) {
        self.selected = self.selected.min(post_count.saturating_sub(1));
    }

    fn begin(&mut self, mode: InputMode, initial: &str) {
        self.mode = mode;
        self.buffer = initial.to_string();
    }

    fn finish(&mut self) -> String {
        self.mode = InputMode::Normal;
        std::mem::take(&mut self.buffer)
    }
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(
    state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
    tick: Duration,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx, tick).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
    tick: Duration,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick);
    let mut ui = UiState::default();
    let mut spinner_frame: u8 = 0;

    loop {
        let state = state_rx.borrow().clone();
        ui.clamp_selection(state.posts.len());
        terminal.draw(|f| render::draw(f, &state, &ui, spinner_frame))?;

        tokio::select! {
            _ = ticker.tick() => {
                spinner_frame = spinner_frame.wrapping_add(1);
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(cmd) = handle_key(&mut ui, &state, key) {
                        let quit = cmd == TuiCommand::Quit;
                        let _ = cmd_tx.send(cmd).await;
                        if quit {
                            return Ok(());
                        }
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
                _ => {}
            },
        }
    }
}

/// Map one key press to at most one command, updating local UI state.
pub fn handle_key(ui: &mut UiState, state: &AppState, key: KeyEvent) -> Option<TuiCommand> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(TuiCommand::Quit);
    }

    if ui.mode != InputMode::Normal {
        return handle_input_key(ui, state, key.code);
    }

    match state.screen {
        Screen::Landing => match key.code {
            KeyCode::Enter | KeyCode::Char('c') => Some(TuiCommand::Connect),
            KeyCode::Char('q') | KeyCode::Esc => Some(TuiCommand::Quit),
            _ => None,
        },
        Screen::Authenticating => match key.code {
            KeyCode::Char('q') => Some(TuiCommand::Quit),
            _ => None,
        },
        Screen::Dashboard => handle_dashboard_key(ui, state, key.code),
    }
}

fn handle_dashboard_key(ui: &mut UiState, state: &AppState, code: KeyCode) -> Option<TuiCommand> {
    let selected_id = state.posts.get(ui.selected).map(|p| p.id.clone());
    match code {
        KeyCode::Char('q') => Some(TuiCommand::Quit),
        KeyCode::Tab | KeyCode::Char(']') => Some(TuiCommand::CycleTab(1)),
        KeyCode::BackTab | KeyCode::Char('[') => Some(TuiCommand::CycleTab(-1)),
        // F1..F9 jump straight to a stream by sidebar position.
        KeyCode::F(n @ 1..=9) => state
            .tabs
            .get(n as usize - 1)
            .map(|t| TuiCommand::SelectTab(t.id.clone())),
        KeyCode::Char(c @ '1'..='6') => {
            let idx = c as usize - '1' as usize;
            Some(TuiCommand::SetFilter(FeedFilter::ALL[idx]))
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if ui.selected + 1 < state.posts.len() {
                ui.selected += 1;
            }
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            ui.selected = ui.selected.saturating_sub(1);
            None
        }
        KeyCode::Char('/') => {
            ui.begin(InputMode::Search, &state.search);
            None
        }
        KeyCode::Char('l') => selected_id.map(TuiCommand::ToggleLike),
        KeyCode::Char('b') => selected_id.map(TuiCommand::ToggleBookmark),
        KeyCode::Char('t') => {
            if selected_id.is_some() {
                ui.begin(InputMode::AddTag, "");
            }
            None
        }
        KeyCode::Char('f') => {
            ui.begin(InputMode::TagFilter, state.tag_filter.as_deref().unwrap_or(""));
            None
        }
        KeyCode::Char('s') => Some(TuiCommand::Summarize),
        KeyCode::Char('x') => Some(TuiCommand::DismissSummary),
        KeyCode::Char('n') => Some(TuiCommand::AddTab),
        KeyCode::Char('d') => Some(TuiCommand::DeleteTab),
        KeyCode::Char('r') => {
            ui.begin(InputMode::RenameTab, &state.active_tab_name);
            None
        }
        KeyCode::Char('a') => {
            ui.begin(InputMode::AddHandle, "");
            None
        }
        KeyCode::Char('A') => {
            ui.begin(InputMode::RemoveHandle, "");
            None
        }
        KeyCode::Char('P') => Some(TuiCommand::PinFilter),
        KeyCode::Char('u') => {
            ui.begin(InputMode::AddRss, "");
            None
        }
        KeyCode::Char('m') => Some(TuiCommand::ToggleNotifications),
        KeyCode::Char('p') => {
            let name = state.user.as_ref().map(|u| u.name.as_str()).unwrap_or("");
            ui.begin(InputMode::EditProfile, name);
            None
        }
        KeyCode::Char('v') => {
            let avatar = state.user.as_ref().and_then(|u| u.avatar.as_deref()).unwrap_or("");
            ui.begin(InputMode::EditAvatar, avatar);
            None
        }
        KeyCode::Char('o') => Some(TuiCommand::Logout),
        _ => None,
    }
}

fn handle_input_key(ui: &mut UiState, state: &AppState, code: KeyCode) -> Option<TuiCommand> {
    let live_search = ui.mode == InputMode::Search;
    match code {
        KeyCode::Esc => {
            let mode = ui.mode;
            ui.finish();
            // Cancelling a search restores the unfiltered view.
            (mode == InputMode::Search).then(|| TuiCommand::SetSearch(String::new()))
        }
        KeyCode::Backspace => {
            ui.buffer.pop();
            live_search.then(|| TuiCommand::SetSearch(ui.buffer.clone()))
        }
        KeyCode::Char(c) => {
            ui.buffer.push(c);
            live_search.then(|| TuiCommand::SetSearch(ui.buffer.clone()))
        }
        KeyCode::Enter => {
            let mode = ui.mode;
            let value = ui.finish();
            match mode {
                InputMode::Normal | InputMode::Search => None,
                InputMode::RenameTab => Some(TuiCommand::RenameTab(value)),
                InputMode::AddHandle => Some(TuiCommand::AddHandle(value)),
                InputMode::RemoveHandle => Some(TuiCommand::RemoveHandle(value)),
                InputMode::AddRss => Some(TuiCommand::AddRss(value)),
                InputMode::AddTag => state.posts.get(ui.selected).map(|p| TuiCommand::AddTag {
                    post_id: p.id.clone(),
                    tag: value,
                }),
                InputMode::TagFilter => {
                    let tag = value.trim();
                    Some(TuiCommand::SetTagFilter((!tag.is_empty()).then(|| tag.to_string())))
                }
                InputMode::EditProfile => Some(TuiCommand::UpdateProfileName(value)),
                InputMode::EditAvatar => Some(TuiCommand::UpdateProfileAvatar(value)),
            }
        }
        _ => None,
    }
}
