//! Key bindings as a (context × key) → action table.
//!
//! Kept free of any application state so every binding can be tested without
//! a terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Text input mode for the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
    /// Typing a signal number for a PID captured when the prompt opened
    SignalInput { pid: u32, buffer: String },
}

impl InputMode {
    /// Modal modes swallow navigation and pause data refresh
    pub fn is_modal(&self) -> bool {
        !matches!(self, InputMode::Normal)
    }
}

/// Where a key press lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Help,
    SignalInput,
    Overview { browsing: bool },
    Detail { browsing: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ShowHelp,
    DismissHelp,
    ShowOverview,
    PrevTab,
    NextTab,
    SelectNext,
    SelectPrev,
    ScrollLeft,
    ScrollRight,
    BeginSignal,
    Terminate,
    CopyCommand,
    CopyPid,
    OpenSession,
    LeaveBrowse,
    SignalDigit(char),
    SignalBackspace,
    SignalCommit,
    SignalCancel,
}

pub fn map_key(context: KeyContext, key: KeyEvent) -> Option<Action> {
    match context {
        KeyContext::Help => Some(Action::DismissHelp),
        KeyContext::SignalInput => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => Some(Action::SignalDigit(c)),
            KeyCode::Backspace => Some(Action::SignalBackspace),
            KeyCode::Enter => Some(Action::SignalCommit),
            KeyCode::Esc => Some(Action::SignalCancel),
            _ => None,
        },
        KeyContext::Overview { browsing } => {
            global(key).or_else(|| overview_key(key, browsing))
        }
        KeyContext::Detail { browsing } => global(key).or_else(|| detail_key(key, browsing)),
    }
}

/// Bindings shared by both non-modal views
fn global(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Quit)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ShowHelp),
        _ => None,
    }
}

fn overview_key(key: KeyEvent, browsing: bool) -> Option<Action> {
    match key.code {
        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('l') => {
            Some(Action::SelectNext)
        }
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') | KeyCode::Char('h') => {
            Some(Action::SelectPrev)
        }
        KeyCode::Enter if browsing => Some(Action::OpenSession),
        KeyCode::Esc if browsing => Some(Action::LeaveBrowse),
        _ => None,
    }
}

fn detail_key(key: KeyEvent, browsing: bool) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::ALT) {
        return match key.code {
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') if browsing => {
                Some(Action::ScrollLeft)
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') if browsing => {
                Some(Action::ScrollRight)
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('o') | KeyCode::Char('O') | KeyCode::Esc => Some(Action::ShowOverview),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::PrevTab),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::NextTab),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
        KeyCode::Char('s') | KeyCode::Char('S') if browsing => Some(Action::BeginSignal),
        KeyCode::Char('x') | KeyCode::Char('X') if browsing => Some(Action::Terminate),
        KeyCode::Char('y') if browsing => Some(Action::CopyCommand),
        KeyCode::Char('Y') if browsing => Some(Action::CopyPid),
        _ => None,
    }
}
