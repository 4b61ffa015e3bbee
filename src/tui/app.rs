//! TUI application state and logic.

use crate::common::process::{ProcessSource, SIGTERM};
use crate::common::tmux::Multiplexer;
use crate::common::types::{ProcessNode, SessionSnapshot, SystemStats, WindowSnapshot};
use crate::config::Settings;
use crate::debug_log;
use crate::monitor::collect::Collector;
use crate::tui::input::{Action, InputMode, KeyContext};
use std::time::{Duration, Instant};

/// How long the signal status line stays up
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Columns moved per Alt+h / Alt+l
pub const SCROLL_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Detail,
}

/// Side effects the main loop performs on behalf of the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Refresh,
    SendSignal { pid: u32, signal: i32 },
    Copy(String),
}

/// TUI application state
pub struct App {
    pub view: View,
    pub session: Option<String>,
    pub refresh_interval: Duration,
    pub total_memory_mb: u64,
    // Latest snapshot, replaced wholesale on every refresh
    pub windows: Vec<WindowSnapshot>,
    pub sessions: Vec<SessionSnapshot>,
    pub system: SystemStats,
    // Detail view
    pub current_tab: usize,
    pub process_browsing: bool,
    pub selected_process: usize,
    pub scroll_offset: usize,
    /// Width available to the selected command, written by the renderer
    pub command_width: usize,
    // Overview
    pub browse_sessions: bool,
    pub selected_session: usize,
    pub input_mode: InputMode,
    pub status_message: Option<(String, Instant)>,
    /// Applied once, when the first window list arrives
    window_filter: Option<String>,
}

impl App {
    pub fn new(settings: &Settings, total_memory_mb: u64) -> Self {
        Self {
            view: if settings.session.is_some() {
                View::Detail
            } else {
                View::Overview
            },
            session: settings.session.clone(),
            refresh_interval: settings.refresh_interval,
            total_memory_mb,
            windows: Vec::new(),
            sessions: Vec::new(),
            system: SystemStats::default(),
            current_tab: 0,
            process_browsing: false,
            selected_process: 0,
            scroll_offset: 0,
            command_width: 0,
            browse_sessions: false,
            selected_session: 0,
            input_mode: InputMode::Normal,
            status_message: None,
            window_filter: settings.window_filter.clone(),
        }
    }

    pub fn is_modal(&self) -> bool {
        self.input_mode.is_modal()
    }

    pub fn key_context(&self) -> KeyContext {
        match (&self.input_mode, self.view) {
            (InputMode::Help, _) => KeyContext::Help,
            (InputMode::SignalInput { .. }, _) => KeyContext::SignalInput,
            (InputMode::Normal, View::Overview) => KeyContext::Overview {
                browsing: self.browse_sessions,
            },
            (InputMode::Normal, View::Detail) => KeyContext::Detail {
                browsing: self.process_browsing,
            },
        }
    }

    /// Pull a fresh snapshot for whichever view is showing
    pub fn refresh<M: Multiplexer, S: ProcessSource>(
        &mut self,
        collector: &mut Collector<M, S>,
        now: Instant,
    ) {
        match (self.view, self.session.clone()) {
            (View::Detail, Some(session)) => {
                let windows = collector.collect_windows(&session, now);
                self.set_windows(windows);
            }
            _ => {
                let (sessions, stats) = collector.collect_sessions(now);
                self.set_sessions(sessions, stats);
            }
        }
    }

    pub fn current_window(&self) -> Option<&WindowSnapshot> {
        self.windows.get(self.current_tab)
    }

    pub fn selected_node(&self) -> Option<&ProcessNode> {
        if !self.process_browsing {
            return None;
        }
        self.current_window()?.processes.get(self.selected_process)
    }

    /// Pane PIDs of every window, for the CPU warm-up pass
    pub fn pane_roots(&self) -> Vec<u32> {
        self.windows
            .iter()
            .flat_map(|w| w.pane_pids.iter().copied())
            .collect()
    }

    /// Replace the window list and carry the tab selection across.
    ///
    /// First load honours the window filter. Later loads follow the
    /// previously shown window by name, then by tmux index, then clamp.
    pub fn set_windows(&mut self, windows: Vec<WindowSnapshot>) {
        let previous = self
            .current_window()
            .map(|w| (w.name.clone(), w.index));
        // An empty list (tmux hiccup) leaves the filter for the next load
        let filter = if self.windows.is_empty() && !windows.is_empty() {
            self.window_filter.take()
        } else {
            None
        };
        self.windows = windows;

        let found = match (&filter, &previous) {
            (Some(name), _) => self.windows.iter().position(|w| &w.name == name),
            (None, Some((name, index))) => self
                .windows
                .iter()
                .position(|w| &w.name == name)
                .or_else(|| self.windows.iter().position(|w| w.index == *index)),
            (None, None) => None,
        };
        let tab = found.unwrap_or(self.current_tab);
        if tab != self.current_tab {
            self.scroll_offset = 0;
        }
        self.current_tab = tab;
        self.clamp_selection();
    }

    /// Replace the session list. The highlighted session is followed by name,
    /// since every refresh re-sorts by CPU.
    pub fn set_sessions(&mut self, sessions: Vec<SessionSnapshot>, system: SystemStats) {
        let previous = self
            .sessions
            .get(self.selected_session)
            .map(|s| s.name.clone());
        self.sessions = sessions;
        self.system = system;
        if let Some(index) =
            previous.and_then(|name| self.sessions.iter().position(|s| s.name == name))
        {
            self.selected_session = index;
        }
        self.clamp_selection();
    }

    /// Pull every index back inside the current data
    fn clamp_selection(&mut self) {
        self.current_tab = clamp_index(self.current_tab, self.windows.len());

        let process_count = self.current_window().map_or(0, |w| w.processes.len());
        if process_count == 0 {
            self.process_browsing = false;
            self.scroll_offset = 0;
        }
        let clamped = clamp_index(self.selected_process, process_count);
        if clamped != self.selected_process {
            self.scroll_offset = 0;
        }
        self.selected_process = clamped;

        if self.sessions.is_empty() {
            self.browse_sessions = false;
        }
        self.selected_session = clamp_index(self.selected_session, self.sessions.len());
    }

    pub fn set_status(&mut self, message: String, now: Instant) {
        self.status_message = Some((message, now));
    }

    pub fn clear_expired_status(&mut self, now: Instant) {
        if let Some((_, shown_at)) = &self.status_message {
            if now.saturating_duration_since(*shown_at) >= STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Report the outcome of a [`Command::SendSignal`]
    pub fn signal_sent(&mut self, pid: u32, signal: i32, delivered: bool, now: Instant) {
        let message = if delivered {
            format!("Sent signal {} to PID {}", signal, pid)
        } else {
            format!("Could not send signal {} to PID {}", signal, pid)
        };
        self.set_status(message, now);
    }

    /// Apply one key action. Anything that touches the outside world comes
    /// back as a [`Command`].
    pub fn apply(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Quit => return Some(Command::Quit),
            Action::ShowHelp => self.input_mode = InputMode::Help,
            Action::DismissHelp => self.input_mode = InputMode::Normal,
            Action::ShowOverview => {
                self.view = View::Overview;
                self.browse_sessions = false;
                self.process_browsing = false;
                return Some(Command::Refresh);
            }
            Action::PrevTab => self.step_tab(false),
            Action::NextTab => self.step_tab(true),
            Action::SelectNext => self.step_selection(true),
            Action::SelectPrev => self.step_selection(false),
            Action::ScrollLeft => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
            }
            Action::ScrollRight => {
                let max_offset = self
                    .selected_node()
                    .map_or(0, |n| max_scroll(&n.command, self.command_width));
                self.scroll_offset = (self.scroll_offset + SCROLL_STEP).min(max_offset);
            }
            Action::BeginSignal => {
                if let Some(pid) = self.selected_node().map(|n| n.pid) {
                    self.input_mode = InputMode::SignalInput {
                        pid,
                        buffer: String::new(),
                    };
                }
            }
            Action::Terminate => {
                return self.selected_node().map(|n| Command::SendSignal {
                    pid: n.pid,
                    signal: SIGTERM,
                });
            }
            Action::CopyCommand => {
                return self.selected_node().map(|n| Command::Copy(n.command.clone()));
            }
            Action::CopyPid => {
                return self.selected_node().map(|n| Command::Copy(n.pid.to_string()));
            }
            Action::OpenSession => {
                let name = self.sessions.get(self.selected_session)?.name.clone();
                debug_log!("NAV: opening session {}", name);
                self.session = Some(name);
                self.view = View::Detail;
                self.browse_sessions = false;
                self.windows.clear();
                self.current_tab = 0;
                self.process_browsing = false;
                self.selected_process = 0;
                self.scroll_offset = 0;
                return Some(Command::Refresh);
            }
            Action::LeaveBrowse => self.browse_sessions = false,
            Action::SignalDigit(digit) => {
                if let InputMode::SignalInput { buffer, .. } = &mut self.input_mode {
                    buffer.push(digit);
                }
            }
            Action::SignalBackspace => {
                if let InputMode::SignalInput { buffer, .. } = &mut self.input_mode {
                    buffer.pop();
                }
            }
            Action::SignalCommit => {
                let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
                if let InputMode::SignalInput { pid, buffer } = mode {
                    // Out-of-range or empty input just closes the prompt
                    if let Ok(signal) = buffer.trim().parse::<i32>() {
                        return Some(Command::SendSignal { pid, signal });
                    }
                }
            }
            Action::SignalCancel => self.input_mode = InputMode::Normal,
        }
        None
    }

    fn step_tab(&mut self, forward: bool) {
        let count = self.windows.len();
        if count == 0 {
            return;
        }
        self.current_tab = wrap_step(self.current_tab, count, forward);
        self.scroll_offset = 0;
        self.clamp_selection();
    }

    /// First press enters browsing on the current row; later presses move
    /// with wrap-around
    fn step_selection(&mut self, forward: bool) {
        match self.view {
            View::Overview => {
                let count = self.sessions.len();
                if count == 0 {
                    return;
                }
                if !self.browse_sessions {
                    self.browse_sessions = true;
                    return;
                }
                self.selected_session = wrap_step(self.selected_session, count, forward);
            }
            View::Detail => {
                let count = self.current_window().map_or(0, |w| w.processes.len());
                if count == 0 {
                    return;
                }
                if !self.process_browsing {
                    self.process_browsing = true;
                    self.scroll_offset = 0;
                    return;
                }
                self.selected_process = wrap_step(self.selected_process, count, forward);
                self.scroll_offset = 0;
            }
        }
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

fn wrap_step(index: usize, len: usize, forward: bool) -> usize {
    if forward {
        (index + 1) % len
    } else if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

/// Furthest horizontal offset that still shows the end of `command`
pub fn max_scroll(command: &str, width: usize) -> usize {
    command.chars().count().saturating_sub(width)
}
