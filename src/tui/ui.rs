//! TUI rendering functions.

use crate::common::types::{format_memory, memory_percent, truncate_command, WindowSnapshot};
use crate::monitor::tree::tree_prefix;
use crate::tui::app::{App, View};
use crate::tui::input::InputMode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Rows above this CPU share are drawn in green
const BUSY_PROCESS_CPU: f32 = 10.0;
/// Overview rows above either threshold are drawn in red
const HOT_SESSION_CPU: f32 = 20.0;
const HOT_SESSION_MEM_PERCENT: f64 = 10.0;

const TAB_NAME_WIDTH: usize = 12;
const SESSION_NAME_WIDTH: usize = 18;

const HELP_LINES: &[&str] = &[
    "Tmux Resource Monitor - Keyboard Controls",
    "",
    "Navigation:",
    "  o, O or Esc           Go back to overview of all sessions",
    "  <- -> or h l          Navigate between windows",
    "  q or Q                Exit the monitor",
    "  ?                     Show this help screen",
    "",
    "Process Browsing (press j or down to start):",
    "  j/k or up/down        Navigate up/down through processes",
    "  Alt+h/l or Alt+<- ->  Scroll long command lines horizontally",
    "  x                     Send SIGTERM (15) to selected process",
    "  s                     Enter signal number to send custom signal",
    "  y                     Copy process command to clipboard",
    "  Y                     Copy process PID to clipboard",
    "",
    "Overview:",
    "  j/k or arrows         Browse sessions",
    "  Enter                 Open the selected session",
    "  Esc                   Stop browsing",
    "",
    "Press any key to return to the monitor...",
];

/// Build the ratatui UI
pub fn ui(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if app.input_mode == InputMode::Help {
        render_help(frame, area);
        return;
    }
    match app.view {
        View::Overview => render_overview(frame, app, area),
        View::Detail => render_detail(frame, app, area),
    }
}

/// Placeholder shown while the first snapshot is collected
pub fn render_loading(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let middle = Rect {
        y: area.y + area.height / 2,
        height: area.height.min(1),
        ..area
    };
    let line = Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
    .centered();
    frame.render_widget(Paragraph::new(line), middle);
}

fn dim_separator(width: u16) -> Line<'static> {
    Line::from(Span::styled(
        "-".repeat(width.saturating_sub(1) as usize),
        Style::default().fg(Color::Blue),
    ))
}

// ============================================================================
// Session detail
// ============================================================================

pub fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Length(1), // summary
        Constraint::Length(1), // tabs
        Constraint::Length(1), // window header
        Constraint::Length(1), // table header
        Constraint::Length(1), // separator
        Constraint::Min(0),    // processes
        Constraint::Length(1), // window totals
        Constraint::Length(1), // footer / prompt
    ])
    .split(area);

    let session = app.session.clone().unwrap_or_default();
    frame.render_widget(Paragraph::new(title_line(&session)), chunks[0]);
    frame.render_widget(Paragraph::new(summary_line(app)), chunks[1]);
    frame.render_widget(Paragraph::new(tab_line(app)), chunks[2]);

    if let Some(window) = app.current_window() {
        frame.render_widget(Paragraph::new(window_header(window)), chunks[3]);
        let header = format!("{:>8} {:>6} {:>12} COMMAND", "PID", "CPU%", "MEM");
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                header,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))),
            chunks[4],
        );
        frame.render_widget(
            Paragraph::new(dim_separator(area.width.min(61))),
            chunks[5],
        );
        frame.render_widget(Paragraph::new(window_totals(window, app.total_memory_mb)), chunks[7]);
    }

    render_process_rows(frame, app, chunks[6]);
    frame.render_widget(Paragraph::new(footer_line(app)), chunks[8]);
}

fn title_line(session: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "Session:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::REVERSED | Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            session.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ])
    .centered()
}

fn summary_line(app: &App) -> Line<'static> {
    let cpu: f32 = app.windows.iter().map(|w| w.cpu_total).sum();
    let mem_kb: u64 = app.windows.iter().map(|w| w.memory_kb).sum();
    let processes: usize = app.windows.iter().map(|w| w.process_count).sum();

    let label = Style::default().fg(Color::Yellow);
    let value = Style::default().fg(Color::Green);
    let sep = Style::default().fg(Color::Blue);
    Line::from(vec![
        Span::styled("Windows: ", label),
        Span::styled(app.windows.len().to_string(), value),
        Span::styled(" | ", sep),
        Span::styled("CPU: ", label),
        Span::styled(format!("{:.1}%", cpu), value),
        Span::styled(" | ", sep),
        Span::styled("MEM: ", label),
        Span::styled(format_memory(mem_kb, app.total_memory_mb), value),
        Span::styled(" | ", sep),
        Span::styled("Processes: ", label),
        Span::styled(processes.to_string(), value),
    ])
    .centered()
}

fn tab_line(app: &App) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            "Windows",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::styled(": ", Style::default().fg(Color::Cyan)),
    ];
    let tab = Style::default().fg(Color::Yellow);
    for (i, window) in app.windows.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", tab));
        }
        let name = truncate_command(&window.name, TAB_NAME_WIDTH);
        if i == app.current_tab {
            spans.push(Span::styled(
                format!("[{}]", name),
                tab.add_modifier(Modifier::REVERSED),
            ));
        } else {
            spans.push(Span::styled(name, tab));
        }
    }
    if !app.windows.is_empty() {
        spans.push(Span::styled(
            format!(" ({}/{})", app.current_tab + 1, app.windows.len()),
            tab,
        ));
    }
    Line::from(spans)
}

fn window_header(window: &WindowSnapshot) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "Window",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::styled(": ", Style::default().fg(Color::Cyan)),
        Span::styled(
            window.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ({})", window.index),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - ", Style::default().fg(Color::Blue)),
        Span::styled(
            window.pane_pids.len().to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" panes", Style::default().fg(Color::Yellow)),
    ])
}

fn window_totals(window: &WindowSnapshot, total_memory_mb: u64) -> Line<'static> {
    let text = format!(
        "TOTAL: CPU {:.1}% | RAM {}MB ({:.1}%) | Processes {}",
        window.cpu_total,
        window.memory_kb / 1024,
        memory_percent(window.memory_kb, total_memory_mb),
        window.process_count
    );
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))
}

/// First row to show so the selection stays on screen
fn viewport_start(selected: Option<usize>, rows: usize) -> usize {
    match selected {
        Some(selected) if rows > 0 && selected >= rows => selected + 1 - rows,
        _ => 0,
    }
}

fn render_process_rows(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(window) = app.windows.get(app.current_tab) else {
        return;
    };
    let rows = area.height as usize;
    let selected = app.process_browsing.then_some(app.selected_process);
    let first = viewport_start(selected, rows);
    let width = area.width as usize;

    let mut command_width = app.command_width;
    let mut lines = Vec::with_capacity(rows);
    for (i, process) in window.processes.iter().enumerate().skip(first).take(rows) {
        let is_selected = selected == Some(i);
        let base = format!(
            "{:>8} {:>6.1} {:>12}",
            process.pid,
            process.cpu_percent,
            format_memory(process.memory_kb, app.total_memory_mb)
        );
        let prefix = tree_prefix(&window.processes, i);
        let used = base.chars().count() + prefix.chars().count() + 1;
        let available = width.saturating_sub(used + 1);
        if is_selected {
            command_width = available;
        }
        let command = visible_command(&process.command, available, app.scroll_offset, is_selected);

        let (text_style, tree_style) = if is_selected {
            (
                Style::default().fg(Color::Black).bg(Color::White),
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        } else if process.cpu_percent > BUSY_PROCESS_CPU {
            (
                Style::default().fg(Color::Green),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            (
                Style::default(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        };

        // pane roots stand out from their descendants
        let text_style = if process.parent_pid.is_none() {
            text_style.add_modifier(Modifier::BOLD)
        } else {
            text_style
        };

        lines.push(Line::from(vec![
            Span::styled(base, text_style),
            Span::styled(prefix, tree_style),
            Span::styled(" ", text_style),
            Span::styled(command, text_style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
    app.command_width = command_width;
}

/// The slice of `command` that fits in `width` columns.
///
/// The selected row scrolls horizontally, with `<<` / `>>` marking hidden
/// text on either side; other rows are cut with "...".
pub fn visible_command(command: &str, width: usize, offset: usize, selected: bool) -> String {
    let len = command.chars().count();
    if len <= width {
        return command.to_string();
    }
    if !selected {
        return truncate_command(command, width);
    }

    let mut visible: Vec<char> = command.chars().skip(offset).take(width).collect();
    let n = visible.len();
    if n >= 2 && offset > 0 {
        visible[0] = '<';
        visible[1] = '<';
    }
    if n >= 2 && offset + width < len {
        visible[n - 2] = '>';
        visible[n - 1] = '>';
    }
    visible.into_iter().collect()
}

fn footer_line(app: &App) -> Line<'static> {
    if let InputMode::SignalInput { pid, buffer } = &app.input_mode {
        return Line::from(vec![
            Span::styled(
                format!("Send signal to PID {}: [ {}", pid, buffer),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(
                " ]",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ]);
    }
    if let Some((message, _)) = &app.status_message {
        return Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(Span::styled(
        "Press 'q' to quit, '?' for help",
        Style::default().fg(Color::Blue),
    ))
}

// ============================================================================
// Overview
// ============================================================================

pub fn render_overview(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Length(1),
        Constraint::Length(1), // system
        Constraint::Length(1), // tmux
        Constraint::Length(1),
        Constraint::Length(1), // separator
        Constraint::Length(1), // table header
        Constraint::Length(1), // separator
        Constraint::Min(0),    // sessions
        Constraint::Length(1), // totals
        Constraint::Length(1), // footer
    ])
    .split(area);

    let mut title = vec![Span::styled(
        "System Resource Overview",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if app.browse_sessions {
        title.push(Span::raw(" "));
        title.push(Span::styled(
            "[BROWSE]",
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::REVERSED),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(title).centered()), chunks[0]);

    let stats = &app.system;
    let system = format!(
        "{:<25}System MEM: {} MB ({:.1}%)",
        format!("System CPU: {:.1}%", stats.cpu_percent),
        stats.memory_used_mb,
        stats.memory_percent
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            system,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        chunks[2],
    );
    let tmux_percent = memory_percent(stats.tmux_memory_kb, app.total_memory_mb);
    let tmux = format!(
        "{:<25}Tmux MEM: {} MB ({:.1}%)",
        format!("Tmux CPU: {:.1}%", stats.tmux_cpu_percent),
        stats.tmux_memory_kb / 1024,
        tmux_percent
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            tmux,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        chunks[3],
    );

    frame.render_widget(Paragraph::new(dim_separator(area.width)), chunks[5]);
    let header = format!(
        "{:<20} {:>8} {:>12} {:>7} {:>6}",
        "Session", "CPU%", "MEM", "Procs", "Wins"
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            header,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        chunks[6],
    );
    frame.render_widget(Paragraph::new(dim_separator(area.width)), chunks[7]);

    render_session_rows(frame, app, chunks[8]);

    if !app.sessions.is_empty() {
        let processes: usize = app.sessions.iter().map(|s| s.process_count).sum();
        let windows: usize = app.sessions.iter().map(|s| s.window_count).sum();
        let totals = format!(
            "{:<20} {:>7.1}% {:>6}MB({:>4.1}%) {:>7} {:>6}",
            "TOTAL",
            stats.tmux_cpu_percent,
            stats.tmux_memory_kb / 1024,
            tmux_percent,
            processes,
            windows
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                totals,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            chunks[9],
        );
    }

    let long = "Press 'q' to quit, 'j/k' or up/down to browse, Enter to select session";
    let footer = if (area.width as usize) > long.len() {
        long
    } else {
        "q=quit j/k=browse Enter=select"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(footer, Style::default().fg(Color::Blue))),
        chunks[10],
    );
}

fn render_session_rows(frame: &mut Frame, app: &App, area: Rect) {
    if app.sessions.is_empty() {
        let line = Line::from(Span::styled(
            "No tmux sessions found",
            Style::default().fg(Color::Yellow),
        ))
        .centered();
        let row = Rect {
            y: area.y + area.height.min(1),
            height: area.height.saturating_sub(1).min(1),
            ..area
        };
        frame.render_widget(Paragraph::new(line), row);
        return;
    }

    let rows = area.height as usize;
    let selected = app.browse_sessions.then_some(app.selected_session);
    let first = viewport_start(selected, rows);

    let lines: Vec<Line> = app
        .sessions
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(i, session)| {
            let is_selected = selected == Some(i);
            let mem_percent = memory_percent(session.memory_kb, app.total_memory_mb);
            let name: String = session.name.chars().take(SESSION_NAME_WIDTH).collect();
            let row = format!(
                "{}{:<18} {:>7.1}% {:>6}MB({:>4.1}%) {:>7} {:>6}",
                if is_selected { "» " } else { "  " },
                name,
                session.cpu_total,
                session.memory_kb / 1024,
                mem_percent,
                session.process_count,
                session.window_count
            );
            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else if session.cpu_total > HOT_SESSION_CPU || mem_percent > HOT_SESSION_MEM_PERCENT {
                Style::default().fg(Color::Red)
            } else if i % 2 == 0 {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Line::from(Span::styled(row, style))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Help
// ============================================================================

fn render_help(frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = HELP_LINES
        .iter()
        .enumerate()
        .map(|(i, text)| {
            if i == 0 {
                Line::from(Span::styled(
                    *text,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
                .centered()
            } else {
                Line::raw(*text)
            }
        })
        .collect();
    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let body = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    frame.render_widget(Paragraph::new(lines), body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{ProcessNode, SessionSnapshot, SystemStats};
    use crate::config::Settings;
    use crate::tui::input::Action;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn node(pid: u32, depth: usize, is_last_child: bool, command: &str) -> ProcessNode {
        ProcessNode {
            pid,
            cpu_percent: 1.5,
            memory_kb: 2048,
            command: command.to_string(),
            depth,
            is_last_child,
            parent_pid: None,
            has_children: false,
        }
    }

    fn app_with(view_session: Option<&str>) -> App {
        let settings = Settings {
            session: view_session.map(String::from),
            window_filter: None,
            refresh_interval: Duration::from_secs(2),
        };
        App::new(&settings, 8192)
    }

    fn detail_app() -> App {
        let mut app = app_with(Some("work"));
        app.set_windows(vec![WindowSnapshot {
            name: "editor".to_string(),
            index: 3,
            cpu_total: 3.0,
            memory_kb: 4096,
            process_count: 2,
            pane_pids: vec![100],
            processes: vec![node(100, 0, false, "zsh"), node(101, 1, true, "vim main.rs")],
        }]);
        app
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| ui(frame, app)).unwrap();
        buffer_text(&terminal)
    }

    mod commands {
        use super::*;

        #[test]
        fn test_fitting_command_unchanged() {
            assert_eq!(visible_command("vim", 10, 0, true), "vim");
            assert_eq!(visible_command("vim", 10, 0, false), "vim");
        }

        #[test]
        fn test_unselected_long_command_truncated() {
            assert_eq!(visible_command("abcdefghijkl", 8, 0, false), "abcde...");
        }

        #[test]
        fn test_selected_at_start_marks_right_only() {
            assert_eq!(visible_command("abcdefghijkl", 6, 0, true), "abcd>>");
        }

        #[test]
        fn test_selected_in_middle_marks_both_sides() {
            assert_eq!(visible_command("abcdefghijkl", 6, 3, true), "<<fg>>");
        }

        #[test]
        fn test_selected_at_end_marks_left_only() {
            assert_eq!(visible_command("abcdefghijkl", 6, 6, true), "<<ijkl");
        }

        #[test]
        fn test_viewport_follows_selection() {
            assert_eq!(viewport_start(None, 5), 0);
            assert_eq!(viewport_start(Some(4), 5), 0);
            assert_eq!(viewport_start(Some(7), 5), 3);
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn test_detail_view_shows_tree_and_totals() {
            let mut app = detail_app();
            let text = draw(&mut app, 100, 20);
            assert!(text.contains("Session: work"));
            assert!(text.contains("[editor] (1/1)"));
            assert!(text.contains("Window: editor (3) - 1 panes"));
            assert!(text.contains("PID"));
            assert!(text.contains("└── vim main.rs"));
            assert!(text.contains("2 MB (0.0%)"));
            assert!(text.contains("TOTAL: CPU 3.0% | RAM 4MB"));
            assert!(text.contains("Press 'q' to quit"));
        }

        #[test]
        fn test_selected_row_reports_command_width() {
            let mut app = detail_app();
            app.apply(Action::SelectNext);
            draw(&mut app, 80, 20);
            assert!(app.command_width > 0);
            assert!(app.command_width < 80);
        }

        #[test]
        fn test_signal_prompt_replaces_footer() {
            let mut app = detail_app();
            app.apply(Action::SelectNext);
            app.apply(Action::BeginSignal);
            app.apply(Action::SignalDigit('9'));
            let text = draw(&mut app, 80, 20);
            assert!(text.contains("Send signal to PID 100: [ 9"));
        }

        #[test]
        fn test_overview_lists_sessions() {
            let mut app = app_with(None);
            app.set_sessions(
                vec![SessionSnapshot {
                    name: "work".to_string(),
                    cpu_total: 42.0,
                    memory_kb: 2048,
                    process_count: 7,
                    window_count: 2,
                }],
                SystemStats {
                    cpu_percent: 12.5,
                    memory_used_mb: 4096,
                    memory_percent: 50.0,
                    tmux_cpu_percent: 42.0,
                    tmux_memory_kb: 2048,
                },
            );
            let text = draw(&mut app, 100, 20);
            assert!(text.contains("System Resource Overview"));
            assert!(text.contains("System CPU: 12.5%"));
            assert!(text.contains("Tmux CPU: 42.0%"));
            assert!(text.contains("work"));
            assert!(text.contains("TOTAL"));
        }

        #[test]
        fn test_empty_overview() {
            let mut app = app_with(None);
            let text = draw(&mut app, 80, 20);
            assert!(text.contains("No tmux sessions found"));
        }

        #[test]
        fn test_help_overlay() {
            let mut app = detail_app();
            app.apply(Action::ShowHelp);
            let text = draw(&mut app, 80, 30);
            assert!(text.contains("Keyboard Controls"));
            assert!(!text.contains("TOTAL:"));
        }

        #[test]
        fn test_tiny_terminal_does_not_panic() {
            let mut app = detail_app();
            app.apply(Action::SelectNext);
            draw(&mut app, 10, 3);
            let mut overview = app_with(None);
            draw(&mut overview, 5, 2);
        }
    }
}
