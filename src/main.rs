mod common;
mod config;
mod monitor;
mod tui;

use crate::common::clipboard::copy_detached;
use crate::common::debug::init_debug;
use crate::common::process::{send_signal, SysinfoSource};
use crate::common::tmux::{get_current_tmux_session, read_option, Multiplexer, Tmux};
use crate::config::{Settings, Sources, REFRESH_RATE_OPTION, SESSION_ENV, WINDOW_FILTER_OPTION};
use crate::monitor::collect::Collector;
use crate::monitor::cpu::{spawn_warmup, CpuTracker};
use crate::tui::app::{App, Command, View};
use crate::tui::input::map_key;
use crate::tui::schedule::Schedule;
use crate::tui::ui::{render_loading, ui};
use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use crossterm::event::{poll, read, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "tmux-monitor")]
#[command(about = "Live CPU and memory monitor for tmux sessions, windows and their process trees")]
struct Args {
    /// Session to monitor (default: $TMUX_SESSION_NAME, then the attached session)
    session: Option<String>,

    /// Start on the window with this name
    #[arg(short, long)]
    window: Option<String>,

    /// Refresh interval in seconds (default: 2.0)
    #[arg(short, long, allow_negative_numbers = true)]
    refresh_rate: Option<f64>,

    /// List available tmux sessions and exit
    #[arg(long)]
    list_sessions: bool,

    /// Start with the overview of all sessions
    #[arg(long)]
    overview: bool,

    /// Write a debug log to the cache directory
    #[arg(long)]
    debug: bool,
}

fn print_sessions(sessions: &[String]) {
    if sessions.is_empty() {
        println!("{}", "No tmux sessions found".yellow());
        return;
    }
    println!("{}", "Available tmux sessions:".bold());
    for session in sessions {
        println!("  {}", session.cyan());
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let session_env = std::env::var(SESSION_ENV).ok();
    // Only ask tmux what is attached when nothing else names a session
    let current_session = if args.session.is_none() && session_env.is_none() && !args.overview {
        get_current_tmux_session()
    } else {
        None
    };
    let refresh_option = if args.refresh_rate.is_none() {
        read_option(REFRESH_RATE_OPTION)
    } else {
        None
    };

    Settings::resolve(Sources {
        session_arg: args.session.clone(),
        session_env,
        current_session,
        window_arg: args.window.clone(),
        window_option: read_option(WINDOW_FILTER_OPTION),
        refresh_arg: args.refresh_rate,
        refresh_option,
        overview: args.overview,
    })
}

fn run(terminal: &mut DefaultTerminal, settings: Settings, running: Arc<AtomicBool>) -> Result<()> {
    let mut collector = Collector::new(Tmux, SysinfoSource::new(), CpuTracker::shared());
    let mut app = App::new(&settings, collector.total_memory_mb());

    let loading = match app.view {
        View::Overview => "Loading system and tmux session data...",
        View::Detail => "Loading tmux session data...",
    };
    terminal
        .draw(|frame| render_loading(frame, loading))
        .context("Failed to draw loading screen")?;

    // First pass only records CPU baselines
    app.refresh(&mut collector, Instant::now());
    let roots = app.pane_roots();
    if !roots.is_empty() {
        spawn_warmup(collector.cpu().clone(), roots, SysinfoSource::new);
    }

    let mut schedule = Schedule::new(app.refresh_interval, Instant::now());
    loop {
        // Check for signal-based exit
        if !running.load(Ordering::SeqCst) {
            return Ok(());
        }

        // 1. Poll for input, no longer than the next frame is due
        if poll(schedule.poll_timeout(Instant::now())).context("Failed to poll terminal events")? {
            match read().context("Failed to read terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = map_key(app.key_context(), key) {
                        match app.apply(action) {
                            Some(Command::Quit) => return Ok(()),
                            Some(Command::Refresh) => {
                                let now = Instant::now();
                                app.refresh(&mut collector, now);
                                schedule.refreshed(now);
                            }
                            Some(Command::SendSignal { pid, signal }) => {
                                let delivered = send_signal(pid, signal);
                                app.signal_sent(pid, signal, delivered, Instant::now());
                            }
                            Some(Command::Copy(text)) => copy_detached(text),
                            None => {}
                        }
                    }
                    schedule.request_redraw(Instant::now());
                }
                Event::Resize(_, _) => schedule.request_redraw(Instant::now()),
                _ => {}
            }
        }

        // 2. Gather data
        let now = Instant::now();
        if schedule.refresh_due(now, app.is_modal()) {
            app.refresh(&mut collector, now);
            schedule.refreshed(now);
        }

        // 3. Draw UI
        let now = Instant::now();
        if schedule.redraw_due(now) {
            app.clear_expired_status(now);
            if let Err(e) = terminal.draw(|frame| ui(frame, &mut app)) {
                debug_log!("DRAW: dropped frame: {}", e);
            }
            schedule.redrawn(now);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = init_debug(args.debug) {
        eprintln!("Debug log: {}", path.display());
    }

    if args.list_sessions {
        print_sessions(&Tmux.list_sessions());
        return Ok(());
    }

    let settings = load_settings(&args)?;

    if let Some(ref session) = settings.session {
        let sessions = Tmux.list_sessions();
        if !sessions.contains(session) {
            let available = if sessions.is_empty() {
                "none".to_string()
            } else {
                sessions.join(", ")
            };
            bail!(
                "Session '{}' not found. Available sessions: {}",
                session,
                available
            );
        }
    }
    debug_log!(
        "START: session={:?} window_filter={:?} refresh={:?}",
        settings.session,
        settings.window_filter,
        settings.refresh_interval
    );

    // Set up signal handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let result = {
        let mut terminal = ratatui::init();
        let _restore = scopeguard::guard((), |_| ratatui::restore());
        run(&mut terminal, settings, running)
    };
    println!("Monitoring stopped.");
    result
}
