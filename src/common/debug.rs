//! Debug logging to a file under the user's cache directory.
//!
//! The monitor owns the terminal while it runs, so nothing can go to stderr.
//! With `--debug` every message lands in `<cache_dir>/tmux-monitor/debug.log`.
//! Use the [`debug_log!`](crate::debug_log) macro: arguments are only formatted
//! when logging is enabled, which matters inside the per-process refresh path.

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::OnceLock;

static LOG_FILE: OnceLock<Option<Mutex<fs::File>>> = OnceLock::new();

/// Log a formatted message if `--debug` was given
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if $crate::common::debug::is_debug_enabled() {
            $crate::common::debug::write_line(&format!($($arg)*));
        }
    };
}

/// Open (and truncate) the log file. Returns the path when logging is active.
pub fn init_debug(enabled: bool) -> Option<PathBuf> {
    let path = if enabled { debug_log_path() } else { None };
    let file = path.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let mut file = fs::File::create(path).ok()?;
        let _ = writeln!(
            file,
            "=== tmux-monitor debug log started at {} ===",
            Utc::now()
        );
        Some(Mutex::new(file))
    });
    let active = file.is_some();
    let _ = LOG_FILE.set(file);
    path.filter(|_| active)
}

/// Get the path to the debug log file
pub fn debug_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|c| c.join("tmux-monitor").join("debug.log"))
}

pub fn is_debug_enabled() -> bool {
    matches!(LOG_FILE.get(), Some(Some(_)))
}

/// Append one timestamped line. Warm-up and clipboard threads log too, hence the mutex.
pub fn write_line(msg: &str) {
    if let Some(Some(file)) = LOG_FILE.get() {
        if let Ok(mut file) = file.lock() {
            let timestamp = Utc::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] {}", timestamp, msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_under_tool_directory() {
        if let Some(path) = debug_log_path() {
            assert!(path.ends_with("tmux-monitor/debug.log"));
        }
    }

    #[test]
    fn test_logging_disabled_by_default() {
        // LOG_FILE is never initialised in unit tests
        assert!(!is_debug_enabled());
        write_line("ignored");
        debug_log!("ignored {}", 1);
    }
}
