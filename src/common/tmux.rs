//! tmux command helpers.
//!
//! Every query is a `tmux` subprocess with a fixed `-F` format string. A missing
//! binary, a non-zero exit or empty output all read as "no data"; unparsable
//! lines are skipped one at a time.

use crate::debug_log;
use std::process::Command;

/// The queries the monitor issues against the multiplexer
pub trait Multiplexer {
    fn list_sessions(&self) -> Vec<String>;
    /// `(window_index, window_name)` pairs in tmux order
    fn list_windows(&self, session: &str) -> Vec<(u32, String)>;
    fn list_pane_pids(&self, session: &str, window_index: u32) -> Vec<u32>;
}

/// The real tmux server reached through the `tmux` binary on PATH
#[derive(Debug, Default, Clone, Copy)]
pub struct Tmux;

impl Multiplexer for Tmux {
    fn list_sessions(&self) -> Vec<String> {
        run_tmux(&["list-sessions", "-F", "#{session_name}"])
            .map(|out| parse_session_list(&out))
            .unwrap_or_default()
    }

    fn list_windows(&self, session: &str) -> Vec<(u32, String)> {
        run_tmux(&[
            "list-windows",
            "-t",
            session,
            "-F",
            "#{window_index}:#{window_name}",
        ])
        .map(|out| parse_window_list(&out))
        .unwrap_or_default()
    }

    fn list_pane_pids(&self, session: &str, window_index: u32) -> Vec<u32> {
        let target = format!("{}:{}", session, window_index);
        run_tmux(&["list-panes", "-t", &target, "-F", "#{pane_pid}"])
            .map(|out| parse_pane_pids(&out))
            .unwrap_or_default()
    }
}

/// Run tmux and return stdout, or None on any failure
fn run_tmux(args: &[&str]) -> Option<String> {
    match Command::new("tmux").args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug_log!(
                "tmux {:?} exited with {}: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            debug_log!("tmux {:?} failed to start: {}", args, e);
            None
        }
    }
}

/// Read a global user option (`@name`), None when unset or empty
pub fn read_option(name: &str) -> Option<String> {
    let option = format!("@{}", name);
    run_tmux(&["show-option", "-gqv", &option])
        .map(|out| out.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Get the current active tmux session name
pub fn get_current_tmux_session() -> Option<String> {
    run_tmux(&["display-message", "-p", "#{session_name}"])
        .map(|out| out.trim().to_string())
        .filter(|name| !name.is_empty())
}

pub fn parse_session_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|l| !l.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parse `index:name` lines. Names may themselves contain ':'.
pub fn parse_window_list(output: &str) -> Vec<(u32, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (index, name) = line.split_once(':')?;
            let index = index.trim().parse::<u32>().ok()?;
            Some((index, name.to_string()))
        })
        .collect()
}

pub fn parse_pane_pids(output: &str) -> Vec<u32> {
    output
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_list_skips_blank_lines() {
        assert_eq!(
            parse_session_list("main\n\nwork\n"),
            vec!["main".to_string(), "work".to_string()]
        );
    }

    #[test]
    fn test_parse_session_list_empty() {
        assert!(parse_session_list("").is_empty());
    }

    #[test]
    fn test_parse_window_list() {
        let windows = parse_window_list("0:editor\n1:logs\n");
        assert_eq!(
            windows,
            vec![(0, "editor".to_string()), (1, "logs".to_string())]
        );
    }

    #[test]
    fn test_parse_window_list_name_with_colon() {
        assert_eq!(
            parse_window_list("3:ssh host:22"),
            vec![(3, "ssh host:22".to_string())]
        );
    }

    #[test]
    fn test_parse_window_list_skips_malformed_lines() {
        let windows = parse_window_list("0:ok\ngarbage\nx:bad index\n2:\n");
        assert_eq!(windows, vec![(0, "ok".to_string()), (2, String::new())]);
    }

    #[test]
    fn test_parse_pane_pids_skips_malformed_lines() {
        assert_eq!(parse_pane_pids("123\n  456 \nnope\n\n789"), vec![123, 456, 789]);
    }
}
