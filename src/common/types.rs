//! Snapshot types produced by each refresh, plus display formatting helpers.

/// One process in a pane's tree, flattened in pre-order
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessNode {
    pub pid: u32,
    pub cpu_percent: f32,
    pub memory_kb: u64,
    /// Executable basename plus arguments, or the bare process name
    pub command: String,
    /// Recursion depth from the pane root (root = 0)
    pub depth: usize,
    pub is_last_child: bool,
    /// None for pane roots
    pub parent_pid: Option<u32>,
    #[allow(dead_code)]
    pub has_children: bool,
}

/// A tmux window and the process trees of all its panes
#[derive(Debug, Clone, Default)]
pub struct WindowSnapshot {
    pub name: String,
    pub index: u32,
    pub cpu_total: f32,
    pub memory_kb: u64,
    pub process_count: usize,
    pub pane_pids: Vec<u32>,
    pub processes: Vec<ProcessNode>,
}

/// Per-session totals shown in the overview
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub name: String,
    pub cpu_total: f32,
    pub memory_kb: u64,
    pub process_count: usize,
    pub window_count: usize,
}

/// Machine-wide and tmux-wide figures for the overview header
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub memory_used_mb: u64,
    pub memory_percent: f32,
    pub tmux_cpu_percent: f32,
    pub tmux_memory_kb: u64,
}

/// Truncate a command string for display, marking the cut with "..."
pub fn truncate_command(cmd: &str, max_len: usize) -> String {
    if cmd.chars().count() <= max_len {
        cmd.to_string()
    } else if max_len <= 3 {
        cmd.chars().take(max_len).collect()
    } else {
        let kept: String = cmd.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Extract filename from a full path
pub fn extract_filename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Share of total RAM, in percent. Zero when total RAM is unknown.
pub fn memory_percent(kb: u64, total_ram_mb: u64) -> f64 {
    if total_ram_mb == 0 {
        0.0
    } else {
        (kb as f64 * 100.0) / (total_ram_mb as f64 * 1024.0)
    }
}

/// Format RSS as whole megabytes plus share of total RAM, e.g. "2 MB (0.0%)"
pub fn format_memory(kb: u64, total_ram_mb: u64) -> String {
    format!("{} MB ({:.1}%)", kb / 1024, memory_percent(kb, total_ram_mb))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod string_utils {
        use super::*;

        #[test]
        fn test_truncate_command_short() {
            assert_eq!(truncate_command("short", 10), "short");
        }

        #[test]
        fn test_truncate_command_exact() {
            assert_eq!(truncate_command("exactly 10", 10), "exactly 10");
        }

        #[test]
        fn test_truncate_command_long() {
            assert_eq!(truncate_command("this is too long", 10), "this is...");
        }

        #[test]
        fn test_truncate_command_tiny_width() {
            assert_eq!(truncate_command("abcdef", 2), "ab");
        }

        #[test]
        fn test_truncate_command_multibyte() {
            assert_eq!(truncate_command("ééééééé", 5), "éé...");
        }

        #[test]
        fn test_extract_filename() {
            assert_eq!(extract_filename("/usr/bin/python3"), "python3");
            assert_eq!(extract_filename("vim"), "vim");
        }
    }

    mod memory {
        use super::*;

        #[test]
        fn test_format_memory_two_megabytes_of_eight_gigabytes() {
            assert_eq!(format_memory(2048, 8192), "2 MB (0.0%)");
        }

        #[test]
        fn test_format_memory_rounds_down_megabytes() {
            assert_eq!(format_memory(1536, 1024), "1 MB (0.1%)");
        }

        #[test]
        fn test_format_memory_unknown_total() {
            assert_eq!(format_memory(4096, 0), "4 MB (0.0%)");
        }

        #[test]
        fn test_memory_percent_half() {
            assert!((memory_percent(512 * 1024, 1024) - 50.0).abs() < 1e-9);
        }
    }
}
