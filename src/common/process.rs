//! Process introspection and signal delivery.

use crate::common::types::extract_filename;
use crate::debug_log;
use std::collections::HashMap;
use std::time::Duration;
use sysinfo::{Pid, System};

/// What the monitor needs to know about one live process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub parent: Option<u32>,
    /// Cumulative user + system CPU time
    pub cpu_time: Duration,
    /// Seconds since the epoch; distinguishes a reused PID
    pub start_time: u64,
    pub memory_kb: u64,
    pub name: String,
    pub cmd: Vec<String>,
}

/// A point-in-time view of the process table.
///
/// `process` returns None for processes that vanished or cannot be read;
/// callers treat both as "omit this node".
pub trait ProcessSource {
    /// Re-read the process table (and system memory/CPU figures)
    fn refresh(&mut self);
    fn process(&self, pid: u32) -> Option<ProcessSample>;
    /// Live children of `pid`, ordered by PID
    fn children(&self, pid: u32) -> Vec<u32>;
    fn total_memory_kb(&self) -> u64;
    fn used_memory_kb(&self) -> u64;
    fn global_cpu_percent(&self) -> f32;
}

/// sysinfo-backed process table
pub struct SysinfoSource {
    sys: System,
    children: HashMap<u32, Vec<u32>>,
}

impl SysinfoSource {
    /// Only memory totals are read up front; the process table stays empty
    /// until the first [`ProcessSource::refresh`]
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self {
            sys,
            children: HashMap::new(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoSource {
    fn refresh(&mut self) {
        self.sys.refresh_all();

        // sysinfo only records parent links; invert them once per refresh
        self.children.clear();
        for (pid, process) in self.sys.processes() {
            // Threads show up as processes on Linux; skip them
            if process.thread_kind().is_some() {
                continue;
            }
            if let Some(ppid) = process.parent() {
                self.children
                    .entry(ppid.as_u32())
                    .or_default()
                    .push(pid.as_u32());
            }
        }
        for kids in self.children.values_mut() {
            kids.sort_unstable();
        }
    }

    fn process(&self, pid: u32) -> Option<ProcessSample> {
        self.sys.process(Pid::from_u32(pid)).map(|p| ProcessSample {
            pid,
            parent: p.parent().map(|pp| pp.as_u32()),
            cpu_time: Duration::from_millis(p.accumulated_cpu_time()),
            start_time: p.start_time(),
            memory_kb: p.memory() / 1024,
            name: p.name().to_string_lossy().to_string(),
            cmd: p
                .cmd()
                .iter()
                .map(|s| s.to_string_lossy().to_string())
                .collect(),
        })
    }

    fn children(&self, pid: u32) -> Vec<u32> {
        self.children.get(&pid).cloned().unwrap_or_default()
    }

    fn total_memory_kb(&self) -> u64 {
        self.sys.total_memory() / 1024
    }

    fn used_memory_kb(&self) -> u64 {
        self.sys.used_memory() / 1024
    }

    fn global_cpu_percent(&self) -> f32 {
        self.sys.global_cpu_usage()
    }
}

/// Executable basename plus space-joined arguments, or the bare name when the
/// command line is unavailable (kernel threads, zombies, other users' processes)
pub fn display_command(sample: &ProcessSample) -> String {
    match sample.cmd.split_first() {
        Some((exe, args)) if !exe.is_empty() => {
            let mut command = extract_filename(exe).to_string();
            for arg in args {
                command.push(' ');
                command.push_str(arg);
            }
            command
        }
        _ => sample.name.clone(),
    }
}

/// SIGTERM, sent by the `x` key
pub const SIGTERM: i32 = 15;

/// Send `signal` to `pid`. A vanished or foreign process is a silent no-op.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: i32) -> bool {
    let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // pid 0 and negative values address process groups; never allow that
    if raw_pid <= 0 {
        return false;
    }
    let result = unsafe { libc::kill(raw_pid, signal) };
    if result == 0 {
        debug_log!("SIGNAL: sent {} to {}", signal, pid);
        true
    } else {
        debug_log!(
            "SIGNAL: {} to {} failed: {}",
            signal,
            pid,
            std::io::Error::last_os_error()
        );
        false
    }
}

#[cfg(not(unix))]
pub fn send_signal(pid: u32, signal: i32) -> bool {
    debug_log!("SIGNAL: {} to {} unsupported on this platform", signal, pid);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, cmd: &[&str]) -> ProcessSample {
        ProcessSample {
            pid: 1,
            parent: None,
            cpu_time: Duration::ZERO,
            start_time: 0,
            memory_kb: 0,
            name: name.to_string(),
            cmd: cmd.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_display_command_uses_basename_and_args() {
        let s = sample("python3", &["/usr/bin/python3", "-m", "http.server"]);
        assert_eq!(display_command(&s), "python3 -m http.server");
    }

    #[test]
    fn test_display_command_without_args() {
        assert_eq!(display_command(&sample("zsh", &["-zsh"])), "-zsh");
    }

    #[test]
    fn test_display_command_falls_back_to_name() {
        assert_eq!(display_command(&sample("kworker/0:1", &[])), "kworker/0:1");
    }

    #[test]
    fn test_display_command_empty_executable_falls_back_to_name() {
        assert_eq!(display_command(&sample("node", &[""])), "node");
    }

    #[cfg(unix)]
    #[test]
    fn test_send_signal_rejects_process_groups() {
        assert!(!send_signal(0, 0));
        assert!(!send_signal(u32::MAX, 0));
    }

    #[cfg(unix)]
    #[test]
    fn test_send_signal_zero_to_self_succeeds() {
        // signal 0 only checks that the target exists
        assert!(send_signal(std::process::id(), 0));
    }

    #[test]
    fn test_sysinfo_source_reads_table_only_on_refresh() {
        let mut source = SysinfoSource::new();
        assert!(source.total_memory_kb() > 0);
        assert!(source.process(std::process::id()).is_none());

        source.refresh();
        assert!(source.process(std::process::id()).is_some());
    }
}
