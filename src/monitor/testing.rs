//! In-memory stand-ins for tmux and the process table.

use crate::common::process::{ProcessSample, ProcessSource};
use crate::common::tmux::Multiplexer;
use std::cell::Cell;
use std::collections::HashMap;
use std::time::Duration;

/// A process table the test fully controls
pub struct FakeSource {
    procs: HashMap<u32, ProcessSample>,
    pub total_memory_kb: u64,
    pub used_memory_kb: u64,
    pub global_cpu: f32,
    pub refreshes: usize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            procs: HashMap::new(),
            total_memory_kb: 8192 * 1024,
            used_memory_kb: 4096 * 1024,
            global_cpu: 12.5,
            refreshes: 0,
        }
    }

    pub fn add(&mut self, pid: u32, parent: Option<u32>, name: &str, cpu_ms: u64) {
        self.procs.insert(
            pid,
            ProcessSample {
                pid,
                parent,
                cpu_time: Duration::from_millis(cpu_ms),
                start_time: 1,
                memory_kb: 1024,
                name: name.to_string(),
                cmd: vec![format!("/usr/bin/{}", name)],
            },
        );
    }

    pub fn set_cpu_ms(&mut self, pid: u32, cpu_ms: u64) {
        if let Some(p) = self.procs.get_mut(&pid) {
            p.cpu_time = Duration::from_millis(cpu_ms);
        }
    }

    pub fn set_memory_kb(&mut self, pid: u32, kb: u64) {
        if let Some(p) = self.procs.get_mut(&pid) {
            p.memory_kb = kb;
        }
    }

    pub fn set_cmd(&mut self, pid: u32, cmd: &[&str]) {
        if let Some(p) = self.procs.get_mut(&pid) {
            p.cmd = cmd.iter().map(|s| s.to_string()).collect();
        }
    }

    pub fn remove(&mut self, pid: u32) {
        self.procs.remove(&pid);
    }
}

impl ProcessSource for FakeSource {
    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn process(&self, pid: u32) -> Option<ProcessSample> {
        self.procs.get(&pid).cloned()
    }

    fn children(&self, pid: u32) -> Vec<u32> {
        let mut kids: Vec<u32> = self
            .procs
            .values()
            .filter(|p| p.parent == Some(pid))
            .map(|p| p.pid)
            .collect();
        kids.sort_unstable();
        kids
    }

    fn total_memory_kb(&self) -> u64 {
        self.total_memory_kb
    }

    fn used_memory_kb(&self) -> u64 {
        self.used_memory_kb
    }

    fn global_cpu_percent(&self) -> f32 {
        self.global_cpu
    }
}

/// Sessions of `(index, name, pane pids)` windows
#[derive(Default)]
pub struct FakeMux {
    pub sessions: Vec<(String, Vec<(u32, String, Vec<u32>)>)>,
    pub pane_queries: Cell<usize>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, session: &str, index: u32, name: &str, panes: &[u32]) -> Self {
        let window = (index, name.to_string(), panes.to_vec());
        match self.sessions.iter_mut().find(|(s, _)| s == session) {
            Some((_, windows)) => windows.push(window),
            None => self.sessions.push((session.to_string(), vec![window])),
        }
        self
    }

    pub fn windows_mut(&mut self, session: &str) -> Option<&mut Vec<(u32, String, Vec<u32>)>> {
        self.sessions
            .iter_mut()
            .find(|(s, _)| s == session)
            .map(|(_, w)| w)
    }
}

impl Multiplexer for FakeMux {
    fn list_sessions(&self) -> Vec<String> {
        self.sessions.iter().map(|(s, _)| s.clone()).collect()
    }

    fn list_windows(&self, session: &str) -> Vec<(u32, String)> {
        self.sessions
            .iter()
            .find(|(s, _)| s == session)
            .map(|(_, windows)| {
                windows
                    .iter()
                    .map(|(index, name, _)| (*index, name.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list_pane_pids(&self, session: &str, window_index: u32) -> Vec<u32> {
        self.pane_queries.set(self.pane_queries.get() + 1);
        self.sessions
            .iter()
            .find(|(s, _)| s == session)
            .and_then(|(_, windows)| windows.iter().find(|(i, _, _)| *i == window_index))
            .map(|(_, _, panes)| panes.clone())
            .unwrap_or_default()
    }
}
