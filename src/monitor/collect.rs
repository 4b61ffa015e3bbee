//! One refresh tick: query tmux, walk the pane trees, sum the totals.

use crate::common::process::ProcessSource;
use crate::common::tmux::Multiplexer;
use crate::common::types::{ProcessNode, SessionSnapshot, SystemStats, WindowSnapshot};
use crate::debug_log;
use crate::monitor::cpu::{lock, SharedCpuTracker};
use crate::monitor::pane_cache::PaneCache;
use crate::monitor::tree::build_tree;
use std::collections::HashSet;
use std::time::Instant;

/// Owns the data sources and every table that persists between ticks
pub struct Collector<M: Multiplexer, S: ProcessSource> {
    mux: M,
    source: S,
    cpu: SharedCpuTracker,
    panes: PaneCache,
}

impl<M: Multiplexer, S: ProcessSource> Collector<M, S> {
    pub fn new(mux: M, source: S, cpu: SharedCpuTracker) -> Self {
        Self {
            mux,
            source,
            cpu,
            panes: PaneCache::default(),
        }
    }

    #[cfg(test)]
    pub fn mux(&self) -> &M {
        &self.mux
    }

    pub fn cpu(&self) -> &SharedCpuTracker {
        &self.cpu
    }

    pub fn total_memory_mb(&self) -> u64 {
        self.source.total_memory_kb() / 1024
    }

    #[cfg(test)]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    #[cfg(test)]
    pub fn mux_mut(&mut self) -> &mut M {
        &mut self.mux
    }

    /// Every window of `session` with its process tree, in tmux order
    pub fn collect_windows(&mut self, session: &str, now: Instant) -> Vec<WindowSnapshot> {
        self.source.refresh();
        let windows = self.mux.list_windows(session);

        let mut cpu = lock(&self.cpu);
        let mut observed = HashSet::new();
        let mut snapshots = Vec::with_capacity(windows.len());
        for (index, name) in windows {
            let mux = &self.mux;
            let pane_pids = self
                .panes
                .get_or_fetch(session, index, now, || mux.list_pane_pids(session, index));
            let processes = build_tree(&self.source, &mut cpu, now, &pane_pids);
            observed.extend(processes.iter().map(|p| p.pid));
            snapshots.push(window_snapshot(name, index, pane_pids, processes));
        }

        // Anything not walked this tick starts over from a fresh baseline
        cpu.retain(|pid| observed.contains(&pid));
        let tracked = cpu.len();
        drop(cpu);

        let live: HashSet<u32> = snapshots.iter().map(|w| w.index).collect();
        self.panes
            .retain(|s, window| s != session || live.contains(&window));

        debug_log!(
            "REFRESH: session {} -> {} windows, {} processes, {} baselines, {} cached panes",
            session,
            snapshots.len(),
            snapshots.iter().map(|w| w.process_count).sum::<usize>(),
            tracked,
            self.panes.len()
        );
        snapshots
    }

    /// Totals for every session, sorted by CPU, plus machine-wide figures
    pub fn collect_sessions(&mut self, now: Instant) -> (Vec<SessionSnapshot>, SystemStats) {
        self.source.refresh();

        let mut cpu = lock(&self.cpu);
        let mut observed = HashSet::new();
        let mut sessions = Vec::new();
        let mut live: HashSet<(String, u32)> = HashSet::new();
        for name in self.mux.list_sessions() {
            let windows = self.mux.list_windows(&name);
            let mut session = SessionSnapshot {
                name: name.clone(),
                window_count: windows.len(),
                ..Default::default()
            };
            for (index, _) in windows {
                let mux = &self.mux;
                let pane_pids = self
                    .panes
                    .get_or_fetch(&name, index, now, || mux.list_pane_pids(&name, index));
                let processes = build_tree(&self.source, &mut cpu, now, &pane_pids);
                observed.extend(processes.iter().map(|p| p.pid));
                let (cpu_total, memory_kb) = sum_usage(&processes);
                session.cpu_total += cpu_total;
                session.memory_kb += memory_kb;
                session.process_count += processes.len();
                live.insert((name.clone(), index));
            }
            sessions.push(session);
        }

        cpu.retain(|pid| observed.contains(&pid));
        drop(cpu);

        self.panes
            .retain(|session, window| live.contains(&(session.to_string(), window)));

        sort_sessions(&mut sessions);
        let stats = system_stats(&self.source, &sessions);
        debug_log!(
            "REFRESH: overview -> {} sessions, tmux cpu {:.1}%",
            sessions.len(),
            stats.tmux_cpu_percent
        );
        (sessions, stats)
    }
}

fn sum_usage(processes: &[ProcessNode]) -> (f32, u64) {
    processes
        .iter()
        .fold((0.0, 0), |(cpu, mem), p| (cpu + p.cpu_percent, mem + p.memory_kb))
}

/// Window totals are the sums of its already-sampled nodes, so no PID is read
/// twice in one tick
pub fn window_snapshot(
    name: String,
    index: u32,
    pane_pids: Vec<u32>,
    processes: Vec<ProcessNode>,
) -> WindowSnapshot {
    let (cpu_total, memory_kb) = sum_usage(&processes);
    WindowSnapshot {
        name,
        index,
        cpu_total,
        memory_kb,
        process_count: processes.len(),
        pane_pids,
        processes,
    }
}

/// CPU descending; equal CPU keeps discovery order
pub fn sort_sessions(sessions: &mut [SessionSnapshot]) {
    sessions.sort_by(|a, b| b.cpu_total.total_cmp(&a.cpu_total));
}

pub fn system_stats<S: ProcessSource>(source: &S, sessions: &[SessionSnapshot]) -> SystemStats {
    let total_kb = source.total_memory_kb();
    let used_kb = source.used_memory_kb();
    SystemStats {
        cpu_percent: source.global_cpu_percent(),
        memory_used_mb: used_kb / 1024,
        memory_percent: if total_kb == 0 {
            0.0
        } else {
            (used_kb as f64 * 100.0 / total_kb as f64) as f32
        },
        tmux_cpu_percent: sessions.iter().map(|s| s.cpu_total).sum(),
        tmux_memory_kb: sessions.iter().map(|s| s.memory_kb).sum(),
    }
}
