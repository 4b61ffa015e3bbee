//! CPU percent from cumulative CPU time deltas.
//!
//! sysinfo's own `cpu_usage()` is relative to whenever the process table was
//! last refreshed, which is shared with the warm-up thread and the overview.
//! Instead every PID keeps its own baseline of (wall time, cumulative CPU time)
//! and the percentage is the slope between that baseline and the new reading.

use crate::common::process::{ProcessSample, ProcessSource};
use crate::debug_log;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Readings closer together than this are too noisy to divide by
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// How long after startup the warm-up pass re-reads the process table
pub const WARMUP_DELAY: Duration = Duration::from_millis(100);

/// One cumulative CPU reading of a live process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuReading {
    pub cpu_time: Duration,
    /// Process start time; a different value under the same PID means reuse
    pub start_time: u64,
}

impl ProcessSample {
    pub fn cpu_reading(&self) -> CpuReading {
        CpuReading {
            cpu_time: self.cpu_time,
            start_time: self.start_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuBaseline {
    pub taken_at: Instant,
    pub reading: CpuReading,
}

/// Per-PID baselines. Shared with the warm-up thread, so it lives behind one
/// mutex (see [`SharedCpuTracker`]).
#[derive(Debug, Default)]
pub struct CpuTracker {
    baselines: HashMap<u32, CpuBaseline>,
}

pub type SharedCpuTracker = Arc<Mutex<CpuTracker>>;

/// Lock the shared tracker, recovering the table if another thread panicked
pub fn lock(tracker: &SharedCpuTracker) -> std::sync::MutexGuard<'_, CpuTracker> {
    tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CpuTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCpuTracker {
        Arc::new(Mutex::new(Self::new()))
    }

    /// CPU percent of `pid` at `now`.
    ///
    /// `reading` is None when the process could not be read; its baseline is
    /// dropped and 0 returned. The first reading of a PID only records a
    /// baseline. With `advance` the baseline moves to this reading once a rate
    /// was computed; without it the call is a read-only peek.
    pub fn sample(
        &mut self,
        pid: u32,
        reading: Option<CpuReading>,
        now: Instant,
        advance: bool,
    ) -> f32 {
        let Some(reading) = reading else {
            self.forget(pid);
            return 0.0;
        };

        let baseline = match self.baselines.get(&pid) {
            Some(b) if b.reading.start_time == reading.start_time => *b,
            _ => {
                // first sighting, or the PID now belongs to a different process
                self.baselines.insert(
                    pid,
                    CpuBaseline {
                        taken_at: now,
                        reading,
                    },
                );
                return 0.0;
            }
        };

        let elapsed = now.saturating_duration_since(baseline.taken_at);
        if elapsed < MIN_SAMPLE_INTERVAL {
            return 0.0;
        }

        let cpu_delta = reading
            .cpu_time
            .saturating_sub(baseline.reading.cpu_time);
        let percent = (cpu_delta.as_secs_f64() / elapsed.as_secs_f64() * 100.0) as f32;

        if advance {
            self.baselines.insert(
                pid,
                CpuBaseline {
                    taken_at: now,
                    reading,
                },
            );
        }
        percent
    }

    /// Record a baseline unless one already exists for this process
    pub fn seed(&mut self, pid: u32, reading: CpuReading, now: Instant) {
        let fresh = CpuBaseline {
            taken_at: now,
            reading,
        };
        self.baselines
            .entry(pid)
            .and_modify(|b| {
                if b.reading.start_time != reading.start_time {
                    *b = fresh;
                }
            })
            .or_insert(fresh);
    }

    pub fn forget(&mut self, pid: u32) {
        self.baselines.remove(&pid);
    }

    /// Drop baselines of PIDs that are no longer observed
    pub fn retain(&mut self, mut alive: impl FnMut(u32) -> bool) {
        self.baselines.retain(|pid, _| alive(*pid));
    }

    #[cfg(test)]
    pub fn baseline(&self, pid: u32) -> Option<&CpuBaseline> {
        self.baselines.get(&pid)
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

}

/// Seed baselines for every process under `roots`.
///
/// Processes that cannot be read lose their baseline. Returns the number of
/// processes seeded.
pub fn warm_up<S: ProcessSource>(
    tracker: &SharedCpuTracker,
    source: &mut S,
    roots: &[u32],
    now: Instant,
) -> usize {
    source.refresh();
    let mut stack: Vec<u32> = roots.iter().rev().copied().collect();
    let mut visited = HashSet::new();
    let mut seeded = 0;
    let mut cpu = lock(tracker);
    while let Some(pid) = stack.pop() {
        if !visited.insert(pid) {
            continue;
        }
        match source.process(pid) {
            Some(sample) => {
                cpu.seed(pid, sample.cpu_reading(), now);
                seeded += 1;
                stack.extend(source.children(pid).into_iter().rev());
            }
            None => cpu.forget(pid),
        }
    }
    seeded
}

/// Run [`warm_up`] on a detached thread after [`WARMUP_DELAY`]. The only
/// visible effect is new entries in the shared baseline table.
pub fn spawn_warmup<S, F>(tracker: SharedCpuTracker, roots: Vec<u32>, make_source: F)
where
    S: ProcessSource,
    F: FnOnce() -> S + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("cpu-warmup".to_string())
        .spawn(move || {
            thread::sleep(WARMUP_DELAY);
            let mut source = make_source();
            let seeded = warm_up(&tracker, &mut source, &roots, Instant::now());
            debug_log!("WARMUP: seeded {} baselines from {} panes", seeded, roots.len());
        });
    if let Err(e) = spawned {
        debug_log!("WARMUP: could not spawn thread: {}", e);
    }
}
