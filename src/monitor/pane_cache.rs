//! Short-lived cache of pane PIDs per (session, window).

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Long enough to collapse repeated lookups within one tick
pub const PANE_CACHE_TTL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct PaneCacheEntry {
    pub fetched_at: Instant,
    pub pids: Vec<u32>,
}

#[derive(Debug)]
pub struct PaneCache {
    ttl: Duration,
    entries: HashMap<(String, u32), PaneCacheEntry>,
}

impl Default for PaneCache {
    fn default() -> Self {
        Self::new(PANE_CACHE_TTL)
    }
}

impl PaneCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cached pane PIDs for the window, calling `fetch` only when the entry is
    /// missing or older than the TTL
    pub fn get_or_fetch(
        &mut self,
        session: &str,
        window_index: u32,
        now: Instant,
        fetch: impl FnOnce() -> Vec<u32>,
    ) -> Vec<u32> {
        let key = (session.to_string(), window_index);
        if let Some(entry) = self.entries.get(&key) {
            if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                return entry.pids.clone();
            }
        }

        let pids = fetch();
        self.entries.insert(
            key,
            PaneCacheEntry {
                fetched_at: now,
                pids: pids.clone(),
            },
        );
        pids
    }

    /// Keep only entries whose window still exists
    pub fn retain(&mut self, mut keep: impl FnMut(&str, u32) -> bool) {
        self.entries
            .retain(|(session, window), _| keep(session, *window));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_second_call_within_ttl_is_a_hit() {
        let mut cache = PaneCache::default();
        let fetches = Cell::new(0);
        let fetch = || {
            fetches.set(fetches.get() + 1);
            vec![100, 200]
        };
        let t0 = Instant::now();

        assert_eq!(cache.get_or_fetch("main", 0, t0, fetch), vec![100, 200]);
        let again = cache.get_or_fetch("main", 0, t0 + Duration::from_millis(300), || {
            fetches.set(fetches.get() + 1);
            vec![999]
        });

        assert_eq!(again, vec![100, 200]);
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn test_expired_entry_is_refetched() {
        let mut cache = PaneCache::default();
        let fetches = Cell::new(0);
        let t0 = Instant::now();

        cache.get_or_fetch("main", 0, t0, || {
            fetches.set(fetches.get() + 1);
            vec![100]
        });
        let later = cache.get_or_fetch("main", 0, t0 + PANE_CACHE_TTL, || {
            fetches.set(fetches.get() + 1);
            vec![101]
        });

        assert_eq!(later, vec![101]);
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn test_keys_are_per_session_and_window() {
        let mut cache = PaneCache::default();
        let t0 = Instant::now();
        cache.get_or_fetch("a", 0, t0, || vec![1]);
        cache.get_or_fetch("a", 1, t0, || vec![2]);
        cache.get_or_fetch("b", 0, t0, || vec![3]);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get_or_fetch("b", 0, t0, Vec::new), vec![3]);
    }

    #[test]
    fn test_empty_result_is_cached_too() {
        let mut cache = PaneCache::default();
        let t0 = Instant::now();
        cache.get_or_fetch("gone", 4, t0, Vec::new);
        assert_eq!(cache.get_or_fetch("gone", 4, t0, || vec![7]), Vec::<u32>::new());
    }

    #[test]
    fn test_retain_prunes_vanished_windows() {
        let mut cache = PaneCache::default();
        let t0 = Instant::now();
        cache.get_or_fetch("a", 0, t0, || vec![1]);
        cache.get_or_fetch("a", 1, t0, || vec![2]);
        cache.retain(|session, window| session == "a" && window == 1);
        assert_eq!(cache.len(), 1);
    }
}
