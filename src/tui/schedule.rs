//! Pacing for the main loop: data refresh and redraw run on separate clocks.

use std::time::{Duration, Instant};

/// ~30 frames per second
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(33);

/// The startup load only records CPU baselines; the first periodic refresh
/// comes soon after so real percentages show up quickly
pub const FIRST_REFRESH_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct Schedule {
    refresh_interval: Duration,
    next_refresh: Instant,
    next_redraw: Instant,
}

impl Schedule {
    pub fn new(refresh_interval: Duration, now: Instant) -> Self {
        Self {
            refresh_interval,
            next_refresh: now + FIRST_REFRESH_DELAY.min(refresh_interval),
            next_redraw: now,
        }
    }

    /// Refresh never runs while a modal prompt is open
    pub fn refresh_due(&self, now: Instant, modal: bool) -> bool {
        !modal && now >= self.next_refresh
    }

    pub fn refreshed(&mut self, now: Instant) {
        self.next_refresh = now + self.refresh_interval;
    }

    pub fn redraw_due(&self, now: Instant) -> bool {
        now >= self.next_redraw
    }

    pub fn redrawn(&mut self, now: Instant) {
        self.next_redraw = now + REDRAW_INTERVAL;
    }

    /// Draw on the next iteration regardless of the frame clock
    pub fn request_redraw(&mut self, now: Instant) {
        self.next_redraw = now;
    }

    /// How long the input poll may block without delaying a frame
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.next_redraw.saturating_duration_since(now)
    }
}
