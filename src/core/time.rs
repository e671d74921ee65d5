//! Fixed-rate timing utilities

use std::time::{Duration, Instant};

/// Schedules work at a fixed rate independent of how often it is polled.
///
/// The simulation loop polls several cadences (physics tick, terrain
/// streaming) from one thread; each fires at its own rate.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    next_due: Instant,
    fired: u64,
}

impl Cadence {
    /// Create a cadence firing `rate_hz` times per second, first due immediately
    pub fn new(rate_hz: f32) -> Self {
        Self::starting_at(rate_hz, Instant::now())
    }

    /// Create a cadence whose first firing is due at `start`
    pub fn starting_at(rate_hz: f32, start: Instant) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 { rate_hz } else { 1.0 };
        Self {
            interval: Duration::from_secs_f64(1.0 / rate as f64),
            next_due: start,
            fired: 0,
        }
    }

    /// Get the interval between firings
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get total number of firings so far
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Returns true (and schedules the next firing) if the cadence is due at `now`.
    ///
    /// When polling falls far behind, missed firings are skipped rather than
    /// replayed in a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.fired += 1;
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }

    /// Time remaining until the next firing (zero if already due)
    pub fn until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}
