//! High-resolution timer for frame timing.

use std::time::{Duration, Instant};

/// High-resolution timer for measuring elapsed time.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Get the total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time since the previous `tick()` (or since creation/reset), used as
    /// the frame delta when no fixed step is configured.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }

    /// Reset the timer to the current time.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_tick = now;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_monotonic() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(2));
        let first = timer.tick();
        assert!(first >= Duration::from_millis(2));
        assert!(timer.elapsed() >= first);
    }

    #[test]
    fn test_reset_restarts_elapsed() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        timer.reset();
        assert!(timer.elapsed() < Duration::from_millis(5));
    }
}
