//! Elapsed-time helper for bounding waits.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::trace;

/// A started stopwatch.
///
/// Construct with [`Timer::start`]; there is no unstarted state to query.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: Instant,
}

impl Timer {
    /// Record now as the reference point.
    pub fn start() -> Self {
        let timer = Self {
            started: Instant::now(),
        };
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        trace!(
            sec = since_epoch.as_secs(),
            usec = since_epoch.subsec_micros(),
            "timer start"
        );
        timer
    }

    /// Move the reference point to now.
    pub fn restart(&mut self) {
        *self = Self::start();
    }

    /// True once strictly more than `timeout_secs` whole seconds have passed.
    pub fn elapsed(&self, timeout_secs: u64) -> bool {
        let elapsed = self.age() > Duration::from_secs(timeout_secs);
        trace!(timeout_secs, elapsed, "timer check");
        elapsed
    }

    /// Time since the reference point.
    pub fn age(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_timer_not_elapsed() {
        let timer = Timer::start();
        assert!(!timer.elapsed(1));
        assert!(!timer.elapsed(60));
    }

    #[test]
    fn test_zero_timeout_elapses() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed(0));
    }

    #[test]
    fn test_restart_resets_age() {
        let mut timer = Timer::start();
        std::thread::sleep(Duration::from_millis(20));
        let before = timer.age();
        timer.restart();
        assert!(timer.age() < before);
    }
}
