//! Cooperative shutdown.
//!
//! Long-running loops poll a [`ShutdownToken`]; the process boundary cancels
//! it when a termination signal arrives, recording the signal number as the
//! exit status.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    status: AtomicI32,
}

/// Cloneable cancellation flag shared by every loop in the process.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown with `status` as the process exit code.
    ///
    /// Only the first request sets the status.
    pub fn cancel(&self, status: i32) {
        if self
            .inner
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.inner.status.store(status, Ordering::Release);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Exit code requested by whoever cancelled; 0 while still running.
    pub fn exit_status(&self) -> i32 {
        self.inner.status.load(Ordering::Acquire)
    }

    /// Sleep for `duration` in small steps, returning early on cancellation.
    ///
    /// Returns `true` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let step = Duration::from_millis(10);
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_cancelled() {
                return false;
            }
            let nap = remaining.min(step);
            std::thread::sleep(nap);
            remaining -= nap;
        }
        !self.is_cancelled()
    }
}
