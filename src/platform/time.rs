//! Time sources
//!
//! The clock never reads `Instant` or calls `thread::sleep` directly; it goes
//! through a [`TimeSource`] so tests can drive it with [`ManualTime`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time plus a way to wait
pub trait TimeSource: Send + Sync {
    /// Time elapsed since this source's origin
    fn now(&self) -> Duration;

    /// Block the calling thread for roughly `duration` (best effort)
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    origin: Instant,
}

impl SystemTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Deterministic time that only moves when told to
///
/// `sleep` advances the clock instead of blocking, so a drive loop running on
/// `ManualTime` completes instantly while observing the requested waits.
#[derive(Debug, Default)]
pub struct ManualTime {
    nanos: AtomicU64,
    slept_nanos: AtomicU64,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward (e.g. to simulate an expensive update)
    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Total time spent in `sleep` so far
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::SeqCst))
    }
}

impl TimeSource for ManualTime {
    #[inline]
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.slept_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
        self.advance(duration);
    }
}
