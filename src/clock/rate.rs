//! Call-rate measurement
//!
//! A [`RateMeter`] wraps one unit of work. Every run is timed, and once a
//! second the number of runs in the closing window is published to a
//! [`RateGauge`] that other threads can read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::consts::RATE_WINDOW;
use crate::platform::TimeSource;

/// Shared, read-only view of a published rate (calls per second)
#[derive(Debug, Clone, Default)]
pub struct RateGauge(Arc<AtomicU32>);

impl RateGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls counted in the most recently completed window
    #[inline]
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    fn publish(&self, rate: u32) {
        self.0.store(rate, Ordering::Relaxed);
    }
}

/// Times a wrapped action and counts its calls per second
pub struct RateMeter<F> {
    label: &'static str,
    action: F,
    time: Arc<dyn TimeSource>,
    last_duration: Duration,
    count: u32,
    window_start: Duration,
    gauge: RateGauge,
}

impl<F: FnMut()> RateMeter<F> {
    pub fn new(label: &'static str, action: F, time: Arc<dyn TimeSource>) -> Self {
        let window_start = time.now();
        Self {
            label,
            action,
            time,
            last_duration: Duration::ZERO,
            count: 0,
            window_start,
            gauge: RateGauge::new(),
        }
    }

    /// Publish into an existing gauge instead of a private one
    pub fn with_gauge(mut self, gauge: RateGauge) -> Self {
        self.gauge = gauge;
        self
    }

    /// Run the action once and return how long it took
    ///
    /// The published rate changes at most once per window and lags by up to
    /// one window.
    pub fn run(&mut self) -> Duration {
        let start = self.time.now();
        (self.action)();
        let end = self.time.now();

        self.last_duration = end.saturating_sub(start);
        self.count += 1;

        if end.saturating_sub(self.window_start) >= RATE_WINDOW {
            log::trace!("{} rate: {}/s", self.label, self.count);
            self.gauge.publish(self.count);
            self.count = 0;
            self.window_start = end;
        }

        self.last_duration
    }

    /// Start a fresh window and zero the published rate
    pub fn reset(&mut self) {
        self.count = 0;
        self.window_start = self.time.now();
        self.last_duration = Duration::ZERO;
        self.gauge.publish(0);
    }
}

impl<F> RateMeter<F> {
    /// Duration of the most recent run
    #[inline]
    pub fn last_duration(&self) -> Duration {
        self.last_duration
    }

    #[inline]
    pub fn rate(&self) -> u32 {
        self.gauge.get()
    }

    /// A handle other threads can read the rate through
    pub fn gauge(&self) -> RateGauge {
        self.gauge.clone()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
