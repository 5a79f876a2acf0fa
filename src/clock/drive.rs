//! The drive loop body
//!
//! One [`DriveLoop::step`] is one tick: update, render, then either sleep out
//! the rest of the period or, after an overrun, run up to `max_catch_up`
//! extra updates with no matching render. A stop request suppresses any
//! catch-up updates still pending.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::ClockShared;
use super::rate::RateMeter;
use crate::platform::TimeSource;

/// A boxed update or render callable
pub(crate) type Action = Box<dyn FnMut() + Send>;

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Step {
    /// Time slept after the tick
    pub slept: Duration,
    /// Catch-up updates issued
    pub catch_up: u32,
    /// Overrun discarded because the catch-up cap was reached
    pub dropped: Duration,
}

pub(crate) struct DriveLoop {
    update: RateMeter<Action>,
    render: RateMeter<Action>,
    shared: Arc<ClockShared>,
    time: Arc<dyn TimeSource>,
    max_catch_up: u32,
    overrun: Duration,
}

impl DriveLoop {
    pub fn new(
        update: Action,
        render: Action,
        shared: Arc<ClockShared>,
        time: Arc<dyn TimeSource>,
        max_catch_up: u32,
    ) -> Self {
        let update =
            RateMeter::new("update", update, time.clone()).with_gauge(shared.update_rate.clone());
        let render =
            RateMeter::new("render", render, time.clone()).with_gauge(shared.render_rate.clone());
        Self {
            update,
            render,
            shared,
            time,
            max_catch_up,
            overrun: Duration::ZERO,
        }
    }

    /// Fresh measurement windows and no carried overrun
    pub fn reset(&mut self) {
        self.update.reset();
        self.render.reset();
        self.overrun = Duration::ZERO;
    }

    /// Run steps until the shared running flag clears, then hand the loop back
    pub fn run(mut self) -> Self {
        while self.shared.running.load(Ordering::Acquire) {
            let step = self.step();
            if step.catch_up > 0 || !step.dropped.is_zero() {
                log::trace!(
                    "Tick overran: {} catch-up, {:?} dropped, {:?} slept",
                    step.catch_up,
                    step.dropped,
                    step.slept
                );
            }
        }
        self
    }

    /// Execute a single tick
    pub fn step(&mut self) -> Step {
        // Read once: a frequency change applies from the next tick on
        let period = self.shared.period();
        let mut step = Step::default();

        let mut used = self.update.run();
        self.shared.ticks.fetch_add(1, Ordering::AcqRel);
        used += self.render.run();

        if used < period {
            step.slept = period - used;
            self.time.sleep(step.slept);
        } else if used > period {
            self.overrun += used - period;

            while self.overrun > period
                && step.catch_up < self.max_catch_up
                && self.shared.running.load(Ordering::Acquire)
            {
                self.update.run();
                self.shared.ticks.fetch_add(1, Ordering::AcqRel);
                self.overrun -= period;
                step.catch_up += 1;
            }

            if self.overrun > period {
                log::debug!(
                    "Dropping {:?} of overrun after {} catch-up updates",
                    self.overrun,
                    step.catch_up
                );
                step.dropped = self.overrun;
                self.overrun = Duration::ZERO;
            }
        }

        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period_for;
    use crate::platform::ManualTime;
    use std::sync::atomic::AtomicU32;

    const HZ: u32 = 100;

    struct Harness {
        time: Arc<ManualTime>,
        shared: Arc<ClockShared>,
        updates: Arc<AtomicU32>,
        renders: Arc<AtomicU32>,
    }

    /// Drive loop whose update costs `first_cost` on its first call and
    /// `cost` afterwards
    fn harness(first_cost: Duration, cost: Duration, cap: u32) -> (Harness, DriveLoop) {
        let time = Arc::new(ManualTime::new());
        let shared = Arc::new(ClockShared::new(HZ));
        shared.running.store(true, Ordering::SeqCst);
        let updates = Arc::new(AtomicU32::new(0));
        let renders = Arc::new(AtomicU32::new(0));

        let (t, u) = (time.clone(), updates.clone());
        let update: Action = Box::new(move || {
            let n = u.fetch_add(1, Ordering::SeqCst);
            t.advance(if n == 0 { first_cost } else { cost });
        });
        let r = renders.clone();
        let render: Action = Box::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });

        let drive = DriveLoop::new(update, render, shared.clone(), time.clone(), cap);
        (
            Harness {
                time,
                shared,
                updates,
                renders,
            },
            drive,
        )
    }

    #[test]
    fn test_sleeps_remaining_period() {
        let period = period_for(HZ);
        let (h, mut drive) = harness(Duration::from_millis(4), Duration::from_millis(4), 3);

        let step = drive.step();
        assert_eq!(step.slept, period - Duration::from_millis(4));
        assert_eq!(step.catch_up, 0);
        assert_eq!(h.time.now(), period);
        assert_eq!(h.shared.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(h.renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_catch_up_bounded_by_cap() {
        let period = period_for(HZ);
        for cap in 0..=5u32 {
            let (h, mut drive) = harness(period * 5, Duration::ZERO, cap);

            let step = drive.step();

            // 4 periods of overrun leave room for 3 catch-ups at most
            let expected = cap.min(3);
            assert_eq!(step.catch_up, expected, "cap {cap}");
            assert_eq!(h.updates.load(Ordering::SeqCst), 1 + expected);
            assert_eq!(h.renders.load(Ordering::SeqCst), 1);
            assert_eq!(h.shared.ticks.load(Ordering::SeqCst), u64::from(1 + expected));
            assert_eq!(h.time.total_slept(), Duration::ZERO);
        }
    }

    #[test]
    fn test_overrun_dropped_at_cap() {
        let period = period_for(HZ);
        let (_h, mut drive) = harness(period * 10, Duration::ZERO, 3);

        let step = drive.step();
        assert_eq!(step.catch_up, 3);
        assert_eq!(step.dropped, period * 6);

        // Nothing carried: the next cheap tick simply sleeps
        let step = drive.step();
        assert_eq!(step.catch_up, 0);
        assert_eq!(step.slept, period);
    }

    #[test]
    fn test_small_overrun_carries() {
        let period = period_for(HZ);
        let (h, mut drive) = harness(period + period / 2, period + period * 3 / 4, 3);

        // First overrun of half a period: below one period, no catch-up yet
        let step = drive.step();
        assert_eq!(step.catch_up, 0);
        assert_eq!(step.dropped, Duration::ZERO);

        // Second brings the carry past one period; the catch-up itself
        // overruns again but that only counts from the next tick
        let step = drive.step();
        assert_eq!(step.catch_up, 1);
        assert_eq!(h.updates.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_frequency_change_applies_next_step() {
        let (h, mut drive) = harness(Duration::ZERO, Duration::ZERO, 3);

        drive.step();
        assert_eq!(h.time.total_slept(), period_for(HZ));

        h.shared.frequency.store(50, Ordering::SeqCst);
        drive.step();
        assert_eq!(h.time.total_slept(), period_for(HZ) + period_for(50));
    }

    #[test]
    fn test_no_catch_up_after_stop_request() {
        let period = period_for(HZ);
        let (h, mut drive) = harness(period * 5, Duration::ZERO, 3);
        h.shared.running.store(false, Ordering::SeqCst);

        let step = drive.step();
        assert_eq!(step.catch_up, 0);
        assert_eq!(h.updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_exits_when_flag_clear() {
        let (h, drive) = harness(Duration::ZERO, Duration::ZERO, 3);
        h.shared.running.store(false, Ordering::SeqCst);
        let _drive = drive.run();
        assert_eq!(h.updates.load(Ordering::SeqCst), 0);
    }
}
