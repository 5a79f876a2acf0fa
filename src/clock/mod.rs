//! Fixed-rate scheduler
//!
//! A [`Clock`] owns one drive thread that calls a configured update and
//! render action at the target frequency. Ticks that overrun their period are
//! followed by a bounded number of catch-up updates (no render); overrun
//! beyond the cap is dropped rather than accumulated.
//!
//! `start`/`stop` are serialized by a lock and both idempotent. `stop` joins
//! the drive thread, so once it returns no update or render is in flight.

mod drive;
pub mod rate;

pub use rate::{RateGauge, RateMeter};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::platform::{SystemTime, TimeSource};
use crate::settings::Settings;
use drive::{Action, DriveLoop};

/// Handle for removing a frequency-change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type FrequencyListener = dyn Fn(u32, u32) + Send + Sync;

/// State read by the drive thread and by accessors on any thread
pub(crate) struct ClockShared {
    running: AtomicBool,
    ticks: AtomicU64,
    frequency: AtomicU32,
    update_rate: RateGauge,
    render_rate: RateGauge,
    drive_thread: Mutex<Option<ThreadId>>,
}

impl ClockShared {
    fn new(hz: u32) -> Self {
        Self {
            running: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            frequency: AtomicU32::new(hz),
            update_rate: RateGauge::new(),
            render_rate: RateGauge::new(),
            drive_thread: Mutex::new(None),
        }
    }

    #[inline]
    fn period(&self) -> Duration {
        crate::period_for(self.frequency.load(Ordering::Acquire))
    }

    fn on_drive_thread(&self) -> bool {
        *self.drive_thread.lock() == Some(thread::current().id())
    }
}

/// Clears the running flag when the drive thread exits, including by panic
struct RunningGuard<'a>(&'a ClockShared);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        *self.0.drive_thread.lock() = None;
    }
}

/// Drive loop ownership: parked here while stopped, moved onto the drive
/// thread while running and handed back by `join`
#[derive(Default)]
struct Control {
    idle: Option<DriveLoop>,
    handle: Option<JoinHandle<DriveLoop>>,
}

pub struct Clock {
    shared: Arc<ClockShared>,
    time: Arc<dyn TimeSource>,
    max_catch_up: u32,
    thread_name: String,
    control: Mutex<Control>,
    listeners: Mutex<Vec<(ListenerId, Arc<FrequencyListener>)>>,
    next_listener: AtomicU64,
}

impl Clock {
    /// Unconfigured clock with default settings on wall-clock time
    pub fn new() -> Self {
        Self::build(Settings::default(), Arc::new(SystemTime::new()))
    }

    /// Clock using `settings` for frequency and catch-up cap, reading time
    /// from `time`
    pub fn with_settings(settings: Settings, time: Arc<dyn TimeSource>) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings, time))
    }

    fn build(settings: Settings, time: Arc<dyn TimeSource>) -> Self {
        Self {
            shared: Arc::new(ClockShared::new(settings.target_frequency_hz)),
            time,
            max_catch_up: settings.max_catch_up_updates,
            thread_name: settings.drive_thread_name,
            control: Mutex::new(Control::default()),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Install the update and render actions and the target frequency
    ///
    /// Replaces any previous configuration. Fails with `InvalidArgument` for a
    /// zero frequency and `IllegalState` while the clock is running. Setting
    /// the initial frequency does not notify listeners. A panic from the
    /// previous drive thread that no `stop` reported is logged and discarded.
    pub fn configure<U, R>(&self, update: U, render: R, hz: u32) -> Result<()>
    where
        U: FnMut() + Send + 'static,
        R: FnMut() + Send + 'static,
    {
        check_frequency(hz)?;
        if self.shared.on_drive_thread() {
            return Err(Error::IllegalState(
                "cannot configure the clock from its own drive thread",
            ));
        }

        let mut control = self.control.lock();
        if self.shared.running.load(Ordering::Acquire) {
            return Err(Error::IllegalState("cannot configure a running clock"));
        }
        if let Err(err) = self.reap(&mut control) {
            log::warn!("Replacing failed drive loop: {}", err);
        }

        self.shared.frequency.store(hz, Ordering::Release);
        control.idle = Some(DriveLoop::new(
            Box::new(update) as Action,
            Box::new(render) as Action,
            Arc::clone(&self.shared),
            Arc::clone(&self.time),
            self.max_catch_up,
        ));

        log::info!("Clock configured at {} Hz", hz);
        Ok(())
    }

    /// Launch the drive thread; no-op when already running
    ///
    /// Resets the tick counter to 0 on a Stopped -> Running transition.
    pub fn start(&self) -> Result<()> {
        if self.shared.on_drive_thread() {
            return Err(Error::IllegalState(
                "cannot start the clock from its own drive thread",
            ));
        }

        let mut control = self.control.lock();
        if self.shared.running.load(Ordering::Acquire) {
            return Ok(());
        }
        // A drive thread that stopped itself is still waiting to be joined
        self.reap(&mut control)?;

        let mut drive = control
            .idle
            .take()
            .ok_or(Error::IllegalState("clock is not configured"))?;
        drive.reset();

        self.shared.ticks.store(0, Ordering::Release);
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                *shared.drive_thread.lock() = Some(thread::current().id());
                let _guard = RunningGuard(&shared);
                log::info!("Drive thread started");
                let drive = drive.run();
                log::info!("Drive thread stopped");
                drive
            });

        match spawned {
            Ok(handle) => {
                control.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                // The drive loop went down with the closure
                self.shared.running.store(false, Ordering::Release);
                log::error!("Failed to spawn drive thread: {}", err);
                Err(err.into())
            }
        }
    }

    /// Stop the drive thread and wait for it to exit; no-op when stopped
    ///
    /// From inside an update/render action this only requests the stop: the
    /// current tick finishes and the thread exits without being joined.
    pub fn stop(&self) -> Result<()> {
        if self.shared.on_drive_thread() {
            if self.shared.running.swap(false, Ordering::AcqRel) {
                log::info!("Stop requested from drive thread");
            }
            return Ok(());
        }

        let mut control = self.control.lock();
        self.shared.running.store(false, Ordering::Release);
        self.reap(&mut control)
    }

    /// Join a finished or finishing drive thread and park its loop
    fn reap(&self, control: &mut Control) -> Result<()> {
        let Some(handle) = control.handle.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(drive) => {
                control.idle = Some(drive);
                Ok(())
            }
            Err(_) => {
                log::error!("Drive thread panicked; clock needs reconfiguring");
                Err(Error::DrivePanicked)
            }
        }
    }

    /// Change the target frequency without restarting the loop
    ///
    /// The drive thread picks up the new period at the top of its next tick.
    /// Listeners run synchronously on this thread, only if the value changed.
    pub fn set_frequency(&self, hz: u32) -> Result<()> {
        check_frequency(hz)?;

        let old = self.shared.frequency.swap(hz, Ordering::AcqRel);
        if old != hz {
            log::debug!("Clock frequency {} -> {} Hz", old, hz);
            // Snapshot so listeners may (un)register without deadlocking
            let listeners: Vec<_> = self
                .listeners
                .lock()
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            for listener in listeners {
                listener(old, hz);
            }
        }
        Ok(())
    }

    /// Register a callback receiving `(old_hz, new_hz)`; it must not block
    pub fn on_frequency_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not registered
    pub fn remove_frequency_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Updates completed since the last start (catch-up updates included)
    #[inline]
    pub fn current_ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    #[inline]
    pub fn target_frequency(&self) -> u32 {
        self.shared.frequency.load(Ordering::Acquire)
    }

    /// Current tick period
    pub fn period(&self) -> Duration {
        self.shared.period()
    }

    /// Updates per second over the last full measurement window
    pub fn measured_update_rate(&self) -> u32 {
        self.shared.update_rate.get()
    }

    /// Renders per second over the last full measurement window
    pub fn measured_render_rate(&self) -> u32 {
        self.shared.render_rate.get()
    }

    pub fn max_catch_up_updates(&self) -> u32 {
        self.max_catch_up
    }

    /// `round(seconds * target_frequency)`
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        crate::seconds_to_ticks(seconds, self.target_frequency())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("Clock dropped with error: {}", err);
        }
    }
}

fn check_frequency(hz: u32) -> Result<()> {
    if hz == 0 {
        return Err(Error::InvalidArgument("frequency must be positive".into()));
    }
    Ok(())
}
