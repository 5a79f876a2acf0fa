//! Tickwise - a fixed-rate simulation driver
//!
//! Core modules:
//! - `clock`: Drive thread scheduler (update/render at a target rate, bounded catch-up)
//! - `sim`: Per-tick edge detection (input keys, collision pairs) and the tick driver
//! - `platform`: Host seams (time source, raw input source)
//! - `settings`: Serializable configuration

pub mod clock;
pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use clock::{Clock, ListenerId, RateGauge, RateMeter};
pub use error::{Error, Result};
pub use settings::Settings;

use std::time::Duration;

/// Scheduler and input constants
pub mod consts {
    use std::time::Duration;

    /// Default target update frequency
    pub const DEFAULT_FREQUENCY_HZ: u32 = 60;
    /// Extra updates allowed per tick after an overrun, to prevent spiral of death
    pub const DEFAULT_MAX_CATCH_UP: u32 = 3;
    /// Length of a rate measurement window
    pub const RATE_WINDOW: Duration = Duration::from_secs(1);
    pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

    pub const DRIVE_THREAD_NAME: &str = "tickwise-drive";

    /// Tracked keyboard key identifiers (0..DEFAULT_KEY_COUNT)
    pub const DEFAULT_KEY_COUNT: usize = 256;
    /// Tracked mouse buttons
    pub const DEFAULT_BUTTON_COUNT: usize = 8;
}

/// Tick period for a frequency (`hz` must be positive)
#[inline]
pub fn period_for(hz: u32) -> Duration {
    debug_assert!(hz > 0, "frequency must be positive");
    Duration::from_nanos(consts::NANOS_PER_SECOND / u64::from(hz.max(1)))
}

/// Number of ticks covering `seconds` at `hz`, rounded to nearest
///
/// Negative or NaN inputs yield 0.
#[inline]
pub fn seconds_to_ticks(seconds: f64, hz: u32) -> u64 {
    (seconds * f64::from(hz)).round() as u64
}
