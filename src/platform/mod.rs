//! Platform abstraction layer
//!
//! The seams where the core meets the host:
//! - Time (monotonic reads and sleeping)
//! - Raw input sampling

pub mod input;
pub mod time;

pub use input::{InputSnapshot, InputSource};
pub use time::{ManualTime, SystemTime, TimeSource};
