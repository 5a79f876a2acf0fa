//! Error kinds surfaced by the clock, settings and detectors

use thiserror::Error;

/// Errors returned by fallible `tickwise` operations.
///
/// Timing overrun is never an error: it is absorbed by bounded catch-up and
/// only shows up as a measured update rate below target.
#[derive(Debug, Error)]
pub enum Error {
    /// A value outside its documented domain (zero frequency, zero key count)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not permitted in the current lifecycle state
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// The OS refused to create the drive thread
    #[error("failed to spawn drive thread")]
    Spawn(#[from] std::io::Error),

    /// An update or render callable panicked on the drive thread
    #[error("drive thread panicked")]
    DrivePanicked,

    /// Malformed settings document
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
