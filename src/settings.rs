//! Clock and input settings
//!
//! Loaded from JSON by the application shell; every field has a default so a
//! partial document is fine.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};

/// Scheduler and input configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Clock ===
    /// Target update frequency (ticks per second)
    pub target_frequency_hz: u32,
    /// Extra catch-up updates allowed per tick after an overrun
    pub max_catch_up_updates: u32,
    /// Name given to the drive thread
    pub drive_thread_name: String,

    // === Input ===
    /// Number of tracked keyboard key identifiers
    pub key_count: usize,
    /// Number of tracked mouse buttons
    pub button_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_frequency_hz: DEFAULT_FREQUENCY_HZ,
            max_catch_up_updates: DEFAULT_MAX_CATCH_UP,

            drive_thread_name: DRIVE_THREAD_NAME.to_string(),

            key_count: DEFAULT_KEY_COUNT,
            button_count: DEFAULT_BUTTON_COUNT,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document and validate them
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!(
            "Loaded settings: {} Hz, catch-up cap {}",
            settings.target_frequency_hz,
            settings.max_catch_up_updates
        );
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values no component can run with
    pub fn validate(&self) -> Result<()> {
        if self.target_frequency_hz == 0 {
            return Err(Error::InvalidArgument(
                "target_frequency_hz must be positive".into(),
            ));
        }
        if self.key_count == 0 {
            return Err(Error::InvalidArgument("key_count must be positive".into()));
        }
        if self.button_count == 0 {
            return Err(Error::InvalidArgument("button_count must be positive".into()));
        }
        Ok(())
    }

    /// Settings with a different target frequency
    pub fn with_frequency(mut self, hz: u32) -> Self {
        self.target_frequency_hz = hz;
        self
    }

    /// Settings with a different catch-up cap
    pub fn with_catch_up_cap(mut self, cap: u32) -> Self {
        self.max_catch_up_updates = cap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.target_frequency_hz, 60);
        assert_eq!(settings.max_catch_up_updates, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "target_frequency_hz": 120 }"#).unwrap();
        assert_eq!(settings.target_frequency_hz, 120);
        assert_eq!(settings.max_catch_up_updates, DEFAULT_MAX_CATCH_UP);
        assert_eq!(settings.key_count, DEFAULT_KEY_COUNT);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let err = Settings::from_json(r#"{ "target_frequency_hz": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_negative_frequency_is_a_parse_error() {
        let err = Settings::from_json(r#"{ "target_frequency_hz": -5 }"#).unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::default().with_frequency(30).with_catch_up_cap(5);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }
}
