//! Controller configuration, loadable from RON.
//!
//! ```ron
//! (
//!     settle_debounce_ms: 350,
//!     event_capacity: 128,
//! )
//! ```
//!
//! Missing fields fall back to the defaults in [`crate::constants`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_SETTLE_DEBOUNCE};

/// Tunables for a [`TimeTravel`](crate::TimeTravel) controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelConfig {
    /// Debounce before a travel is reported as settled.
    #[serde(rename = "settle_debounce_ms", with = "duration_ms")]
    pub settle_debounce: Duration,
    /// Capacity of the travel event broadcast channel (minimum 1).
    pub event_capacity: usize,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            settle_debounce: DEFAULT_SETTLE_DEBOUNCE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl TravelConfig {
    pub fn with_settle_debounce(mut self, debounce: Duration) -> Self {
        self.settle_debounce = debounce;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Parse a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a config from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Broadcast channels panic on zero capacity.
    pub(crate) fn channel_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }
}

/// Errors loading a [`TravelConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TravelConfig::default();
        assert_eq!(config.settle_debounce, Duration::from_millis(200));
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = TravelConfig::from_ron_str("(settle_debounce_ms: 350)").unwrap();
        assert_eq!(config.settle_debounce, Duration::from_millis(350));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = TravelConfig::default()
            .with_settle_debounce(Duration::from_millis(50))
            .with_event_capacity(8);
        let text = ron::to_string(&config).unwrap();
        assert!(text.contains("settle_debounce_ms"));
        assert_eq!(TravelConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_ron_is_parse_error() {
        let err = TravelConfig::from_ron_str("(settle_debounce_ms: \"soon\")").unwrap_err();
        assert!(matches!(err, ConfigError::Ron(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(event_capacity: 3)").unwrap();

        let config = TravelConfig::load(file.path()).unwrap();
        assert_eq!(config.event_capacity, 3);
        assert_eq!(config.settle_debounce, DEFAULT_SETTLE_DEBOUNCE);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TravelConfig::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let config = TravelConfig::default().with_event_capacity(0);
        assert_eq!(config.channel_capacity(), 1);
    }
}
