//! Configuration for the Synheart Sleep Agent.

use crate::core::{BatchLayout, LiveWindows, ThresholdClassifier};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the sleep agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Short live window
    #[serde(with = "duration_serde")]
    pub live_short_window: Duration,

    /// Mid live window
    #[serde(with = "duration_serde")]
    pub live_mid_window: Duration,

    /// How long live samples are retained; also the full live window
    #[serde(with = "duration_serde")]
    pub live_retention: Duration,

    /// Batch window look-back, in samples
    pub batch_window_samples: usize,

    /// Distance between batch windows, in samples
    pub batch_stride_samples: usize,

    /// Short batch sub-window, in samples
    pub batch_short_samples: usize,

    /// Mid batch sub-window, in samples
    pub batch_mid_samples: usize,

    /// Seconds represented by one batch classification
    pub step_secs: u64,

    /// Longest wake gap tolerated inside a sleep session (in seconds)
    pub wake_tolerance_secs: u64,

    /// Padding around the session when building the chart
    #[serde(with = "duration_serde")]
    pub chart_margin: Duration,

    /// Samples per chart point
    pub chart_chunk_size: usize,

    /// IANA time zone used for midnight reconstruction and display
    pub timezone: String,

    /// Data rows read from a recording before the rest is ignored
    pub max_recording_rows: usize,

    /// Readings buffered between transport and live processing
    pub collector_capacity: usize,

    /// Thresholds for the built-in classifier
    pub classifier: ThresholdClassifier,

    /// Path for exporting analysis results
    pub export_path: PathBuf,

    /// Path for storing state and transparency logs
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-sleep-agent");

        Self {
            live_short_window: Duration::from_secs(60),
            live_mid_window: Duration::from_secs(5 * 60),
            live_retention: Duration::from_secs(15 * 60),
            batch_window_samples: 900,
            batch_stride_samples: 60,
            batch_short_samples: 60,
            batch_mid_samples: 300,
            step_secs: 60,
            wake_tolerance_secs: 3600, // 1 hour
            chart_margin: Duration::from_secs(30 * 60),
            chart_chunk_size: 300,
            timezone: "UTC".to_string(),
            max_recording_rows: 2_000_000,
            collector_capacity: 10_000,
            classifier: ThresholdClassifier::default(),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-sleep-agent")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Check that window sizes and the time zone make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_window_samples == 0 || self.batch_stride_samples == 0 {
            return Err(ConfigError::Invalid(
                "batch window and stride must be positive".to_string(),
            ));
        }
        if self.batch_short_samples > self.batch_window_samples + 1
            || self.batch_mid_samples > self.batch_window_samples + 1
        {
            return Err(ConfigError::Invalid(
                "batch sub-windows cannot exceed the batch window".to_string(),
            ));
        }
        if self.step_secs == 0 {
            return Err(ConfigError::Invalid("step_secs must be positive".to_string()));
        }
        if self.chart_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chart_chunk_size must be positive".to_string(),
            ));
        }
        if self.live_short_window > self.live_retention || self.live_mid_window > self.live_retention
        {
            return Err(ConfigError::Invalid(
                "live windows cannot exceed the retention horizon".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed time zone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn live_windows(&self) -> LiveWindows {
        LiveWindows {
            short: to_chrono(self.live_short_window),
            mid: to_chrono(self.live_mid_window),
            retention: to_chrono(self.live_retention),
        }
    }

    pub fn batch_layout(&self) -> BatchLayout {
        BatchLayout {
            window: self.batch_window_samples,
            stride: self.batch_stride_samples,
            short: self.batch_short_samples,
            mid: self.batch_mid_samples,
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::seconds(duration.as_secs() as i64)
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.live_retention, Duration::from_secs(900));
        assert_eq!(config.batch_layout(), BatchLayout::default());
        assert_eq!(config.live_windows(), LiveWindows::default());
        assert_eq!(config.step_secs, 60);
        assert_eq!(config.tz().unwrap(), Tz::UTC);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.timezone = "Europe/Berlin".to_string();
        config.wake_tolerance_secs = 1800;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.timezone, "Europe/Berlin");
        assert_eq!(loaded.wake_tolerance_secs, 1800);
        assert_eq!(loaded.chart_margin, Duration::from_secs(1800));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.batch_window_samples, 900);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"step_secs": 30, "live_retention": 1200}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.step_secs, 30);
        assert_eq!(config.live_retention, Duration::from_secs(1200));
        assert_eq!(config.batch_stride_samples, 60);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownTimezone(_))
        ));

        let mut config = Config::default();
        config.batch_mid_samples = 5000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.batch_stride_samples = 0;
        assert!(config.validate().is_err());
    }
}
