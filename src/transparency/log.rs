//! Processing transparency log.
//!
//! Counts what the agent has processed without keeping any of the
//! physiological data itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Number of live samples ingested
    samples_ingested: AtomicU64,
    /// Number of recording rows dropped as malformed
    rows_dropped: AtomicU64,
    /// Number of batch windows classified
    windows_classified: AtomicU64,
    /// Number of batch analyses completed
    analyses_completed: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            samples_ingested: AtomicU64::new(0),
            rows_dropped: AtomicU64::new(0),
            windows_classified: AtomicU64::new(0),
            analyses_completed: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {e}");
        }

        log
    }

    /// Record a live sample.
    pub fn record_sample(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record dropped recording rows.
    pub fn record_rows_dropped(&self, count: u64) {
        self.rows_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record classified batch windows.
    pub fn record_windows_classified(&self, count: u64) {
        self.windows_classified.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a completed analysis.
    pub fn record_analysis_completed(&self) {
        self.analyses_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            rows_dropped: self.rows_dropped.load(Ordering::Relaxed),
            windows_classified: self.windows_classified.load(Ordering::Relaxed),
            analyses_completed: self.analyses_completed.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Live samples ingested: {}\n\
             - Recording rows dropped: {}\n\
             - Windows classified: {}\n\
             - Analyses completed: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Data Handling:\n\
             - Raw acceleration axes are reduced to a magnitude on arrival\n\
             - Live samples older than the retention window are discarded\n\
             - Analysis state is kept in memory only",
            stats.samples_ingested,
            stats.rows_dropped,
            stats.windows_classified,
            stats.analyses_completed,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_ingested: stats.samples_ingested,
                rows_dropped: stats.rows_dropped,
                windows_classified: stats.windows_classified,
                analyses_completed: stats.analyses_completed,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_ingested
                    .store(persisted.samples_ingested, Ordering::Relaxed);
                self.rows_dropped
                    .store(persisted.rows_dropped, Ordering::Relaxed);
                self.windows_classified
                    .store(persisted.windows_classified, Ordering::Relaxed);
                self.analyses_completed
                    .store(persisted.analyses_completed, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.samples_ingested.store(0, Ordering::Relaxed);
        self.rows_dropped.store(0, Ordering::Relaxed);
        self.windows_classified.store(0, Ordering::Relaxed);
        self.analyses_completed.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub samples_ingested: u64,
    pub rows_dropped: u64,
    pub windows_classified: u64,
    pub analyses_completed: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedStats {
    pub samples_ingested: u64,
    pub rows_dropped: u64,
    pub windows_classified: u64,
    pub analyses_completed: u64,
    pub last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_sample();
        log.record_sample();
        log.record_rows_dropped(3);
        log.record_windows_classified(40);
        log.record_analysis_completed();

        let stats = log.stats();
        assert_eq!(stats.samples_ingested, 2);
        assert_eq!(stats.rows_dropped, 3);
        assert_eq!(stats.windows_classified, 40);
        assert_eq!(stats.analyses_completed, 1);
    }

    #[test]
    fn test_transparency_log_reset() {
        let log = TransparencyLog::new();

        log.record_rows_dropped(100);
        log.record_windows_classified(50);
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.rows_dropped, 0);
        assert_eq!(stats.windows_classified, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transparency.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_sample();
        log.record_analysis_completed();
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path);
        let stats = reloaded.stats();
        assert_eq!(stats.samples_ingested, 1);
        assert_eq!(stats.analyses_completed, 1);
    }

    #[test]
    fn test_summary_format() {
        let summary = TransparencyLog::new().summary();

        assert!(summary.contains("Live samples ingested"));
        assert!(summary.contains("Analyses completed"));
        assert!(summary.contains("Data Handling"));
    }
}
