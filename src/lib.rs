//! Synheart Sleep Agent - sleep/wake features and overnight sleep analysis.
//!
//! This library turns a heart rate + motion time series into:
//!
//! - a live, rolling 11-slot feature vector for a sleep/wake classifier, and
//! - a retrospective analysis of a full recording that finds the best sleep
//!   session, summarises it and produces a smoothed heart rate chart.
//!
//! The classifier itself, the sample transport and any rendering live
//! outside this crate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Synheart Sleep Agent                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  live:   Collector ──▶ LiveMonitor ──▶ FeatureVector ──┐         │
//! │                        (15 min buffer)                 │         │
//! │                                                        ▼         │
//! │  batch:  Recording ──▶ Parser ──▶ Windows ──▶ Classifier         │
//! │                                                 │                │
//! │                                                 ▼                │
//! │                          Segmenter ──▶ Report + Chart            │
//! │                                              │                   │
//! │                                              ▼                   │
//! │                                          StateHub ──▶ subscribers│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synheart_sleep_agent::core::{FeatureVector, LiveWindows};
//! use synheart_sleep_agent::monitor::{BatchAnalyzer, BatchSettings, LiveMonitor, StateHub};
//!
//! let hub = StateHub::shared();
//!
//! // Live path
//! let mut live = LiveMonitor::new(LiveWindows::default(), hub.clone());
//! let features = live.add(58.0, 0.01, 0.02, 0.98);
//!
//! // Batch path
//! let classifier = |f: &FeatureVector| f[4] < 65.0;
//! let analyzer = BatchAnalyzer::new(BatchSettings::default(), hub.clone());
//! let recording = std::fs::read_to_string("night.csv").unwrap();
//! let outcome = analyzer.analyze(&recording, &classifier).unwrap();
//! println!("{} - {}", outcome.report.bed_time, outcome.report.wake_time);
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod monitor;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use collector::{CollectorConfig, CollectorError, RawReading, SampleCollector, SensorSample};
pub use config::{Config, ConfigError};
pub use core::{
    ChartPoint, Classification, FeatureVector, SessionSegmenter, SleepClassifier, SleepReport,
    SleepSession, ThresholdClassifier, WindowClassification,
};
pub use monitor::{
    AnalysisError, AnalysisOutcome, BatchAnalyzer, BatchSettings, LiveMonitor, MonitorState,
    StateHub, StateUpdate,
};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data handling declaration that can be displayed to users.
pub const DATA_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║           SYNHEART SLEEP AGENT - DATA HANDLING                   ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent estimates sleep from heart rate and motion.          ║
║                                                                  ║
║  ✓ WHAT WE USE:                                                  ║
║    • Heart rate                                                  ║
║    • Overall motion intensity (one magnitude per sample)         ║
║                                                                  ║
║  ✗ WHAT WE NEVER KEEP:                                           ║
║    • Raw acceleration axes                                       ║
║    • Live samples older than the retention window                ║
║    • Analysis state after the process exits                      ║
║                                                                  ║
║  All processing happens locally. Exported results are written    ║
║  only where you ask, with:                                       ║
║    synheart-sleep analyze <recording> --output <file>            ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_declaration_contents() {
        assert!(DATA_DECLARATION.contains("DATA HANDLING"));
        assert!(DATA_DECLARATION.contains("NEVER KEEP"));
        assert!(DATA_DECLARATION.contains("Raw acceleration axes"));
    }
}
