//! Core algorithms for the Synheart Sleep Agent.
//!
//! This module contains:
//! - Summary statistics shared by every feature path
//! - Feature vectors and the windows they are computed over
//! - Recording parsing with day-rollover reconstruction
//! - The classifier boundary
//! - Sleep session segmentation and reporting

pub mod classifier;
pub mod features;
pub mod parser;
pub mod report;
pub mod segmentation;
pub mod stats;
pub mod windowing;

// Re-export commonly used types
pub use classifier::{Classification, SleepClassifier, ThresholdClassifier, WindowClassification};
pub use features::{FeatureVector, FEATURE_COUNT};
pub use parser::{parse_recording, ParsedRecording, RecordingError, RecordingParser};
pub use report::{ChartPoint, ReportBuilder, SleepReport};
pub use segmentation::{SessionSegmenter, SleepSession};
pub use stats::{mean, std_dev};
pub use windowing::{BatchLayout, BatchWindows, LiveBuffer, LiveWindows};
