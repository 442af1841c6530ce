//! Retrospective analysis of a complete recording.
//!
//! Pipeline: parse → strided feature windows → classifier per window →
//! best-session search → report and chart. Results are published to the
//! [`StateHub`](crate::monitor::state::StateHub) as one update.

use crate::collector::types::SensorSample;
use crate::config::Config;
use crate::core::{
    BatchLayout, BatchWindows, ChartPoint, FeatureVector, ParsedRecording, RecordingError,
    RecordingParser, ReportBuilder, SessionSegmenter, SleepClassifier, SleepReport,
    SleepSession, WindowClassification,
};
use crate::monitor::state::{SharedStateHub, StateUpdate};
use crate::transparency::SharedTransparencyLog;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors from a batch analysis call.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("An analysis is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error("Analysis worker failed: {0}")]
    Worker(String),
}

/// Settings for batch analysis.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub layout: BatchLayout,
    /// Seconds between successive classifications
    pub step_secs: u64,
    pub wake_tolerance_secs: u64,
    pub chart_margin: Duration,
    pub chart_chunk_size: usize,
    pub timezone: Tz,
    /// First calendar day of the recording; today when unset
    pub reference_date: Option<NaiveDate>,
    pub max_rows: Option<usize>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            layout: BatchLayout::default(),
            step_secs: 60,
            wake_tolerance_secs: 3600,
            chart_margin: Duration::minutes(30),
            chart_chunk_size: 300,
            timezone: Tz::UTC,
            reference_date: None,
            max_rows: None,
        }
    }
}

impl BatchSettings {
    /// Derive settings from the agent configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            layout: config.batch_layout(),
            step_secs: config.step_secs,
            wake_tolerance_secs: config.wake_tolerance_secs,
            chart_margin: Duration::seconds(config.chart_margin.as_secs() as i64),
            chart_chunk_size: config.chart_chunk_size,
            timezone: config.tz().unwrap_or(Tz::UTC),
            reference_date: None,
            max_rows: Some(config.max_recording_rows),
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn parser(&self) -> RecordingParser {
        let parser = match self.reference_date {
            Some(date) => RecordingParser::new(date, self.timezone),
            None => RecordingParser::today(self.timezone),
        };
        match self.max_rows {
            Some(max) => parser.with_max_rows(max),
            None => parser,
        }
    }
}

/// One evaluated window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub timestamp: DateTime<Utc>,
    pub features: FeatureVector,
    pub is_asleep: bool,
}

/// Everything a batch run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sample_count: usize,
    pub dropped_rows: usize,
    pub rollovers: usize,
    pub windows: Vec<WindowResult>,
    pub session: SleepSession,
    pub report: SleepReport,
    pub chart: Vec<ChartPoint>,
}

impl AnalysisOutcome {
    pub fn classifications(&self) -> Vec<WindowClassification> {
        self.windows
            .iter()
            .map(|w| WindowClassification {
                timestamp: w.timestamp,
                is_asleep: w.is_asleep,
            })
            .collect()
    }
}

/// Runs batch analyses, at most one at a time.
pub struct BatchAnalyzer {
    settings: BatchSettings,
    hub: SharedStateHub,
    log: Option<SharedTransparencyLog>,
    running: AtomicBool,
}

/// Resets the in-flight flag when a run ends, however it ends.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    hub: &'a SharedStateHub,
    completed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.hub.publish(vec![StateUpdate::AnalysisAborted]);
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl BatchAnalyzer {
    pub fn new(settings: BatchSettings, hub: SharedStateHub) -> Self {
        Self {
            settings,
            hub,
            log: None,
            running: AtomicBool::new(false),
        }
    }

    /// Record analysis statistics in a transparency log.
    pub fn with_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Analyze recording text.
    ///
    /// Returns [`AnalysisError::AlreadyRunning`] if another call on this
    /// analyzer has not finished yet.
    pub fn analyze(
        &self,
        text: &str,
        classifier: &dyn SleepClassifier,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let guard = self.begin()?;
        let parsed = self.settings.parser().parse(text);
        Ok(self.finish_parsed(guard, parsed, classifier))
    }

    /// Read a recording file and analyze it.
    pub fn analyze_file(
        &self,
        path: &Path,
        classifier: &dyn SleepClassifier,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let guard = self.begin()?;
        let parsed = self.settings.parser().load(path)?;
        Ok(self.finish_parsed(guard, parsed, classifier))
    }

    /// Analyze samples that are already parsed and ordered.
    pub fn analyze_samples(
        &self,
        samples: &[SensorSample],
        classifier: &dyn SleepClassifier,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let guard = self.begin()?;
        Ok(self.finish(guard, samples, 0, 0, classifier))
    }

    /// Run [`analyze`](Self::analyze) on the blocking thread pool.
    pub async fn analyze_async(
        self: Arc<Self>,
        text: String,
        classifier: Arc<dyn SleepClassifier>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        tokio::task::spawn_blocking(move || self.analyze(&text, classifier.as_ref()))
            .await
            .map_err(|e| AnalysisError::Worker(e.to_string()))?
    }

    fn begin(&self) -> Result<RunGuard<'_>, AnalysisError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("rejected analysis request: another analysis is in progress");
            return Err(AnalysisError::AlreadyRunning);
        }
        self.hub.publish(vec![StateUpdate::AnalysisStarted]);
        Ok(RunGuard {
            running: &self.running,
            hub: &self.hub,
            completed: false,
        })
    }

    fn finish_parsed(
        &self,
        guard: RunGuard<'_>,
        parsed: ParsedRecording,
        classifier: &dyn SleepClassifier,
    ) -> AnalysisOutcome {
        if let Some(ref log) = self.log {
            log.record_rows_dropped(parsed.dropped_rows as u64);
        }
        self.finish(
            guard,
            &parsed.samples,
            parsed.dropped_rows,
            parsed.rollovers,
            classifier,
        )
    }

    fn finish(
        &self,
        mut guard: RunGuard<'_>,
        samples: &[SensorSample],
        dropped_rows: usize,
        rollovers: usize,
        classifier: &dyn SleepClassifier,
    ) -> AnalysisOutcome {
        let started_at = Utc::now();
        let settings = &self.settings;

        let windows: Vec<WindowResult> = BatchWindows::new(samples, settings.layout)
            .map(|window| {
                let features = window.features(&settings.layout);
                WindowResult {
                    timestamp: window.timestamp(),
                    features,
                    is_asleep: classifier.predict(&features).is_asleep(),
                }
            })
            .collect();

        let classifications: Vec<WindowClassification> = windows
            .iter()
            .map(|w| WindowClassification {
                timestamp: w.timestamp,
                is_asleep: w.is_asleep,
            })
            .collect();

        let session = SessionSegmenter::new(settings.step_secs, settings.wake_tolerance_secs)
            .find_best(&classifications);

        let builder = ReportBuilder::new(settings.step_secs, settings.timezone)
            .with_chart_margin(settings.chart_margin)
            .with_chunk_size(settings.chart_chunk_size);
        let report = builder.build_report(&session, &classifications);
        let chart = builder.build_chart(samples, &report);

        tracing::info!(
            samples = samples.len(),
            windows = windows.len(),
            asleep = classifications.iter().filter(|c| c.is_asleep).count(),
            bed_time = %report.bed_time,
            wake_time = %report.wake_time,
            efficiency = %report.efficiency,
            "analysis complete"
        );

        if let Some(ref log) = self.log {
            log.record_windows_classified(windows.len() as u64);
            log.record_analysis_completed();
        }

        self.hub.publish(vec![StateUpdate::AnalysisCompleted {
            report: report.clone(),
            chart: chart.clone(),
        }]);
        guard.completed = true;
        drop(guard);

        AnalysisOutcome {
            id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            sample_count: samples.len(),
            dropped_rows,
            rollovers,
            windows,
            session,
            report,
            chart,
        }
    }
}
