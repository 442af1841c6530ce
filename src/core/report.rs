//! Human-facing sleep summary and the downsampled heart rate chart.

use crate::collector::types::SensorSample;
use crate::core::classifier::WindowClassification;
use crate::core::segmentation::SleepSession;
use crate::core::stats::mean;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Shown in place of a time of day when no session was found.
pub const TIME_PLACEHOLDER: &str = "--:--";

/// Shown in place of duration and efficiency when no session was found.
pub const VALUE_PLACEHOLDER: &str = "--";

/// Summary of the best sleep session in a recording.
///
/// Formatted strings are for display; `session_start` and `session_end` keep
/// the raw instants so the chart can be filtered independently of formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReport {
    /// Bed time as `HH:MM`
    pub bed_time: String,
    /// Wake time as `HH:MM`
    pub wake_time: String,
    /// Time in bed as `Xh Ym`
    pub sleep_duration: String,
    /// Efficiency as a percentage string, e.g. `87.5%`
    pub efficiency: String,
    /// Raw efficiency percentage
    pub efficiency_pct: f64,
    pub seconds_in_bed: u64,
    pub sleep_seconds: u64,
    pub session_start: Option<DateTime<Utc>>,
    pub session_end: Option<DateTime<Utc>>,
}

impl SleepReport {
    /// Placeholder report for a recording with no sleep session.
    pub fn empty() -> Self {
        Self {
            bed_time: TIME_PLACEHOLDER.to_string(),
            wake_time: TIME_PLACEHOLDER.to_string(),
            sleep_duration: VALUE_PLACEHOLDER.to_string(),
            efficiency: VALUE_PLACEHOLDER.to_string(),
            efficiency_pct: 0.0,
            seconds_in_bed: 0,
            sleep_seconds: 0,
            session_start: None,
            session_end: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session_start.is_some()
    }
}

/// One point of the display series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// Builds reports and chart series for a given step size and time zone.
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder {
    step_secs: u64,
    tz: Tz,
    chart_margin: Duration,
    chunk_size: usize,
}

impl ReportBuilder {
    pub fn new(step_secs: u64, tz: Tz) -> Self {
        Self {
            step_secs,
            tz,
            chart_margin: Duration::minutes(30),
            chunk_size: 300,
        }
    }

    pub fn with_chart_margin(mut self, margin: Duration) -> Self {
        self.chart_margin = margin;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Summarise `session`. Returns the placeholder report when the session
    /// is the "none" sentinel or its indices fall outside `classifications`.
    pub fn build_report(
        &self,
        session: &SleepSession,
        classifications: &[WindowClassification],
    ) -> SleepReport {
        if !session.is_found() {
            return SleepReport::empty();
        }
        let (Some(start), Some(end)) = (
            classifications.get(session.start_index),
            classifications.get(session.end_index),
        ) else {
            tracing::warn!(?session, "session indices out of range");
            return SleepReport::empty();
        };

        let seconds_in_bed = session.span() as u64 * self.step_secs;
        let sleep_seconds = session.sleep_count as u64 * self.step_secs;
        let efficiency_pct = efficiency(sleep_seconds, seconds_in_bed);

        SleepReport {
            bed_time: self.format_time(start.timestamp),
            wake_time: self.format_time(end.timestamp),
            sleep_duration: format_duration(seconds_in_bed),
            efficiency: format!("{efficiency_pct:.1}%"),
            efficiency_pct,
            seconds_in_bed,
            sleep_seconds,
            session_start: Some(start.timestamp),
            session_end: Some(end.timestamp),
        }
    }

    /// Heart rate chart around the session in `report`.
    ///
    /// Samples within `chart_margin` of the session are kept and cut into
    /// positional chunks of `chunk_size`; each chunk becomes one point at its
    /// middle sample's timestamp carrying the chunk's mean heart rate.
    pub fn build_chart(&self, samples: &[SensorSample], report: &SleepReport) -> Vec<ChartPoint> {
        let (Some(start), Some(end)) = (report.session_start, report.session_end) else {
            return Vec::new();
        };
        build_chart(
            samples,
            start - self.chart_margin,
            end + self.chart_margin,
            self.chunk_size,
        )
    }

    fn format_time(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format("%H:%M").to_string()
    }
}

/// `sleep / in_bed * 100`, or 0 when nothing was spent in bed.
pub fn efficiency(sleep_seconds: u64, seconds_in_bed: u64) -> f64 {
    if seconds_in_bed == 0 {
        return 0.0;
    }
    sleep_seconds as f64 / seconds_in_bed as f64 * 100.0
}

/// Whole hours and minutes, e.g. `7h 45m`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Chunked heart rate means over the samples inside `[from, to]`.
pub fn build_chart(
    samples: &[SensorSample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    chunk_size: usize,
) -> Vec<ChartPoint> {
    let filtered: Vec<&SensorSample> = samples
        .iter()
        .filter(|s| s.timestamp >= from && s.timestamp <= to)
        .collect();

    filtered
        .chunks(chunk_size.max(1))
        .map(|chunk| {
            let heart_rates: Vec<f64> = chunk.iter().map(|s| s.heart_rate).collect();
            ChartPoint {
                date: chunk[chunk.len() / 2].timestamp,
                value: mean(&heart_rates),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn windows(start: DateTime<Utc>, n: usize) -> Vec<WindowClassification> {
        (0..n)
            .map(|i| WindowClassification {
                timestamp: start + Duration::minutes(i as i64),
                is_asleep: true,
            })
            .collect()
    }

    #[test]
    fn test_efficiency_scenario() {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap();
        let classifications = windows(start, 481);
        let session = SleepSession {
            start_index: 0,
            end_index: 480,
            sleep_count: 420,
        };

        let report = ReportBuilder::new(60, Tz::UTC).build_report(&session, &classifications);

        assert_eq!(report.seconds_in_bed, 28_800);
        assert_eq!(report.sleep_seconds, 25_200);
        assert_eq!(report.efficiency_pct, 87.5);
        assert_eq!(report.efficiency, "87.5%");
        assert_eq!(report.sleep_duration, "8h 0m");
        assert_eq!(report.bed_time, "23:00");
        assert_eq!(report.wake_time, "07:00");
        assert_eq!(report.session_start, Some(start));
        assert_eq!(report.session_end, Some(start + Duration::hours(8)));
    }

    #[test]
    fn test_report_in_time_zone() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 4, 30, 0).unwrap();
        let classifications = windows(start, 10);
        let session = SleepSession {
            start_index: 0,
            end_index: 9,
            sleep_count: 9,
        };

        let report = ReportBuilder::new(60, chrono_tz::America::New_York)
            .build_report(&session, &classifications);
        assert_eq!(report.bed_time, "23:30");
        assert_eq!(report.wake_time, "23:39");
    }

    #[test]
    fn test_no_session_placeholders() {
        let report = ReportBuilder::new(60, Tz::UTC).build_report(&SleepSession::NONE, &[]);

        assert_eq!(report.bed_time, "--:--");
        assert_eq!(report.wake_time, "--:--");
        assert!(!report.has_session());
        assert_eq!(report.efficiency_pct, 0.0);
        assert!(ReportBuilder::new(60, Tz::UTC)
            .build_chart(&[], &report)
            .is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(27_900), "7h 45m");
        assert_eq!(format_duration(59), "0h 0m");
    }

    #[test]
    fn test_efficiency_zero_in_bed() {
        assert_eq!(efficiency(120, 0), 0.0);
    }

    #[test]
    fn test_chart_points_within_margin() {
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 22, 0, 0).unwrap();
        let samples: Vec<SensorSample> = (0..4 * 3600)
            .map(|i| SensorSample::new(base + Duration::seconds(i), 60.0 + (i % 10) as f64, 1.0))
            .collect();

        let t0 = base + Duration::hours(1);
        let t1 = base + Duration::hours(2);
        let report = SleepReport {
            session_start: Some(t0),
            session_end: Some(t1),
            ..SleepReport::empty()
        };

        let chart = ReportBuilder::new(60, Tz::UTC).build_chart(&samples, &report);

        // 2h + 1s of samples in range -> 7201 samples -> 25 chunks
        assert_eq!(chart.len(), 25);
        let lo = t0 - Duration::minutes(30);
        let hi = t1 + Duration::minutes(30);
        assert!(chart.iter().all(|p| p.date >= lo && p.date <= hi));
        assert!(chart.windows(2).all(|w| w[0].date < w[1].date));

        assert_eq!(chart[0].date, lo + Duration::seconds(150));
        assert!((chart[0].value - 64.5).abs() < 1e-9);
        // Last chunk holds a single sample.
        assert_eq!(chart[24].date, hi);
    }
}
