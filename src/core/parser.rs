//! Best-effort parser for recorded sessions.
//!
//! A recording is a header line followed by rows of
//! `HH:MM:SS,heartRate,accelX,accelY,accelZ`. Rows carry no date, so absolute
//! timestamps are rebuilt from a reference day that advances by 24 hours
//! whenever the time of day goes backwards.
//!
//! A single row that is slightly earlier than its predecessor (clock jitter)
//! looks exactly like a midnight rollover and will push every later row a
//! day forward. There is no way to tell the two apart from time of day alone.

use crate::collector::types::{vector_magnitude, SensorSample};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::path::Path;
use thiserror::Error;

/// Errors loading a recording from disk. Malformed rows are not errors.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Failed to read recording {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of parsing a recording.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecording {
    /// Samples in input order, which is also chronological order
    pub samples: Vec<SensorSample>,
    /// Data rows that failed to parse and were dropped
    pub dropped_rows: usize,
    /// Number of midnight rollovers applied
    pub rollovers: usize,
    /// Rows ignored because the row cap was reached
    pub truncated_rows: usize,
}

/// Parser settings.
#[derive(Debug, Clone, Copy)]
pub struct RecordingParser {
    /// Midnight of the first day, as an instant
    day_start: DateTime<Utc>,
    /// Upper bound on data rows considered
    max_rows: Option<usize>,
}

impl RecordingParser {
    /// Start the reference day at local midnight of `date` in `tz`.
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        Self {
            day_start: local_midnight(date, tz),
            max_rows: None,
        }
    }

    /// Start the reference day at today's midnight in `tz`.
    pub fn today(tz: Tz) -> Self {
        let today = Utc::now().with_timezone(&tz).date_naive();
        Self::new(today, tz)
    }

    /// Start the reference day at an explicit instant.
    pub fn from_day_start(day_start: DateTime<Utc>) -> Self {
        Self {
            day_start,
            max_rows: None,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn day_start(&self) -> DateTime<Utc> {
        self.day_start
    }

    /// Parse recording text. Never fails; unusable rows are dropped.
    pub fn parse(&self, text: &str) -> ParsedRecording {
        let mut result = ParsedRecording::default();
        let mut reference_day = self.day_start;
        let mut last_offset = Duration::seconds(-1);

        let mut rows = text.lines().skip(1).filter(|l| !l.trim().is_empty());
        let mut seen = 0usize;

        for line in rows.by_ref() {
            if self.max_rows.is_some_and(|max| seen >= max) {
                result.truncated_rows = 1;
                break;
            }
            seen += 1;

            let Some(row) = parse_row(line) else {
                result.dropped_rows += 1;
                continue;
            };

            if row.offset < last_offset {
                reference_day += Duration::hours(24);
                result.rollovers += 1;
            }
            last_offset = row.offset;

            result.samples.push(SensorSample::new(
                reference_day + row.offset,
                row.heart_rate,
                vector_magnitude(row.accel_x, row.accel_y, row.accel_z),
            ));
        }
        result.truncated_rows += rows.count();

        if result.dropped_rows > 0 {
            tracing::debug!(
                dropped = result.dropped_rows,
                kept = result.samples.len(),
                "dropped malformed recording rows"
            );
        }
        if result.truncated_rows > 0 {
            tracing::warn!(
                ignored = result.truncated_rows,
                "recording exceeded row cap; trailing rows ignored"
            );
        }

        result
    }

    /// Read and parse a recording file.
    pub fn load(&self, path: &Path) -> Result<ParsedRecording, RecordingError> {
        let text = std::fs::read_to_string(path).map_err(|source| RecordingError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(self.parse(&text))
    }
}

struct Row {
    offset: Duration,
    heart_rate: f64,
    accel_x: f64,
    accel_y: f64,
    accel_z: f64,
}

fn parse_row(line: &str) -> Option<Row> {
    let mut fields = line.split(',').map(str::trim);

    let time = NaiveTime::parse_from_str(fields.next()?, "%H:%M:%S%.f").ok()?;
    let heart_rate = fields.next()?.parse().ok()?;
    let accel_x = fields.next()?.parse().ok()?;
    let accel_y = fields.next()?.parse().ok()?;
    let accel_z = fields.next()?.parse().ok()?;

    Some(Row {
        offset: time.signed_duration_since(NaiveTime::MIN),
        heart_rate,
        accel_x,
        accel_y,
        accel_z,
    })
}

/// Midnight of `date` in `tz`, as a UTC instant.
///
/// Where midnight does not exist locally (a DST jump at 00:00) the UTC
/// midnight of the same date is used.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Parse a recording with the reference day at today's midnight in `tz`.
pub fn parse_recording(text: &str, tz: Tz) -> Vec<SensorSample> {
    RecordingParser::today(tz).parse(text).samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> RecordingParser {
        RecordingParser::new(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), Tz::UTC)
    }

    #[test]
    fn test_header_skipped_and_magnitude_computed() {
        let text = "time,hr,x,y,z\n08:00:00,60,3,4,0\n";
        let parsed = parser().parse(text);

        assert_eq!(parsed.samples.len(), 1);
        let s = parsed.samples[0];
        assert_eq!(s.heart_rate, 60.0);
        assert_eq!(s.vector_magnitude, 5.0);
        assert_eq!(
            s.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_day_rollover() {
        let text = "time,hr,x,y,z\n\
                    23:58:00,60,0,0,1\n\
                    23:59:30,61,0,0,1\n\
                    00:00:45,62,0,0,1\n\
                    00:02:00,63,0,0,1\n";
        let parsed = parser().parse(text);

        assert_eq!(parsed.rollovers, 1);
        let ts: Vec<_> = parsed.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts.len(), 4);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ts[1], Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 30).unwrap());
        assert_eq!(ts[2], Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 45).unwrap());
        assert_eq!(ts[3], Utc.with_ymd_and_hms(2024, 3, 11, 0, 2, 0).unwrap());
    }

    #[test]
    fn test_malformed_rows_dropped() {
        let text = "time,hr,x,y,z\n\
                    01:00:00,60,0,0,1\n\
                    garbage\n\
                    01:00:01,abc,0,0,1\n\
                    25:00:00,60,0,0,1\n\
                    01:00:02,61,0,0\n\
                    01:00:03,62,0,0,1\n";
        let parsed = parser().parse(text);

        assert_eq!(parsed.samples.len(), 2);
        assert_eq!(parsed.dropped_rows, 4);
        assert_eq!(parsed.rollovers, 0);
    }

    #[test]
    fn test_jitter_is_treated_as_rollover() {
        let text = "time,hr,x,y,z\n\
                    02:00:05,60,0,0,1\n\
                    02:00:04,60,0,0,1\n";
        let parsed = parser().parse(text);

        assert_eq!(parsed.rollovers, 1);
        let gap = parsed.samples[1].timestamp - parsed.samples[0].timestamp;
        assert_eq!(gap, Duration::hours(24) - Duration::seconds(1));
    }

    #[test]
    fn test_header_only_and_empty() {
        assert!(parser().parse("").samples.is_empty());
        assert!(parser().parse("time,hr,x,y,z\n").samples.is_empty());
    }

    #[test]
    fn test_row_cap() {
        let text = "time,hr,x,y,z\n\
                    01:00:00,60,0,0,1\n\
                    01:00:01,60,0,0,1\n\
                    01:00:02,60,0,0,1\n";
        let parsed = parser().with_max_rows(2).parse(text);

        assert_eq!(parsed.samples.len(), 2);
        assert_eq!(parsed.truncated_rows, 1);
    }

    #[test]
    fn test_local_midnight_in_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let midnight = local_midnight(date, chrono_tz::America::New_York);
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap());
    }
}
