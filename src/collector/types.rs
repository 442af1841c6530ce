//! Sample types shared by the live and batch paths.
//!
//! Motion is reduced to a single vector magnitude at ingestion; the raw axes
//! are never kept past that point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw reading as delivered by a transport, before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// Heart rate in beats per minute
    pub heart_rate: f64,
    /// Acceleration along the X axis
    pub accel_x: f64,
    /// Acceleration along the Y axis
    pub accel_y: f64,
    /// Acceleration along the Z axis
    pub accel_z: f64,
}

impl RawReading {
    pub fn new(heart_rate: f64, accel_x: f64, accel_y: f64, accel_z: f64) -> Self {
        Self {
            heart_rate,
            accel_x,
            accel_y,
            accel_z,
        }
    }

    /// Euclidean norm of the three acceleration axes.
    pub fn vector_magnitude(&self) -> f64 {
        vector_magnitude(self.accel_x, self.accel_y, self.accel_z)
    }

    /// Parse a `hr,ax,ay,az` line. Returns `None` if any field is missing or
    /// not a number.
    pub fn parse_csv(line: &str) -> Option<Self> {
        let mut fields = line.split(',').map(str::trim);
        let heart_rate = fields.next()?.parse().ok()?;
        let accel_x = fields.next()?.parse().ok()?;
        let accel_y = fields.next()?.parse().ok()?;
        let accel_z = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(heart_rate, accel_x, accel_y, accel_z))
    }
}

/// Compute `sqrt(ax² + ay² + az²)`.
pub fn vector_magnitude(accel_x: f64, accel_y: f64, accel_z: f64) -> f64 {
    (accel_x * accel_x + accel_y * accel_y + accel_z * accel_z).sqrt()
}

/// A timestamped physiological sample.
///
/// Immutable once created. `vector_magnitude` is derived exactly once, in
/// [`SensorSample::from_reading`] or by the batch parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub heart_rate: f64,
    pub vector_magnitude: f64,
}

impl SensorSample {
    pub fn new(timestamp: DateTime<Utc>, heart_rate: f64, vector_magnitude: f64) -> Self {
        Self {
            timestamp,
            heart_rate,
            vector_magnitude,
        }
    }

    /// Stamp a raw reading with the given instant.
    pub fn from_reading(reading: &RawReading, timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, reading.heart_rate, reading.vector_magnitude())
    }
}
