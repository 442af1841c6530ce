//! Live ingestion: one sample in, current reading and feature vector out.

use crate::collector::types::{RawReading, SensorSample};
use crate::core::{FeatureVector, LiveBuffer, LiveWindows};
use crate::monitor::state::{SharedStateHub, StateUpdate};
use chrono::{DateTime, Utc};

/// Rolling live processor.
///
/// `add` takes `&mut self`, so a monitor can only ever be fed from one place
/// at a time; each sample is appended, stale samples are evicted and the
/// feature vector recomputed before the call returns.
pub struct LiveMonitor {
    buffer: LiveBuffer,
    hub: SharedStateHub,
    samples_seen: u64,
}

impl LiveMonitor {
    pub fn new(windows: LiveWindows, hub: SharedStateHub) -> Self {
        Self {
            buffer: LiveBuffer::new(windows),
            hub,
            samples_seen: 0,
        }
    }

    /// Ingest a reading stamped with the current time.
    pub fn add(
        &mut self,
        heart_rate: f64,
        accel_x: f64,
        accel_y: f64,
        accel_z: f64,
    ) -> Option<FeatureVector> {
        let reading = RawReading::new(heart_rate, accel_x, accel_y, accel_z);
        self.add_at(&reading, Utc::now())
    }

    /// Ingest a reading stamped with `now`.
    ///
    /// Publishes the instantaneous reading and, when the buffer is non-empty
    /// after eviction, the recomputed feature vector, which is also returned.
    pub fn add_at(&mut self, reading: &RawReading, now: DateTime<Utc>) -> Option<FeatureVector> {
        let sample = SensorSample::from_reading(reading, now);
        let mut updates = vec![StateUpdate::Reading {
            heart_rate: sample.heart_rate,
            vector_magnitude: sample.vector_magnitude,
        }];

        self.buffer.push(sample);
        self.samples_seen += 1;
        let evicted = self.buffer.evict(now);
        if evicted > 0 {
            tracing::trace!(evicted, retained = self.buffer.len(), "evicted stale samples");
        }

        let features = self.buffer.features(now);
        if let Some(features) = features {
            updates.push(StateUpdate::Features(features));
        }

        self.hub.publish(updates);
        features
    }

    /// Number of samples currently retained.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total samples ingested since creation.
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn buffer(&self) -> &LiveBuffer {
        &self.buffer
    }

    /// Forget all retained samples.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
