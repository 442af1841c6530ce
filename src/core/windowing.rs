//! Trailing windows over sample sequences.
//!
//! Two flavours exist:
//! - [`LiveBuffer`] keeps wall-clock windows over a rolling retention horizon.
//! - [`BatchWindows`] walks a complete recording with sample-count windows at a
//!   fixed stride.

use crate::collector::types::SensorSample;
use crate::core::features::FeatureVector;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Wall-clock window sizes for the live feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveWindows {
    pub short: Duration,
    pub mid: Duration,
    /// Retention horizon; also the "full" window
    pub retention: Duration,
}

impl Default for LiveWindows {
    fn default() -> Self {
        Self {
            short: Duration::seconds(60),
            mid: Duration::minutes(5),
            retention: Duration::minutes(15),
        }
    }
}

/// Rolling buffer of recent samples, ordered by timestamp.
#[derive(Debug, Clone)]
pub struct LiveBuffer {
    windows: LiveWindows,
    samples: VecDeque<SensorSample>,
}

impl LiveBuffer {
    pub fn new(windows: LiveWindows) -> Self {
        Self {
            windows,
            samples: VecDeque::new(),
        }
    }

    /// Append a sample. Samples are expected in timestamp order.
    pub fn push(&mut self, sample: SensorSample) {
        self.samples.push_back(sample);
    }

    /// Drop every sample older than the retention horizon before `now`.
    /// Returns the number of samples evicted.
    pub fn evict(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.windows.retention;
        let before = self.samples.len();
        self.samples.retain(|s| s.timestamp >= cutoff);
        before - self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &SensorSample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples with `timestamp >= now - span`, oldest first.
    pub fn trailing(&self, span: Duration, now: DateTime<Utc>) -> Vec<SensorSample> {
        let cutoff = now - span;
        self.samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect()
    }

    /// Feature vector over the short, mid and full windows ending at `now`.
    ///
    /// Returns `None` when the buffer is empty.
    pub fn features(&self, now: DateTime<Utc>) -> Option<FeatureVector> {
        if self.samples.is_empty() {
            return None;
        }

        let full: Vec<SensorSample> = self.samples.iter().copied().collect();
        let short = self.trailing(self.windows.short, now);
        let mid = self.trailing(self.windows.mid, now);

        Some(FeatureVector::from_windows(&short, &mid, &full))
    }
}

impl Default for LiveBuffer {
    fn default() -> Self {
        Self::new(LiveWindows::default())
    }
}

/// Sample-count window layout for batch extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLayout {
    /// Samples looked back from the window's last index. The window holds
    /// `window + 1` samples.
    pub window: usize,
    /// Distance between successive window end indices
    pub stride: usize,
    /// Size of the short trailing sub-window
    pub short: usize,
    /// Size of the mid trailing sub-window
    pub mid: usize,
}

impl Default for BatchLayout {
    fn default() -> Self {
        Self {
            window: 900,
            stride: 60,
            short: 60,
            mid: 300,
        }
    }
}

/// One evaluated batch window.
#[derive(Debug, Clone, Copy)]
pub struct BatchWindow<'a> {
    /// Index of the window's last sample in the recording
    pub end_index: usize,
    /// Samples `[end_index - window, end_index]`
    pub samples: &'a [SensorSample],
}

impl<'a> BatchWindow<'a> {
    /// Timestamp of the window's last sample.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.samples[self.samples.len() - 1].timestamp
    }

    fn tail(&self, n: usize) -> &'a [SensorSample] {
        &self.samples[self.samples.len().saturating_sub(n)..]
    }

    pub fn features(&self, layout: &BatchLayout) -> FeatureVector {
        FeatureVector::from_windows(self.tail(layout.short), self.tail(layout.mid), self.samples)
    }
}

/// Iterator over strided windows of a recording.
///
/// The first window ends at index `layout.window`, so recordings with
/// `layout.window` samples or fewer yield nothing.
pub struct BatchWindows<'a> {
    samples: &'a [SensorSample],
    layout: BatchLayout,
    next_end: usize,
}

impl<'a> BatchWindows<'a> {
    pub fn new(samples: &'a [SensorSample], layout: BatchLayout) -> Self {
        Self {
            samples,
            layout,
            next_end: layout.window,
        }
    }

    /// Number of windows a recording of `len` samples produces.
    pub fn count_for(len: usize, layout: &BatchLayout) -> usize {
        if len <= layout.window || layout.stride == 0 {
            return 0;
        }
        (len - 1 - layout.window) / layout.stride + 1
    }
}

impl<'a> Iterator for BatchWindows<'a> {
    type Item = BatchWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.layout.stride == 0 || self.next_end >= self.samples.len() {
            return None;
        }
        let end = self.next_end;
        self.next_end += self.layout.stride;
        Some(BatchWindow {
            end_index: end,
            samples: &self.samples[end - self.layout.window..=end],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(t: DateTime<Utc>, hr: f64) -> SensorSample {
        SensorSample::new(t, hr, 1.0)
    }

    fn recording(len: usize) -> Vec<SensorSample> {
        let start = Utc::now();
        (0..len)
            .map(|i| sample_at(start + Duration::seconds(i as i64), i as f64))
            .collect()
    }

    #[test]
    fn test_eviction_horizon() {
        let mut buffer = LiveBuffer::default();
        let start = Utc::now();

        for i in 0..30 {
            let now = start + Duration::minutes(i);
            buffer.push(sample_at(now, 60.0));
            buffer.evict(now);

            let cutoff = now - Duration::minutes(15);
            assert!(buffer.samples().all(|s| s.timestamp >= cutoff));
        }
        // Minutes 14..=29 remain (a sample exactly at the cutoff is kept).
        assert_eq!(buffer.len(), 16);
    }

    #[test]
    fn test_live_features_windows() {
        let mut buffer = LiveBuffer::default();
        let now = Utc::now();

        buffer.push(sample_at(now - Duration::minutes(10), 50.0));
        buffer.push(sample_at(now - Duration::minutes(2), 60.0));
        buffer.push(sample_at(now - Duration::seconds(30), 70.0));

        let v = buffer.features(now).unwrap();
        assert_eq!(v.len(), 11);
        assert_eq!(v[0], 70.0);
        assert!((v[2] - 65.0).abs() < 1e-9);
        assert!((v[4] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_buffer_has_no_features() {
        let buffer = LiveBuffer::default();
        assert!(buffer.features(Utc::now()).is_none());
    }

    #[test]
    fn test_batch_windows_need_more_than_window() {
        let layout = BatchLayout::default();
        assert_eq!(BatchWindows::new(&recording(900), layout).count(), 0);
        assert_eq!(BatchWindows::count_for(900, &layout), 0);

        let rec = recording(901);
        let windows: Vec<_> = BatchWindows::new(&rec, layout).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end_index, 900);
        assert_eq!(windows[0].samples.len(), 901);
        assert_eq!(windows[0].samples[0].heart_rate, 0.0);
    }

    #[test]
    fn test_batch_window_stride_and_tails() {
        let layout = BatchLayout::default();
        let rec = recording(1021);
        let windows: Vec<_> = BatchWindows::new(&rec, layout).collect();

        let ends: Vec<_> = windows.iter().map(|w| w.end_index).collect();
        assert_eq!(ends, vec![900, 960, 1020]);
        assert_eq!(windows.len(), BatchWindows::count_for(rec.len(), &layout));

        let last = windows[2];
        assert_eq!(last.samples[0].heart_rate, 120.0);
        assert_eq!(last.timestamp(), rec[1020].timestamp);

        let v = last.features(&layout);
        // last 60 samples are 961..=1020
        assert!((v[0] - 990.5).abs() < 1e-9);
        // last 300 samples are 721..=1020
        assert!((v[2] - 870.5).abs() < 1e-9);
        // full window is 120..=1020
        assert!((v[4] - 570.0).abs() < 1e-9);
        assert_eq!(v[6], 1.0);
        assert_eq!(v[7], 0.0);
    }
}
