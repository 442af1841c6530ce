//! The 11-slot feature vector handed to the sleep/wake classifier.
//!
//! Layout (short, mid and full are the three trailing windows):
//!
//! | slot | value            |
//! |------|------------------|
//! | 0    | mean(HR, short)  |
//! | 1    | sd(HR, short)    |
//! | 2    | mean(HR, mid)    |
//! | 3    | sd(HR, mid)      |
//! | 4    | mean(HR, full)   |
//! | 5    | sd(HR, full)     |
//! | 6    | mean(VM, short)  |
//! | 7    | sd(VM, short)    |
//! | 8    | mean(VM, mid)    |
//! | 9    | mean(VM, full)   |
//! | 10   | sd(VM, full)     |
//!
//! There is no sd(VM, mid) slot. The classifier was trained on exactly this
//! shape, so the layout must not change without retraining it.

use crate::collector::types::SensorSample;
use crate::core::stats::{mean, std_dev};
use serde::{Deserialize, Serialize};

/// Number of slots in a feature vector.
pub const FEATURE_COUNT: usize = 11;

/// Fixed-length classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Slot names, in order.
    pub const NAMES: [&'static str; FEATURE_COUNT] = [
        "hr_mean_short",
        "hr_sd_short",
        "hr_mean_mid",
        "hr_sd_mid",
        "hr_mean_full",
        "hr_sd_full",
        "vm_mean_short",
        "vm_sd_short",
        "vm_mean_mid",
        "vm_mean_full",
        "vm_sd_full",
    ];

    pub const HR_MEAN_FULL: usize = 4;
    pub const VM_MEAN_FULL: usize = 9;

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Build a vector from three trailing windows, shortest first.
    ///
    /// Each window is expected to be a suffix of the next one, but nothing
    /// here depends on it.
    pub fn from_windows(
        short: &[SensorSample],
        mid: &[SensorSample],
        full: &[SensorSample],
    ) -> Self {
        let (hr_short, vm_short) = split_channels(short);
        let (hr_mid, vm_mid) = split_channels(mid);
        let (hr_full, vm_full) = split_channels(full);

        Self([
            mean(&hr_short),
            std_dev(&hr_short),
            mean(&hr_mid),
            std_dev(&hr_mid),
            mean(&hr_full),
            std_dev(&hr_full),
            mean(&vm_short),
            std_dev(&vm_short),
            mean(&vm_mid),
            mean(&vm_full),
            std_dev(&vm_full),
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Pair each slot with its name.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Self::NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

fn split_channels(samples: &[SensorSample]) -> (Vec<f64>, Vec<f64>) {
    samples
        .iter()
        .map(|s| (s.heart_rate, s.vector_magnitude))
        .unzip()
}
