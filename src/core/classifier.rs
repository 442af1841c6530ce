//! Sleep/wake classifier boundary.
//!
//! The trained model lives outside this crate. Anything implementing
//! [`SleepClassifier`] can be plugged into the batch analyzer; closures of the
//! form `Fn(&FeatureVector) -> bool` qualify directly.

use crate::core::features::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Awake,
    Asleep,
}

impl Classification {
    /// Map a model label (0 = awake, 1 = asleep). Any non-zero label is
    /// treated as asleep.
    pub fn from_label(label: u8) -> Self {
        if label == 0 {
            Classification::Awake
        } else {
            Classification::Asleep
        }
    }

    pub fn label(self) -> u8 {
        match self {
            Classification::Awake => 0,
            Classification::Asleep => 1,
        }
    }

    pub fn is_asleep(self) -> bool {
        self == Classification::Asleep
    }
}

impl From<bool> for Classification {
    fn from(is_asleep: bool) -> Self {
        if is_asleep {
            Classification::Asleep
        } else {
            Classification::Awake
        }
    }
}

/// A stateless sleep/wake predictor.
///
/// Called once per batch window, possibly in a tight loop, so implementations
/// must not mutate shared state.
pub trait SleepClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Classification;
}

impl<F> SleepClassifier for F
where
    F: Fn(&FeatureVector) -> bool + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Classification {
        Classification::from(self(features))
    }
}

/// Classification of one batch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClassification {
    pub timestamp: DateTime<Utc>,
    pub is_asleep: bool,
}

impl WindowClassification {
    pub fn new(timestamp: DateTime<Utc>, classification: Classification) -> Self {
        Self {
            timestamp,
            is_asleep: classification.is_asleep(),
        }
    }
}

/// Heuristic stand-in for a trained model.
///
/// A window is asleep when both the full-window heart rate mean and the
/// full-window motion mean are at or below their thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdClassifier {
    pub max_heart_rate: f64,
    pub max_vector_magnitude: f64,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self {
            max_heart_rate: 65.0,
            max_vector_magnitude: 1.05,
        }
    }
}

impl SleepClassifier for ThresholdClassifier {
    fn predict(&self, features: &FeatureVector) -> Classification {
        let hr = features[FeatureVector::HR_MEAN_FULL];
        let vm = features[FeatureVector::VM_MEAN_FULL];
        Classification::from(hr <= self.max_heart_rate && vm <= self.max_vector_magnitude)
    }
}
