//! Observable state shared between the processing paths and their consumers.
//!
//! Every processing step applies its updates to [`MonitorState`] under one
//! write lock, then notifies subscribers in the same order. Readers either
//! poll [`StateHub::snapshot`] or subscribe to a stream of [`StateUpdate`]s.

use crate::core::{ChartPoint, FeatureVector, SleepReport};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};

/// Everything the agent publishes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorState {
    pub current_heart_rate: Option<f64>,
    pub current_vector_magnitude: Option<f64>,
    pub features: Option<FeatureVector>,
    pub report: Option<SleepReport>,
    pub chart: Vec<ChartPoint>,
    pub analyzing: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single change to [`MonitorState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Reading {
        heart_rate: f64,
        vector_magnitude: f64,
    },
    Features(FeatureVector),
    AnalysisStarted,
    AnalysisCompleted {
        report: SleepReport,
        chart: Vec<ChartPoint>,
    },
    /// A batch run ended without producing results.
    AnalysisAborted,
}

impl MonitorState {
    fn apply(&mut self, update: &StateUpdate) {
        match update {
            StateUpdate::Reading {
                heart_rate,
                vector_magnitude,
            } => {
                self.current_heart_rate = Some(*heart_rate);
                self.current_vector_magnitude = Some(*vector_magnitude);
            }
            StateUpdate::Features(features) => self.features = Some(*features),
            StateUpdate::AnalysisStarted => self.analyzing = true,
            StateUpdate::AnalysisCompleted { report, chart } => {
                self.report = Some(report.clone());
                self.chart = chart.clone();
                self.analyzing = false;
            }
            StateUpdate::AnalysisAborted => self.analyzing = false,
        }
    }
}

/// Thread-safe state container with subscribe/notify.
#[derive(Debug, Default)]
pub struct StateHub {
    state: RwLock<MonitorState>,
    subscribers: Mutex<Vec<Sender<StateUpdate>>>,
}

/// Thread-safe shared state hub.
pub type SharedStateHub = Arc<StateHub>;

impl StateHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new shared state hub.
    pub fn shared() -> SharedStateHub {
        Arc::new(Self::new())
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MonitorState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Receive every update published from now on.
    pub fn subscribe(&self) -> Receiver<StateUpdate> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Apply `updates` atomically, then notify subscribers in order.
    pub fn publish(&self, updates: Vec<StateUpdate>) {
        if updates.is_empty() {
            return;
        }

        {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for update in &updates {
                state.apply(update);
            }
            state.updated_at = Some(Utc::now());
        }

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop subscribers whose receiver is gone.
        subscribers.retain(|tx| updates.iter().all(|u| tx.send(u.clone()).is_ok()));
    }

    pub fn is_analyzing(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .analyzing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FEATURE_COUNT;

    #[test]
    fn test_publish_updates_state() {
        let hub = StateHub::new();
        hub.publish(vec![
            StateUpdate::Reading {
                heart_rate: 58.0,
                vector_magnitude: 1.0,
            },
            StateUpdate::Features(FeatureVector::from_values([2.0; FEATURE_COUNT])),
        ]);

        let state = hub.snapshot();
        assert_eq!(state.current_heart_rate, Some(58.0));
        assert_eq!(state.current_vector_magnitude, Some(1.0));
        assert_eq!(state.features.unwrap()[3], 2.0);
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let hub = StateHub::new();
        let rx = hub.subscribe();

        hub.publish(vec![StateUpdate::AnalysisStarted]);
        assert!(hub.is_analyzing());
        hub.publish(vec![StateUpdate::AnalysisCompleted {
            report: SleepReport::empty(),
            chart: Vec::new(),
        }]);
        assert!(!hub.is_analyzing());

        assert_eq!(rx.try_recv().unwrap(), StateUpdate::AnalysisStarted);
        assert!(matches!(
            rx.try_recv().unwrap(),
            StateUpdate::AnalysisCompleted { .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let hub = StateHub::new();
        let rx = hub.subscribe();
        let _kept = hub.subscribe();
        drop(rx);

        hub.publish(vec![StateUpdate::AnalysisAborted]);
        assert_eq!(hub.subscriber_count(), 1);
    }
}
