//! Channel-backed collector that transports push raw readings into.
//!
//! The collector owns the receiving end; a transport (BLE bridge, stdin
//! reader, test harness) gets a [`ReadingSender`] and pushes readings one at a
//! time. A single consumer drains the receiver, which keeps the live path on
//! one logical stream.

use crate::collector::types::RawReading;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Configuration for the collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum number of readings buffered between transport and consumer
    pub capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

/// Errors that can occur during collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,
    #[error("Collector is not running")]
    NotRunning,
    #[error("Collector buffer is full")]
    BufferFull,
    #[error("Collector has been dropped")]
    Disconnected,
}

/// Collects raw readings from a transport.
pub struct SampleCollector {
    config: CollectorConfig,
    sender: Sender<RawReading>,
    receiver: Receiver<RawReading>,
    running: Arc<AtomicBool>,
}

impl SampleCollector {
    /// Create a new, stopped collector.
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(config.capacity.max(1));
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start accepting readings.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        tracing::debug!(capacity = self.config.capacity, "collector started");
        Ok(())
    }

    /// Stop accepting readings. Readings already queued stay in the channel.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::debug!("collector stopped");
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle for a transport to push readings through.
    pub fn sender(&self) -> ReadingSender {
        ReadingSender {
            sender: self.sender.clone(),
            running: Arc::clone(&self.running),
        }
    }

    /// Get the receiver for raw readings.
    pub fn receiver(&self) -> &Receiver<RawReading> {
        &self.receiver
    }

    /// Try to receive a reading without blocking.
    pub fn try_recv(&self) -> Option<RawReading> {
        self.receiver.try_recv().ok()
    }

    /// Discard everything currently queued, returning how many were dropped.
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

/// Cloneable push handle given to transports.
#[derive(Clone)]
pub struct ReadingSender {
    sender: Sender<RawReading>,
    running: Arc<AtomicBool>,
}

impl ReadingSender {
    /// Push one reading. Never blocks.
    pub fn push(&self, reading: RawReading) -> Result<(), CollectorError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::NotRunning);
        }
        self.sender.try_send(reading).map_err(|e| match e {
            TrySendError::Full(_) => CollectorError::BufferFull,
            TrySendError::Disconnected(_) => CollectorError::Disconnected,
        })
    }

    /// Convenience wrapper taking the four raw values.
    pub fn push_values(
        &self,
        heart_rate: f64,
        accel_x: f64,
        accel_y: f64,
        accel_z: f64,
    ) -> Result<(), CollectorError> {
        self.push(RawReading::new(heart_rate, accel_x, accel_y, accel_z))
    }
}
