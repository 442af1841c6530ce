//! Sample collection for the Synheart Sleep Agent.
//!
//! The transport itself (Bluetooth, serial, a file replay) lives outside this
//! crate. This module provides the sample types and the channel a transport
//! pushes into.

pub mod channel;
pub mod types;

// Re-export commonly used types
pub use channel::{CollectorConfig, CollectorError, ReadingSender, SampleCollector};
pub use types::{vector_magnitude, RawReading, SensorSample};
