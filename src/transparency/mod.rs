//! Transparency module for the Synheart Sleep Agent.
//!
//! Tracks and exposes how much data the agent has processed, so users can
//! see what happens to their recordings.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, PersistedStats, SharedTransparencyLog,
    TransparencyLog, TransparencyStats,
};
