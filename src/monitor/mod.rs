//! Live and batch processing paths and the state they publish.
//!
//! The two paths never share a buffer: [`LiveMonitor`] owns the rolling
//! window, [`BatchAnalyzer`] works on a whole recording. Both publish into
//! the same [`StateHub`].

pub mod batch;
pub mod live;
pub mod state;

pub use batch::{AnalysisError, AnalysisOutcome, BatchAnalyzer, BatchSettings, WindowResult};
pub use live::LiveMonitor;
pub use state::{MonitorState, SharedStateHub, StateHub, StateUpdate};
