//! Stream Module - Session Driver, History & Sinks
//!
//! ## Flow
//! - `driver` - paced loop over the readings (and the lazy sample sequence)
//! - `state` - append-only ErrorSample history + derived anomaly views
//! - `sink` - per-step consumers (log, dashboard snapshot, fan-out)
//! - `history` - JSONL recording and replay

pub mod driver;
pub mod state;
pub mod sink;
pub mod history;


pub use driver::{CancelFlag, CancelPolicy, DriverState, ErrorSampleStream, RunOutcome, SessionSummary, StreamDriver};
pub use history::{replay, JsonlHistorySink, ReplayedHistory};
pub use sink::{DashboardSnapshot, LogSink, SessionInfo, SinkSet, SnapshotSink, StepReport, StreamSink};
pub use state::{AnomalyRow, ErrorPoint, ErrorSample, SeverityCounts, StreamState};
