//! Stream Sinks - where per-step results go
//!
//! The driver calls `on_step` once per processed reading, after the sample is
//! appended and before the pacing pause. Sinks only get read-only views of
//! the stream state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::driver::SessionSummary;
use super::state::{round_to, AnomalyRow, ErrorPoint, ErrorSample, StreamState};
use crate::constants::ANOMALY_TABLE_DECIMALS;
use crate::logic::error::PipelineResult;
use crate::logic::features::FeatureLayout;
use crate::logic::model::{ModelMetadata, ThresholdConfig};

// ============================================================================
// REPORTS
// ============================================================================

/// Announced once when a session starts running
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub layout: FeatureLayout,
    pub total_readings: usize,
    pub thresholds: ThresholdConfig,
    pub model: Option<ModelMetadata>,
}

/// One step: the new sample plus the history it was appended to
pub struct StepReport<'a> {
    pub sample: &'a ErrorSample,
    pub state: &'a StreamState,
}

impl<'a> StepReport<'a> {
    pub fn new(sample: &'a ErrorSample, state: &'a StreamState) -> Self {
        Self { sample, state }
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &'a ErrorSample> + 'a {
        self.state.anomalies()
    }

    pub fn anomaly_table(&self) -> Vec<AnomalyRow> {
        self.state.anomaly_table()
    }

    /// `<timestamp> | Anomaly detected | Error: 0.0312`
    pub fn status_line(&self) -> String {
        let verdict = if self.sample.is_anomaly {
            "Anomaly detected"
        } else {
            "Normal operation"
        };
        format!(
            "{} | {} | Error: {:.4}",
            self.sample.timestamp, verdict, self.sample.error
        )
    }
}

// ============================================================================
// SINK TRAIT
// ============================================================================

pub trait StreamSink {
    fn on_start(&mut self, _info: &SessionInfo) -> PipelineResult<()> {
        Ok(())
    }

    fn on_step(&mut self, report: &StepReport<'_>) -> PipelineResult<()>;

    fn on_finish(&mut self, _state: &StreamState, _summary: &SessionSummary) -> PipelineResult<()> {
        Ok(())
    }
}

// ============================================================================
// LOG SINK
// ============================================================================

/// Status lines through `log`: flagged readings at warn, others at info
#[derive(Debug, Default)]
pub struct LogSink;

impl StreamSink for LogSink {
    fn on_start(&mut self, info: &SessionInfo) -> PipelineResult<()> {
        log::info!(
            "Session {} started: {} readings, {} features, threshold {}",
            info.session_id,
            info.total_readings,
            info.layout.len(),
            info.thresholds.binary_threshold
        );
        Ok(())
    }

    fn on_step(&mut self, report: &StepReport<'_>) -> PipelineResult<()> {
        if report.sample.is_anomaly {
            log::warn!("{} [{}]", report.status_line(), report.sample.severity);
        } else {
            log::info!("{} [{}]", report.status_line(), report.sample.severity);
        }
        Ok(())
    }

    fn on_finish(&mut self, state: &StreamState, summary: &SessionSummary) -> PipelineResult<()> {
        log::info!(
            "Session {} {}: {} processed, {} anomalies, avg inference {:.1} us",
            summary.session_id,
            if summary.cancelled { "cancelled" } else { "finished" },
            summary.processed,
            state.anomaly_count(),
            summary.avg_inference_us
        );
        Ok(())
    }
}

// ============================================================================
// SNAPSHOT SINK
// ============================================================================

/// What a dashboard needs to redraw: chart series, latest sample, table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub session_id: Option<Uuid>,
    pub total_readings: usize,
    pub latest: Option<ErrorSample>,
    pub series: Vec<ErrorPoint>,
    pub anomaly_table: Vec<AnomalyRow>,
    pub finished: bool,
}

/// Keeps a snapshot behind a lock that other threads can read
#[derive(Debug, Clone, Default)]
pub struct SnapshotSink {
    snapshot: Arc<RwLock<DashboardSnapshot>>,
}

impl SnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read handle for a dashboard thread
    pub fn handle(&self) -> Arc<RwLock<DashboardSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.read().clone()
    }
}

impl StreamSink for SnapshotSink {
    fn on_start(&mut self, info: &SessionInfo) -> PipelineResult<()> {
        *self.snapshot.write() = DashboardSnapshot {
            session_id: Some(info.session_id),
            total_readings: info.total_readings,
            ..Default::default()
        };
        Ok(())
    }

    fn on_step(&mut self, report: &StepReport<'_>) -> PipelineResult<()> {
        let sample = report.sample;
        let mut snap = self.snapshot.write();

        snap.series.push(ErrorPoint {
            index: sample.index,
            error: sample.error,
            is_anomaly: sample.is_anomaly,
        });
        if sample.is_anomaly {
            snap.anomaly_table.push(AnomalyRow {
                index: sample.index,
                timestamp: sample.timestamp,
                error: round_to(sample.error, ANOMALY_TABLE_DECIMALS),
            });
        }
        snap.latest = Some(sample.clone());
        Ok(())
    }

    fn on_finish(&mut self, _state: &StreamState, _summary: &SessionSummary) -> PipelineResult<()> {
        self.snapshot.write().finished = true;
        Ok(())
    }
}

// ============================================================================
// SINK SET
// ============================================================================

/// Fan-out to several sinks, in insertion order. Stops at the first error.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn StreamSink + Send>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl StreamSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn StreamSink + Send>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl StreamSink for SinkSet {
    fn on_start(&mut self, info: &SessionInfo) -> PipelineResult<()> {
        self.sinks.iter_mut().try_for_each(|s| s.on_start(info))
    }

    fn on_step(&mut self, report: &StepReport<'_>) -> PipelineResult<()> {
        self.sinks.iter_mut().try_for_each(|s| s.on_step(report))
    }

    fn on_finish(&mut self, state: &StreamState, summary: &SessionSummary) -> PipelineResult<()> {
        self.sinks.iter_mut().try_for_each(|s| s.on_finish(state, summary))
    }
}
