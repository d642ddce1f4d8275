//! Stream Driver - paced, single-consumer session loop
//!
//! States: `Idle -> Running -> (Idle | Finished)`.
//!
//! `start` loads the dataset, fits the scaler over all of it and clears the
//! stream state. `run` then walks the readings strictly in order:
//! scale, reconstruct, classify, append, notify the sink, pause. Exactly one
//! reading is in flight at a time. A cancel flag is checked between readings
//! and during the pause.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sink::{SessionInfo, StepReport, StreamSink};
use super::state::{ErrorSample, SeverityCounts, StreamState};
use crate::logic::config::MonitorConfig;
use crate::logic::dataset::{DatasetLoader, LoadReport, LoadedDataset, Reading};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureLayout, ScalerParams};
use crate::logic::model::{checked_reconstruct, AnomalyClassifier, ModelMetadata, ReconstructionModel};

/// Longest single sleep while pacing, so a cancel is noticed quickly
const PAUSE_SLICE: Duration = Duration::from_millis(50);

// ============================================================================
// STATE & CONTROL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Idle,
    Running,
    Finished,
}

/// What happens to the stream state when a run stops early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CancelPolicy {
    #[default]
    Keep,
    Discard,
}

/// Cooperative cancellation, shared with whoever may stop the session
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub processed: usize,
    pub anomalies: usize,
    pub severity_counts: SeverityCounts,
    pub avg_inference_us: f64,
    pub elapsed_ms: u64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Finished(SessionSummary),
    Cancelled(SessionSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> &SessionSummary {
        match self {
            RunOutcome::Finished(s) | RunOutcome::Cancelled(s) => s,
        }
    }
}

// ============================================================================
// LAZY SAMPLE SEQUENCE
// ============================================================================

/// One `ErrorSample` per reading, computed on demand, no pacing, no state.
/// Stops for good after the first error.
pub struct ErrorSampleStream<'a, M: ?Sized> {
    readings: std::slice::Iter<'a, Reading>,
    scaler: &'a ScalerParams,
    model: &'a M,
    classifier: AnomalyClassifier,
    next_index: usize,
    failed: bool,
    inference_us: u64,
}

impl<'a, M: ReconstructionModel + ?Sized> ErrorSampleStream<'a, M> {
    pub fn new(
        readings: &'a [Reading],
        scaler: &'a ScalerParams,
        model: &'a M,
        classifier: AnomalyClassifier,
    ) -> Self {
        Self {
            readings: readings.iter(),
            scaler,
            model,
            classifier,
            next_index: 0,
            failed: false,
            inference_us: 0,
        }
    }

    /// Readings not yet processed
    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.readings.len()
        }
    }

    /// Total time spent inside the model so far
    pub fn inference_us(&self) -> u64 {
        self.inference_us
    }

    fn process(&mut self, reading: &Reading) -> PipelineResult<ErrorSample> {
        let scaled = self.scaler.transform(reading)?;

        let start = Instant::now();
        let reconstructed = checked_reconstruct(self.model, &scaled.features)?;
        self.inference_us += start.elapsed().as_micros() as u64;

        let label = self.classifier.classify(&scaled.features, &reconstructed)?;

        Ok(ErrorSample {
            index: self.next_index,
            timestamp: scaled.timestamp,
            error: label.error,
            is_anomaly: label.is_anomaly,
            severity: label.severity,
        })
    }
}

impl<'a, M: ReconstructionModel + ?Sized> Iterator for ErrorSampleStream<'a, M> {
    type Item = PipelineResult<ErrorSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let reading = self.readings.next()?;

        let result = self.process(reading);
        match &result {
            Ok(_) => self.next_index += 1,
            Err(_) => self.failed = true,
        }
        Some(result)
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Everything fitted at session start; frozen while running
struct Session {
    id: Uuid,
    readings: Vec<Reading>,
    layout: FeatureLayout,
    scaler: ScalerParams,
    report: LoadReport,
}

pub struct StreamDriver<M> {
    config: MonitorConfig,
    model: M,
    model_metadata: Option<ModelMetadata>,
    phase: DriverState,
    session: Option<Session>,
    stream_state: StreamState,
}

impl<M: ReconstructionModel> StreamDriver<M> {
    pub fn new(config: MonitorConfig, model: M) -> Self {
        Self {
            config,
            model,
            model_metadata: None,
            phase: DriverState::Idle,
            session: None,
            stream_state: StreamState::new(),
        }
    }

    /// Model details to announce in the session header
    pub fn with_model_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.model_metadata = Some(metadata);
        self
    }

    pub fn state(&self) -> DriverState {
        self.phase
    }

    pub fn stream_state(&self) -> &StreamState {
        &self.stream_state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn layout(&self) -> Option<&FeatureLayout> {
        self.session.as_ref().map(|s| &s.layout)
    }

    pub fn load_report(&self) -> Option<LoadReport> {
        self.session.as_ref().map(|s| s.report)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn scaler(&self) -> Option<&ScalerParams> {
        self.session.as_ref().map(|s| &s.scaler)
    }

    /// Load the configured dataset and start a new session
    pub fn start(&mut self) -> PipelineResult<LoadReport> {
        let loader = DatasetLoader::new(self.config.loader.clone());
        let dataset = loader.load_path(&self.config.data_path)?;
        self.start_with(dataset)
    }

    /// Start a new session over an already loaded dataset.
    /// Any previous history is discarded.
    pub fn start_with(&mut self, dataset: LoadedDataset) -> PipelineResult<LoadReport> {
        let LoadedDataset { readings, layout, report } = dataset;

        if let Some(arity) = self.model.expected_arity() {
            if arity != layout.len() {
                return Err(PipelineError::ArityMismatch {
                    expected: arity,
                    got: layout.len(),
                });
            }
        }

        let scaler = ScalerParams::fit(&readings, layout.len());
        let id = Uuid::new_v4();

        if readings.is_empty() {
            log::warn!("Session {}: no valid readings after filtering", id);
        }
        log::info!(
            "Session {} ready: {} readings, {} features, scaler fit over full dataset",
            id,
            readings.len(),
            layout.len()
        );

        self.stream_state.reset();
        self.session = Some(Session { id, readings, layout, scaler, report });
        self.phase = DriverState::Running;

        Ok(report)
    }

    /// Unpaced, stateless view of the session as a lazy sequence
    pub fn samples(&self) -> PipelineResult<ErrorSampleStream<'_, M>> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| PipelineError::InvalidState("no session started".to_string()))?;

        Ok(ErrorSampleStream::new(
            &session.readings,
            &session.scaler,
            &self.model,
            AnomalyClassifier::new(self.config.thresholds),
        ))
    }

    /// Process every remaining reading, paced, until done or cancelled.
    /// Any model or sink error halts the session.
    pub fn run(&mut self, sink: &mut dyn StreamSink, cancel: &CancelFlag) -> PipelineResult<RunOutcome> {
        if self.phase != DriverState::Running {
            return Err(PipelineError::InvalidState(format!(
                "run requires a started session (state: {:?})",
                self.phase
            )));
        }

        match self.run_session(sink, cancel) {
            Ok(summary) if summary.cancelled => {
                log::info!("Session {} cancelled after {} readings", summary.session_id, summary.processed);
                self.stop_early();
                Ok(RunOutcome::Cancelled(summary))
            }
            Ok(summary) => {
                self.phase = DriverState::Finished;
                Ok(RunOutcome::Finished(summary))
            }
            Err(e) => {
                log::error!("Session halted: {}", e);
                self.stop_early();
                Err(e)
            }
        }
    }

    /// Discard history and fitted scaler; back to `Idle`
    pub fn reset(&mut self) {
        self.stream_state.reset();
        self.session = None;
        self.phase = DriverState::Idle;
    }

    fn run_session(&mut self, sink: &mut dyn StreamSink, cancel: &CancelFlag) -> PipelineResult<SessionSummary> {
        let Self { config, model, model_metadata, session, stream_state, .. } = self;
        let session = session
            .as_ref()
            .ok_or_else(|| PipelineError::InvalidState("no session started".to_string()))?;

        let started = Instant::now();
        let info = SessionInfo {
            session_id: session.id,
            started_at: Utc::now(),
            layout: session.layout.clone(),
            total_readings: session.readings.len(),
            thresholds: config.thresholds,
            model: model_metadata.clone(),
        };
        sink.on_start(&info)?;

        let mut stream = ErrorSampleStream::new(
            &session.readings,
            &session.scaler,
            &*model,
            AnomalyClassifier::new(config.thresholds),
        );
        let mut cancelled = false;

        loop {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let sample = match stream.next() {
                Some(item) => item?,
                None => break,
            };

            stream_state.append(sample)?;
            let view: &StreamState = stream_state;
            if let Some(appended) = view.last() {
                sink.on_step(&StepReport::new(appended, view))?;
            }

            if stream.remaining() > 0 {
                pause(config.pacing_interval, cancel);
            }
        }

        let processed = stream_state.len();
        let summary = SessionSummary {
            session_id: session.id,
            processed,
            anomalies: stream_state.anomaly_count(),
            severity_counts: stream_state.severity_counts(),
            avg_inference_us: if processed > 0 {
                stream.inference_us() as f64 / processed as f64
            } else {
                0.0
            },
            elapsed_ms: started.elapsed().as_millis() as u64,
            cancelled,
        };

        sink.on_finish(stream_state, &summary)?;
        Ok(summary)
    }

    fn stop_early(&mut self) {
        if self.config.cancel_policy == CancelPolicy::Discard {
            self.stream_state.reset();
        }
        self.session = None;
        self.phase = DriverState::Idle;
    }
}

/// Sleep for `interval`, returning early once cancelled
fn pause(interval: Duration, cancel: &CancelFlag) {
    let deadline = Instant::now() + interval;
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(PAUSE_SLICE));
    }
}
