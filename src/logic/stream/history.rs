//! Classification History - JSONL, append-only, replayable
//!
//! One file per session: a header line (session, layout, model), one line per
//! ErrorSample in index order, and a footer line when the session ends.
//! Every line is flushed as it is written so an interrupted session can still
//! be replayed up to its last sample.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::driver::SessionSummary;
use super::sink::{SessionInfo, StepReport, StreamSink};
use super::state::{ErrorSample, StreamState};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureLayout;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryRecord {
    Header(SessionInfo),
    Sample(ErrorSample),
    Footer(SessionSummary),
}

/// Default history directory
pub fn get_history_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("steam-monitor")
        .join("history")
}

// ============================================================================
// WRITER
// ============================================================================

enum Target {
    /// File name picked when the session starts
    Directory(PathBuf),
    File(PathBuf),
}

pub struct JsonlHistorySink {
    target: Target,
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl JsonlHistorySink {
    /// Write `history-<timestamp>-<session>.jsonl` under `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Directory(dir.into()),
            writer: None,
            path: None,
        }
    }

    /// Write to exactly this file (truncated on start)
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
            writer: None,
            path: None,
        }
    }

    /// Path of the file being written, once the session started
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn open(&mut self, info: &SessionInfo) -> PipelineResult<()> {
        let path = match &self.target {
            Target::File(path) => path.clone(),
            Target::Directory(dir) => {
                fs::create_dir_all(dir)?;
                let session = info.session_id.simple().to_string();
                dir.join(format!(
                    "history-{}-{}.jsonl",
                    Utc::now().format("%Y-%m-%d-%H%M%S"),
                    &session[..8]
                ))
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        log::info!("Recording classification history to {}", path.display());
        self.writer = Some(BufWriter::new(file));
        self.path = Some(path);
        Ok(())
    }

    fn write(&mut self, record: &HistoryRecord) -> PipelineResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PipelineError::Sink("history file not open".to_string()))?;

        let json = serde_json::to_string(record)
            .map_err(|e| PipelineError::Sink(format!("serialize history: {}", e)))?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

impl StreamSink for JsonlHistorySink {
    fn on_start(&mut self, info: &SessionInfo) -> PipelineResult<()> {
        self.open(info)?;
        self.write(&HistoryRecord::Header(info.clone()))
    }

    fn on_step(&mut self, report: &StepReport<'_>) -> PipelineResult<()> {
        self.write(&HistoryRecord::Sample(report.sample.clone()))
    }

    fn on_finish(&mut self, _state: &StreamState, summary: &SessionSummary) -> PipelineResult<()> {
        self.write(&HistoryRecord::Footer(summary.clone()))?;
        self.writer = None;
        Ok(())
    }
}

// ============================================================================
// REPLAY
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReplayedHistory {
    pub info: SessionInfo,
    pub state: StreamState,
    /// Absent when the session was interrupted before finishing
    pub summary: Option<SessionSummary>,
}

/// Rebuild the stream state of a recorded session.
///
/// Rejects a missing header, out-of-order or gapped indices, and (when
/// `expected_layout` is given) a header whose layout differs.
pub fn replay(path: &Path, expected_layout: Option<&FeatureLayout>) -> PipelineResult<ReplayedHistory> {
    if !path.exists() {
        return Err(PipelineError::config(format!(
            "History not found: {}",
            path.display()
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut info: Option<SessionInfo> = None;
    let mut state = StreamState::new();
    let mut summary = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: HistoryRecord = serde_json::from_str(&line).map_err(|e| {
            PipelineError::History(format!("line {}: {}", line_no + 1, e))
        })?;

        match record {
            HistoryRecord::Header(header) => {
                if info.is_some() {
                    return Err(PipelineError::History(format!(
                        "line {}: duplicate header",
                        line_no + 1
                    )));
                }
                if let Some(expected) = expected_layout {
                    expected
                        .validate(&header.layout)
                        .map_err(|e| PipelineError::History(e.to_string()))?;
                }
                info = Some(header);
            }
            HistoryRecord::Sample(sample) => {
                if info.is_none() {
                    return Err(PipelineError::History("sample before header".to_string()));
                }
                if summary.is_some() {
                    return Err(PipelineError::History(format!(
                        "line {}: sample after footer",
                        line_no + 1
                    )));
                }
                state
                    .append(sample)
                    .map_err(|e| PipelineError::History(format!("line {}: {}", line_no + 1, e)))?;
            }
            HistoryRecord::Footer(footer) => {
                if summary.is_some() {
                    return Err(PipelineError::History(format!(
                        "line {}: duplicate footer",
                        line_no + 1
                    )));
                }
                summary = Some(footer);
            }
        }
    }

    let info = info.ok_or_else(|| PipelineError::History("missing header".to_string()))?;
    log::info!(
        "Replayed session {}: {} samples, {} anomalies",
        info.session_id,
        state.len(),
        state.anomaly_count()
    );

    Ok(ReplayedHistory { info, state, summary })
}

/// Most recent history file in `dir` (file names sort by start time)
pub fn latest_history_file(dir: &Path) -> PipelineResult<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut entries = fs::read_dir(dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
        .collect::<Vec<_>>();

    entries.sort();
    Ok(entries.pop())
}
