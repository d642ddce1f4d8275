//! Stream State - append-only classification history
//!
//! Owned by the driver for one session. `samples[i].index == i` always holds;
//! samples are never removed or mutated. `reset` is the only way to clear it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::ANOMALY_TABLE_DECIMALS;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::model::Severity;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One processed reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSample {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub error: f64,
    pub is_anomaly: bool,
    #[serde(rename = "severity_state")]
    pub severity: Severity,
}

/// Row of the anomalies table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRow {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    /// Rounded to 5 decimal places
    pub error: f64,
}

/// Point of the error chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorPoint {
    pub index: usize,
    pub error: f64,
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub normal: usize,
    pub caution: usize,
    pub anomaly: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Normal => self.normal += 1,
            Severity::Caution => self.caution += 1,
            Severity::Anomaly => self.anomaly += 1,
        }
    }
}

/// Round half-to-even at `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

// ============================================================================
// STREAM STATE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StreamState {
    samples: Vec<ErrorSample>,
    /// Positions of flagged samples, ascending
    anomaly_positions: Vec<usize>,
    severity_counts: SeverityCounts,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next sample. Its index must equal the current length.
    pub fn append(&mut self, sample: ErrorSample) -> PipelineResult<()> {
        if sample.index != self.samples.len() {
            return Err(PipelineError::InvalidState(format!(
                "expected sample index {}, got {}",
                self.samples.len(),
                sample.index
            )));
        }

        let position = self.samples.len();
        if sample.is_anomaly {
            self.anomaly_positions.push(position);
        }
        self.severity_counts.record(sample.severity);
        self.samples.push(sample);
        Ok(())
    }

    /// Discard all history
    pub fn reset(&mut self) {
        self.samples.clear();
        self.anomaly_positions.clear();
        self.severity_counts = SeverityCounts::default();
    }

    pub fn all(&self) -> &[ErrorSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&ErrorSample> {
        self.samples.last()
    }

    /// Next index to be appended
    pub fn next_index(&self) -> usize {
        self.samples.len()
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    /// Flagged samples in ascending index order
    pub fn anomalies(&self) -> impl Iterator<Item = &ErrorSample> + '_ {
        self.anomaly_positions.iter().map(|&p| &self.samples[p])
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomaly_positions.len()
    }

    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.anomalies().map(|s| s.index).collect()
    }

    pub fn anomaly_timestamps(&self) -> Vec<NaiveDateTime> {
        self.anomalies().map(|s| s.timestamp).collect()
    }

    pub fn anomaly_errors(&self) -> Vec<f64> {
        self.anomalies().map(|s| s.error).collect()
    }

    pub fn error_series(&self) -> Vec<ErrorPoint> {
        self.samples
            .iter()
            .map(|s| ErrorPoint {
                index: s.index,
                error: s.error,
                is_anomaly: s.is_anomaly,
            })
            .collect()
    }

    pub fn anomaly_table(&self) -> Vec<AnomalyRow> {
        self.anomalies()
            .map(|s| AnomalyRow {
                index: s.index,
                timestamp: s.timestamp,
                error: round_to(s.error, ANOMALY_TABLE_DECIMALS),
            })
            .collect()
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        self.severity_counts
    }
}
