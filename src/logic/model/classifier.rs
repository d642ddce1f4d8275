//! Anomaly Classifier
//!
//! Reconstruction error = mean squared difference between the scaled input
//! and the model's reconstruction. The error is then mapped through both
//! threshold scales of [`ThresholdConfig`].

use serde::{Deserialize, Serialize};

use super::threshold::ThresholdConfig;
use crate::logic::error::{PipelineError, PipelineResult};

// ============================================================================
// SEVERITY
// ============================================================================

/// Three-level severity, totally ordered Normal < Caution < Anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Caution,
    Anomaly,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Caution => "Caution",
            Severity::Anomaly => "Anomaly",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Severity::Normal => 0,
            Severity::Caution => 1,
            Severity::Anomaly => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Both labels for one error value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub error: f64,
    pub is_anomaly: bool,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyClassifier {
    thresholds: ThresholdConfig,
}

impl AnomalyClassifier {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn is_anomaly(&self, error: f64) -> bool {
        error > self.thresholds.binary_threshold
    }

    pub fn severity(&self, error: f64) -> Severity {
        if error < self.thresholds.severity_low {
            Severity::Normal
        } else if error < self.thresholds.severity_high {
            Severity::Caution
        } else {
            Severity::Anomaly
        }
    }

    pub fn label(&self, error: f64) -> Classification {
        Classification {
            error,
            is_anomaly: self.is_anomaly(error),
            severity: self.severity(error),
        }
    }

    pub fn classify(&self, scaled: &[f64], reconstructed: &[f64]) -> PipelineResult<Classification> {
        Ok(self.label(reconstruction_error(scaled, reconstructed)?))
    }
}

/// Mean squared error over all components
pub fn reconstruction_error(scaled: &[f64], reconstructed: &[f64]) -> PipelineResult<f64> {
    if scaled.len() != reconstructed.len() {
        return Err(PipelineError::ArityMismatch {
            expected: scaled.len(),
            got: reconstructed.len(),
        });
    }
    if scaled.is_empty() {
        return Ok(0.0);
    }

    let sum: f64 = scaled
        .iter()
        .zip(reconstructed)
        .map(|(a, b)| (a - b).powi(2))
        .sum();

    Ok(sum / scaled.len() as f64)
}
