//! Error taxonomy for the monitoring pipeline.
//!
//! Loading errors are surfaced synchronously to the caller. Invalid numeric
//! cells are NOT errors: they only drop their row (see `dataset::numeric`).

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing required file or invalid option. Fatal before any session starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A timestamp cell did not match `DD-Mon-YY HH:MM:SS` after month substitution.
    #[error("Parse error at data row {row}: cannot parse timestamp '{value}'")]
    Parse { row: usize, value: String },

    #[error("Column '{0}' not found in dataset header")]
    MissingColumn(String),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Model arity mismatch: expected {expected} features, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("History error: {0}")]
    History(String),

    /// Operation not allowed in the driver's current state.
    #[error("Invalid driver state: {0}")]
    InvalidState(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }

    /// "File not found" side of the user-facing distinction.
    pub fn is_missing_file(&self) -> bool {
        match self {
            PipelineError::Configuration(msg) => msg.contains("not found"),
            PipelineError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// "File present but malformed" side of the user-facing distinction.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PipelineError::Parse { .. }
                | PipelineError::MissingColumn(_)
                | PipelineError::Csv(_)
                | PipelineError::History(_)
        )
    }

    /// Errors that halt a running session.
    pub fn is_inference(&self) -> bool {
        matches!(
            self,
            PipelineError::ModelInference(_) | PipelineError::ArityMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::History(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_vs_malformed() {
        let missing = PipelineError::config("Dataset not found: data/x.csv");
        assert!(missing.is_missing_file());
        assert!(!missing.is_malformed());

        let bad = PipelineError::Parse { row: 3, value: "31-xyz-23 00:00:00".to_string() };
        assert!(bad.is_malformed());
        assert!(!bad.is_missing_file());
    }

    #[test]
    fn test_inference_errors() {
        assert!(PipelineError::ArityMismatch { expected: 4, got: 3 }.is_inference());
        assert!(!PipelineError::Sink("closed".to_string()).is_inference());
    }
}
