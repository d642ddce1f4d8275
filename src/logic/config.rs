//! Monitor Configuration
//!
//! Defaults come from `constants`; `from_env` overrides them from the process
//! environment (after loading `.env`). Paths are checked separately by
//! `check_paths` so a missing file is reported before any session exists.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::dataset::{LoaderConfig, TextEncoding};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::model::ThresholdConfig;
use crate::logic::stream::history::get_history_dir;
use crate::logic::stream::CancelPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Source dataset (`;`-delimited CSV)
    pub data_path: PathBuf,

    /// Reconstruction model artifact (ONNX)
    pub model_path: PathBuf,

    /// Where JSONL histories are written
    pub history_dir: PathBuf,

    pub loader: LoaderConfig,

    pub thresholds: ThresholdConfig,

    /// Pause between readings
    pub pacing_interval: Duration,

    /// Keep or drop the stream state when a run stops early
    pub cancel_policy: CancelPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(constants::DEFAULT_DATA_PATH),
            model_path: PathBuf::from(constants::DEFAULT_MODEL_PATH),
            history_dir: get_history_dir(),
            loader: LoaderConfig::default(),
            thresholds: ThresholdConfig::default(),
            pacing_interval: Duration::from_millis(constants::DEFAULT_PACING_MS),
            cancel_policy: CancelPolicy::Keep,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let encoding = constants::get_encoding();
        let encoding = TextEncoding::from_name(&encoding).unwrap_or_else(|| {
            log::warn!("Unknown STEAM_ENCODING '{}', using latin1", encoding);
            TextEncoding::Latin1
        });

        Self {
            data_path: PathBuf::from(constants::get_data_path()),
            model_path: PathBuf::from(constants::get_model_path()),
            history_dir: constants::get_history_dir()
                .map(PathBuf::from)
                .unwrap_or_else(get_history_dir),
            loader: LoaderConfig {
                encoding,
                ..Default::default()
            },
            thresholds: ThresholdConfig {
                binary_threshold: constants::get_binary_threshold(),
                severity_low: constants::get_severity_low(),
                severity_high: constants::get_severity_high(),
            },
            pacing_interval: Duration::from_millis(constants::get_pacing_ms()),
            cancel_policy: CancelPolicy::Keep,
        }
    }

    /// Option sanity (thresholds); does not touch the filesystem
    pub fn validate(&self) -> PipelineResult<()> {
        self.thresholds.validate()
    }

    /// Startup precondition: both the model and the dataset must exist
    pub fn check_paths(&self) -> PipelineResult<()> {
        if !self.model_path.exists() {
            return Err(PipelineError::config(format!(
                "Model not found: {}",
                self.model_path.display()
            )));
        }
        if !self.data_path.exists() {
            return Err(PipelineError::config(format!(
                "Dataset not found: {}",
                self.data_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/datos_generacion.csv"));
        assert_eq!(config.pacing_interval, Duration::from_millis(300));
        assert_eq!(config.thresholds.binary_threshold, 0.0211);
        assert_eq!(config.loader.delimiter, b';');
        assert_eq!(config.loader.timestamp_column, "Fecha");
        assert_eq!(config.loader.target_column, "total energia generada");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_check_paths_reports_missing_model_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonitorConfig {
            data_path: dir.path().join("datos.csv"),
            model_path: dir.path().join("model.onnx"),
            ..Default::default()
        };

        let err = config.check_paths().unwrap_err();
        assert!(err.is_missing_file());
        assert!(err.to_string().contains("Model not found"));

        fs::write(&config.model_path, b"onnx").unwrap();
        let err = config.check_paths().unwrap_err();
        assert!(err.to_string().contains("Dataset not found"));

        fs::write(&config.data_path, b"Fecha\n").unwrap();
        assert!(config.check_paths().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_severity() {
        let mut config = MonitorConfig::default();
        config.thresholds.severity_low = 0.5;
        assert!(matches!(config.validate(), Err(PipelineError::Configuration(_))));
    }
}
