//! Dataset Loader
//!
//! Reads the `;`-delimited generation log, parses the timestamp column with
//! the date normalizer and every other column with the numeric normalizer.
//! Rows holding any invalid numeric cell are dropped whole; a timestamp that
//! fails to parse aborts the load.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::dates::parse_timestamp;
use super::numeric::parse_or_invalid;
use super::record::{LoadReport, Reading};
use crate::constants::{DEFAULT_DELIMITER, DEFAULT_TARGET_COLUMN, DEFAULT_TIMESTAMP_COLUMN};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureLayout;

// ============================================================================
// CONFIG
// ============================================================================

/// Text encoding of the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// ISO-8859-1: every byte is the code point of the same value
    Latin1,
    /// UTF-8, invalid sequences replaced
    Utf8,
}

impl TextEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" => Some(TextEncoding::Latin1),
            "utf8" | "utf-8" => Some(TextEncoding::Utf8),
            _ => None,
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub delimiter: u8,
    pub encoding: TextEncoding,
    pub timestamp_column: String,
    /// Parsed and validated like any numeric column, then excluded from features
    pub target_column: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            encoding: TextEncoding::Latin1,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
        }
    }
}

// ============================================================================
// LOADER
// ============================================================================

/// Readings in source order plus the feature layout they follow
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub readings: Vec<Reading>,
    pub layout: FeatureLayout,
    pub report: LoadReport,
}

pub struct DatasetLoader {
    config: LoaderConfig,
}

impl DatasetLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load from disk. A missing file is a configuration error.
    pub fn load_path(&self, path: &Path) -> PipelineResult<LoadedDataset> {
        if !path.exists() {
            return Err(PipelineError::config(format!(
                "Dataset not found: {}",
                path.display()
            )));
        }

        log::info!("Loading dataset from: {}", path.display());
        let file = File::open(path)?;
        self.load_reader(BufReader::new(file))
    }

    pub fn load_reader<R: Read>(&self, source: R) -> PipelineResult<LoadedDataset> {
        let encoding = self.config.encoding;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| encoding.decode(h))
            .collect();

        let ts_idx = column_index(&headers, &self.config.timestamp_column)?;
        let target_idx = column_index(&headers, &self.config.target_column)?;

        let feature_idx: Vec<usize> = (0..headers.len())
            .filter(|&i| i != ts_idx && i != target_idx)
            .collect();
        let layout = FeatureLayout::new(feature_idx.iter().map(|&i| headers[i].clone()).collect());

        let mut readings = Vec::new();
        let mut report = LoadReport {
            feature_count: layout.len(),
            ..Default::default()
        };

        for (row, record) in reader.byte_records().enumerate() {
            let record = record?;
            report.rows_read += 1;

            let ts_cell = encoding.decode(record.get(ts_idx).unwrap_or_default());
            if ts_cell.is_empty() {
                log::debug!("Row {} dropped: empty timestamp", row + 1);
                report.rows_dropped += 1;
                continue;
            }
            let timestamp = parse_timestamp(&ts_cell).ok_or_else(|| PipelineError::Parse {
                row: row + 1,
                value: ts_cell.clone(),
            })?;

            // Every non-timestamp column must be valid, target included.
            // A short row has no cell for the trailing columns: invalid.
            let mut values: Vec<Option<f64>> = Vec::with_capacity(headers.len());
            for col in 0..headers.len() {
                if col == ts_idx {
                    values.push(None);
                    continue;
                }
                values.push(
                    record
                        .get(col)
                        .and_then(|cell| parse_or_invalid(&encoding.decode(cell))),
                );
            }

            let invalid_col = (0..values.len()).find(|&c| c != ts_idx && values[c].is_none());
            if let Some(col) = invalid_col {
                log::debug!("Row {} dropped: invalid value in '{}'", row + 1, headers[col]);
                report.rows_dropped += 1;
                continue;
            }

            let raw_features = feature_idx
                .iter()
                .map(|&i| values[i].unwrap_or_default())
                .collect();

            readings.push(Reading { timestamp, raw_features });
        }

        log::info!(
            "Dataset loaded: {} rows read, {} dropped, {} features",
            report.rows_read,
            report.rows_dropped,
            report.feature_count
        );

        Ok(LoadedDataset { readings, layout, report })
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

fn column_index(headers: &[String], name: &str) -> PipelineResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
}
