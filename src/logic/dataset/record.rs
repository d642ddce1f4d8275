use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One valid source row. Feature order follows the session `FeatureLayout`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub raw_features: Vec<f64>,
}

/// Aggregate outcome of a dataset load
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Data rows in the file (header excluded)
    pub rows_read: usize,
    /// Rows removed because of an invalid or missing cell
    pub rows_dropped: usize,
    pub feature_count: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}
