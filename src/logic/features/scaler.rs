//! Feature Scaler - per-feature min-max transform
//!
//! Fit once over the whole loaded dataset at session start, frozen afterwards.
//! The streamed readings are the same ones the scaler was fit on, so every
//! transformed value lands in [0, 1]. Values outside the fit range are not
//! clamped.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::logic::dataset::Reading;
use crate::logic::error::{PipelineError, PipelineResult};

/// Reading after scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledReading {
    pub timestamp: NaiveDateTime,
    pub features: Vec<f64>,
}

/// Fitted min/max per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub min_vals: Vec<f64>,
    pub max_vals: Vec<f64>,
}

impl ScalerParams {
    /// Fit over every reading. With no readings the params are all zero,
    /// which is harmless since nothing will be transformed.
    pub fn fit(readings: &[Reading], feature_count: usize) -> Self {
        if readings.is_empty() {
            return Self {
                min_vals: vec![0.0; feature_count],
                max_vals: vec![0.0; feature_count],
            };
        }

        let mut min_vals = vec![f64::INFINITY; feature_count];
        let mut max_vals = vec![f64::NEG_INFINITY; feature_count];

        for reading in readings {
            for (i, &v) in reading.raw_features.iter().enumerate().take(feature_count) {
                min_vals[i] = min_vals[i].min(v);
                max_vals[i] = max_vals[i].max(v);
            }
        }

        Self { min_vals, max_vals }
    }

    pub fn feature_count(&self) -> usize {
        self.min_vals.len()
    }

    /// `(v - min) / (max - min)`; a constant feature (zero range) maps to 0.
    pub fn scale_value(&self, index: usize, v: f64) -> f64 {
        let min_val = self.min_vals[index];
        let range = self.max_vals[index] - min_val;
        let range = if range == 0.0 { 1.0 } else { range };

        (v - min_val) / range
    }

    pub fn transform(&self, reading: &Reading) -> PipelineResult<ScaledReading> {
        if reading.raw_features.len() != self.feature_count() {
            return Err(PipelineError::ArityMismatch {
                expected: self.feature_count(),
                got: reading.raw_features.len(),
            });
        }

        let features = reading
            .raw_features
            .iter()
            .enumerate()
            .map(|(i, &v)| self.scale_value(i, v))
            .collect();

        Ok(ScaledReading {
            timestamp: reading.timestamp,
            features,
        })
    }
}
