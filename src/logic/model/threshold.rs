//! Threshold Configuration
//!
//! Two independent scales over the same reconstruction error:
//! - a binary threshold feeding the anomaly flag and the anomalies table
//! - a two-cut severity scale (Normal / Caution / Anomaly)
//!
//! They overlap and may disagree (0.020 is not flagged but is Caution).
//! Both are reported; neither is derived from the other.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BINARY_THRESHOLD, DEFAULT_SEVERITY_HIGH, DEFAULT_SEVERITY_LOW};
use crate::logic::error::{PipelineError, PipelineResult};

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// error > binary_threshold => anomaly flag
    pub binary_threshold: f64,

    /// error < severity_low => Normal
    pub severity_low: f64,

    /// error >= severity_high => Anomaly, in between => Caution
    pub severity_high: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            binary_threshold: DEFAULT_BINARY_THRESHOLD,
            severity_low: DEFAULT_SEVERITY_LOW,
            severity_high: DEFAULT_SEVERITY_HIGH,
        }
    }
}

impl ThresholdConfig {
    pub fn new(binary_threshold: f64) -> Self {
        Self {
            binary_threshold,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let values = [
            ("binary_threshold", self.binary_threshold),
            ("severity_low", self.severity_low),
            ("severity_high", self.severity_high),
        ];
        for (name, v) in values {
            if !v.is_finite() || v < 0.0 {
                return Err(PipelineError::config(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, v
                )));
            }
        }

        if self.severity_low > self.severity_high {
            return Err(PipelineError::config(format!(
                "severity_low ({}) must not exceed severity_high ({})",
                self.severity_low, self.severity_high
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_config() {
        let config = ThresholdConfig::default();
        assert_eq!(config.binary_threshold, 0.0211);
        assert_eq!(config.severity_low, 0.015);
        assert_eq!(config.severity_high, 0.025);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ThresholdConfig::new(-0.1).validate().is_err());
        assert!(ThresholdConfig::new(f64::NAN).validate().is_err());

        let inverted = ThresholdConfig {
            severity_low: 0.03,
            severity_high: 0.02,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}
