//! Logic Module - Monitoring Pipeline
//!
//! ## Architecture
//! - `dataset/` - CSV ingestion (dates, numeric cleaning, row filtering)
//! - `features/` - Feature layout + min-max scaling
//! - `model/` - Reconstruction models, thresholds, severity classification
//! - `stream/` - Paced session driver, history, sinks

pub mod config;
pub mod error;

pub mod dataset;
pub mod features;
pub mod model;
pub mod stream;
