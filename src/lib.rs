//! Steam Monitor - streaming anomaly classification over steam generation data

pub mod constants;
pub mod logic;

pub use logic::config::MonitorConfig;
pub use logic::error::{PipelineError, PipelineResult};
