//! Model Module - Reconstruction & Classification
//!
//! The model is a black box behind a trait; thresholds live outside it.
//! Swapping the ONNX artifact never touches the classification policy.

pub mod inference;
pub mod threshold;
pub mod classifier;

// Re-export common types
pub use inference::{checked_reconstruct, FnModel, ModelMetadata, OnnxModel, ReconstructionModel};
pub use threshold::ThresholdConfig;
pub use classifier::{AnomalyClassifier, Classification, Severity};
