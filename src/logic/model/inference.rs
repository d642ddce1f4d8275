//! Inference Engine - Reconstruction Model Contract
//!
//! The model is a black box: a feature vector of length N in, a reconstructed
//! vector of length N out. Deterministic, stateless, input untouched.
//!
//! The production artifact is an ONNX export of the autoencoder run through
//! ONNX Runtime. Any closure can stand in for it through [`FnModel`].

use std::path::Path;
use std::time::Instant;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Value, ValueType};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::error::{PipelineError, PipelineResult};

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Trait for reconstruction models (ONNX, closures, ...)
pub trait ReconstructionModel {
    fn reconstruct(&self, input: &[f64]) -> PipelineResult<Vec<f64>>;

    /// Input arity, when the model knows it up front
    fn expected_arity(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> String {
        "model".to_string()
    }
}

impl<M: ReconstructionModel + ?Sized> ReconstructionModel for Box<M> {
    fn reconstruct(&self, input: &[f64]) -> PipelineResult<Vec<f64>> {
        (**self).reconstruct(input)
    }

    fn expected_arity(&self) -> Option<usize> {
        (**self).expected_arity()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Run the model and enforce the output contract: same length, finite values.
pub fn checked_reconstruct<M: ReconstructionModel + ?Sized>(
    model: &M,
    input: &[f64],
) -> PipelineResult<Vec<f64>> {
    let output = model.reconstruct(input)?;

    if output.len() != input.len() {
        return Err(PipelineError::ArityMismatch {
            expected: input.len(),
            got: output.len(),
        });
    }
    if let Some(pos) = output.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::ModelInference(format!(
            "non-finite value at output position {}",
            pos
        )));
    }

    Ok(output)
}

// ============================================================================
// MODEL METADATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    /// SHA-256 of the artifact bytes, hex encoded
    pub sha256: String,
    pub size_bytes: u64,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Checksum of a model artifact
pub fn compute_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxModel {
    session: Mutex<Session>,
    output_name: String,
    /// Feature width of the first input, when the graph fixes it
    input_arity: Option<usize>,
    metadata: ModelMetadata,
}

/// Last dimension of an input shape, if static (`-1` marks a dynamic axis)
pub fn static_arity(shape: &[i64]) -> Option<usize> {
    shape.last().copied().filter(|&d| d > 0).map(|d| d as usize)
}

impl OnnxModel {
    /// Load from file. Missing file is a configuration error; anything else
    /// that prevents building the session is a model load error.
    pub fn load(model_path: &Path) -> PipelineResult<Self> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(PipelineError::config(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let bytes = std::fs::read(model_path)?;
        let mut model = Self::from_bytes(&bytes)?;
        model.metadata.model_path = model_path.display().to_string();

        log::info!(
            "ONNX model loaded ({} bytes, sha256 {}, arity {:?})",
            model.metadata.size_bytes,
            model.metadata.sha256,
            model.input_arity
        );
        Ok(model)
    }

    pub fn from_bytes(model_bytes: &[u8]) -> PipelineResult<Self> {
        let session = Session::builder()
            .map_err(|e| PipelineError::ModelLoad(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PipelineError::ModelLoad(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| PipelineError::ModelLoad(format!("Load from memory error: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| PipelineError::ModelLoad("No output defined".to_string()))?;

        let input_arity = session.inputs.first().and_then(|input| match &input.input_type {
            ValueType::Tensor { shape, .. } => static_arity(shape),
            _ => None,
        });

        let metadata = ModelMetadata {
            model_path: "<memory>".to_string(),
            sha256: compute_checksum(model_bytes),
            size_bytes: model_bytes.len() as u64,
            loaded_at: chrono::Utc::now(),
        };

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            input_arity,
            metadata,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl ReconstructionModel for OnnxModel {
    fn reconstruct(&self, input: &[f64]) -> PipelineResult<Vec<f64>> {
        let start_time = Instant::now();

        let row: Vec<f32> = input.iter().map(|&v| v as f32).collect();
        let input_array = Array2::<f32>::from_shape_vec((1, input.len()), row)
            .map_err(|e| PipelineError::ModelInference(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| PipelineError::ModelInference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PipelineError::ModelInference(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| PipelineError::ModelInference("No output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::ModelInference(format!("Extract error: {}", e)))?;

        let reconstructed = data.iter().map(|&v| v as f64).collect();

        log::trace!("ONNX inference took {} us", start_time.elapsed().as_micros());
        Ok(reconstructed)
    }

    fn expected_arity(&self) -> Option<usize> {
        self.input_arity
    }

    fn name(&self) -> String {
        self.metadata.model_path.clone()
    }
}

// ============================================================================
// CLOSURE IMPLEMENTATION
// ============================================================================

/// Wraps a plain function as a reconstruction model
pub struct FnModel<F> {
    f: F,
    arity: Option<usize>,
}

impl<F> FnModel<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    pub fn new(f: F) -> Self {
        Self { f, arity: None }
    }

    pub fn with_arity(f: F, arity: usize) -> Self {
        Self { f, arity: Some(arity) }
    }
}

impl<F> ReconstructionModel for FnModel<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn reconstruct(&self, input: &[f64]) -> PipelineResult<Vec<f64>> {
        Ok((self.f)(input))
    }

    fn expected_arity(&self) -> Option<usize> {
        self.arity
    }

    fn name(&self) -> String {
        "fn-model".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_reconstruct_passes_identity() {
        let model = FnModel::new(|x: &[f64]| x.to_vec());
        assert_eq!(checked_reconstruct(&model, &[0.1, 0.9]).unwrap(), vec![0.1, 0.9]);
    }

    #[test]
    fn test_checked_reconstruct_rejects_wrong_length() {
        let model = FnModel::new(|x: &[f64]| x[..1].to_vec());
        let err = checked_reconstruct(&model, &[0.1, 0.9]).unwrap_err();
        assert!(matches!(err, PipelineError::ArityMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_checked_reconstruct_rejects_non_finite() {
        let model = FnModel::new(|x: &[f64]| vec![f64::NAN; x.len()]);
        let err = checked_reconstruct(&model, &[0.1]).unwrap_err();
        assert!(matches!(err, PipelineError::ModelInference(_)));
    }

    #[test]
    fn test_model_error_propagates() {
        struct Broken;
        impl ReconstructionModel for Broken {
            fn reconstruct(&self, _: &[f64]) -> PipelineResult<Vec<f64>> {
                Err(PipelineError::ModelInference("boom".to_string()))
            }
        }
        assert!(checked_reconstruct(&Broken, &[0.0]).unwrap_err().is_inference());
    }

    #[test]
    fn test_boxed_model_delegates() {
        let model: Box<dyn ReconstructionModel> =
            Box::new(FnModel::with_arity(|x: &[f64]| x.to_vec(), 3));
        assert_eq!(model.expected_arity(), Some(3));
        assert_eq!(model.name(), "fn-model");
    }

    #[test]
    fn test_static_arity_from_input_shape() {
        assert_eq!(static_arity(&[1, 6]), Some(6));
        assert_eq!(static_arity(&[-1, 6]), Some(6));
        assert_eq!(static_arity(&[1, -1]), None);
        assert_eq!(static_arity(&[]), None);
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            compute_checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_missing_onnx_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxModel::load(&dir.path().join("missing.onnx")).err().unwrap();
        assert!(err.is_missing_file());
    }
}
