// zerberus-classify/src/lib.rs
// ============================================================
// zerberus-classify  –  Classification stage for the robot
// Runs the pretrained frame classifier (ONNX export of the
// network) via Tract (pure-Rust, works on the Pi).
// ------------------------------------------------------------
// Pipeline: Array4<f32> (1,3,72,128) → Tensor → ArrayD<f32>
// ------------------------------------------------------------
// Public API
//   * TractClassifier::load(path, shape) – load & optimise ONNX
//   * Classifier::forward(arr4)          – raw output tensor
//   * first_score(&out)                  – output[0][0]
// ============================================================

//! Zerberus – classification layer
//!
//! A backend-agnostic [`Classifier`] trait plus the concrete
//! **`TractClassifier`**.  Input tensors come from `zerberus-preprocess`
//! (CHW, f32) with a batch axis added by the caller.  The output is handed
//! back untouched: no softmax, no argmax, the caller decides what to read.

use ndarray::{Array4, ArrayD, IxDyn};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tract_onnx::prelude::*;

/// Shape the classifier was exported with: one 3×72×128 image.
pub const INPUT_SHAPE: [usize; 4] = [1, 3, 72, 128];

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("Model load or inference error: {0}")]
    Tract(#[from] TractError),
    #[error("Invalid input shape: expected {expected:?}, got {got:?}")]
    InputShape { expected: [usize; 4], got: Vec<usize> },
    #[error("Model produced no output")]
    NoOutput,
    #[error("Invalid output shape: {0}")]
    OutputShape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

/// Trait for frame classifiers.
pub trait Classifier {
    /// One forward pass over an `N×C×H×W` batch.
    fn forward(&self, input: &Array4<f32>) -> Result<ArrayD<f32>>;
}

/// First scalar of the first batch element, i.e. `output[0][0]`.
pub fn first_score(output: &ArrayD<f32>) -> Option<f32> {
    output.iter().next().copied()
}

/// Tract-powered classifier.
pub struct TractClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    input_shape: [usize; 4],
}

impl TractClassifier {
    /// Load and optimize the ONNX model, pinning its input to `input_shape`.
    pub fn load(model_path: impl AsRef<Path>, input_shape: [usize; 4]) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.is_file() {
            return Err(ClassifyError::ModelNotFound(model_path.to_path_buf()));
        }

        let dims = input_shape.map(|d| d as i32);
        let model = tract_onnx::onnx()
            .model_for_path(model_path)?
            .with_input_fact(0, f32::fact(dims).into())?
            .into_optimized()?
            .into_runnable()?;

        log::info!("loaded classifier {} with input {:?}", model_path.display(), input_shape);
        Ok(Self { model, input_shape })
    }
}

impl Classifier for TractClassifier {
    fn forward(&self, input: &Array4<f32>) -> Result<ArrayD<f32>> {
        if input.shape() != self.input_shape {
            return Err(ClassifyError::InputShape {
                expected: self.input_shape,
                got: input.shape().to_vec(),
            });
        }

        // 1) ndarray → tract Tensor (logical order, any layout)
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(&self.input_shape, &data)?;

        // 2) Run the model
        let outputs = self.model.run(tvec![tensor.into()])?;
        let first = outputs.first().ok_or(ClassifyError::NoOutput)?;
        let view = first.to_array_view::<f32>()?;

        // 3) back into our ndarray version
        let shape = view.shape().to_vec();
        let values: Vec<f32> = view.iter().copied().collect();
        log::debug!("classifier output shape {:?}", shape);
        Ok(ArrayD::from_shape_vec(IxDyn(&shape), values)?)
    }
}
