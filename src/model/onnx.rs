//! ONNX Runtime classifier. Input: [1, n_features] f32. Output: class probabilities [1, 2] f32.
//! The runtime library is loaded dynamically on first use (`ORT_DYLIB_PATH`).

use super::Classifier;
use crate::error::ModelError;
use crate::features::FeatureVector;
use ndarray::Array2;
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use std::path::Path;
use std::sync::OnceLock;

static ORT_ENV: OnceLock<Result<(), String>> = OnceLock::new();

fn init_env() -> Result<(), ModelError> {
    ORT_ENV
        .get_or_init(|| {
            ort::init()
                .with_name("masld-risk")
                .commit()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(ModelError::Runtime)
}

pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    probability_output: String,
    positive_class_index: usize,
    feature_dim: Option<usize>,
}

impl OnnxClassifier {
    pub fn load(
        path: &Path,
        input_name: Option<&str>,
        probability_output: &str,
        positive_class_index: usize,
    ) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::Unavailable(format!(
                "ONNX model not found at {}",
                path.display()
            )));
        }
        init_env()?;

        let session = Session::builder()?.commit_from_file(path)?;

        let input = match input_name {
            Some(name) => session.inputs.iter().find(|i| i.name == name),
            None => session.inputs.first(),
        }
        .ok_or_else(|| {
            ModelError::InvalidManifest(format!(
                "ONNX graph has no input {}",
                input_name.unwrap_or("(any)")
            ))
        })?;

        // Last dimension of a [batch, n_features] input; dynamic axes are negative.
        let feature_dim = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .copied()
                .filter(|d| *d > 0)
                .map(|d| d as usize),
            _ => None,
        };
        let input_name = input.name.clone();

        if !session.outputs.iter().any(|o| o.name == probability_output) {
            return Err(ModelError::InvalidManifest(format!(
                "ONNX graph has no output '{probability_output}'"
            )));
        }

        tracing::debug!(
            path = %path.display(),
            input = %input_name,
            output = probability_output,
            feature_dim = ?feature_dim,
            "ONNX session ready"
        );

        Ok(Self {
            session,
            input_name,
            probability_output: probability_output.to_string(),
            positive_class_index,
            feature_dim,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let arr = Array2::from_shape_vec((1, features.len()), features.to_f32())
            .map_err(|e| ModelError::Runtime(e.to_string()))?;
        let input = Tensor::from_array(arr)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input]?)?;
        let out = outputs
            .get(self.probability_output.as_str())
            .ok_or_else(|| {
                ModelError::Runtime(format!("missing output '{}'", self.probability_output))
            })?;
        let view = out.try_extract_tensor::<f32>()?;
        let probs: Vec<f32> = view.iter().copied().collect();

        // A single-column output is already the positive-class probability.
        let p = if probs.len() >= 2 {
            probs.get(self.positive_class_index)
        } else {
            probs.first()
        };
        p.map(|&p| f64::from(p))
            .ok_or_else(|| ModelError::Runtime("empty probability tensor".to_string()))
    }

    fn expected_features(&self) -> Option<usize> {
        self.feature_dim
    }
}
