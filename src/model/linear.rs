//! Logistic classifier from exported coefficients. Same contract as the ONNX path, no runtime needed.

use super::Classifier;
use crate::error::ModelError;
use crate::features::FeatureVector;

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LogisticClassifier {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    pub fn logit(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl Classifier for LogisticClassifier {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        let z = self.logit(features.as_slice());
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    fn expected_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }
}
