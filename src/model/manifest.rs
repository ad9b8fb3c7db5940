//! Model bundle manifest: feature-column order, standardization constants, classifier descriptor.

use crate::error::ModelError;
use crate::features::{StandardizationReference, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Column order the classifier was trained on
    pub feature_columns: Vec<String>,
    /// Constants used to derive `weighted_combination`
    pub reference: StandardizationReference,
    pub classifier: ClassifierSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// ONNX graph exported with class probabilities as a plain tensor (no ZipMap).
    Onnx {
        /// Relative to the manifest directory
        path: PathBuf,
        #[serde(default)]
        input_name: Option<String>,
        #[serde(default = "default_probability_output")]
        probability_output: String,
        #[serde(default = "default_positive_class_index")]
        positive_class_index: usize,
    },
    /// Logistic regression over the feature columns.
    Logistic { intercept: f64, coefficients: Vec<f64> },
}

pub(crate) fn resolve_artifact(manifest_path: &Path, artifact: &Path) -> PathBuf {
    manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(artifact)
}

fn default_probability_output() -> String {
    "probabilities".to_string()
}

fn default_positive_class_index() -> usize {
    1
}

impl ModelManifest {
    /// Read and parse; returns the raw bytes too so callers can digest them.
    pub fn read(path: &Path) -> Result<(Self, Vec<u8>), ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::InvalidManifest(format!("{}: {e}", path.display())))?;
        Ok((manifest, bytes))
    }

    /// Classifier file this manifest points at, resolved against the manifest's directory.
    pub fn artifact_path(&self, manifest_path: &Path) -> Option<PathBuf> {
        match &self.classifier {
            ClassifierSpec::Onnx { path, .. } => Some(resolve_artifact(manifest_path, path)),
            ClassifierSpec::Logistic { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_columns.is_empty() {
            return Err(ModelError::InvalidManifest(
                "feature_columns is empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for column in &self.feature_columns {
            if !seen.insert(column.as_str()) {
                return Err(ModelError::InvalidManifest(format!(
                    "duplicate feature column '{column}'"
                )));
            }
            if !FEATURE_NAMES.contains(&column.as_str()) {
                return Err(ModelError::FeatureMismatch(column.clone()));
            }
        }
        self.reference.validate()?;

        match &self.classifier {
            ClassifierSpec::Onnx {
                positive_class_index,
                ..
            } if *positive_class_index > 1 => Err(ModelError::InvalidManifest(format!(
                "positive_class_index {positive_class_index} out of range for a binary classifier"
            ))),
            ClassifierSpec::Logistic {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != self.feature_columns.len() {
                    return Err(ModelError::DimensionMismatch {
                        expected: self.feature_columns.len(),
                        actual: coefficients.len(),
                    });
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::InvalidManifest(
                        "logistic coefficients must be finite".to_string(),
                    ));
                }
                Ok(())
            }
            ClassifierSpec::Onnx { .. } => Ok(()),
        }
    }
}
