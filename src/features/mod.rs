//! Clinical index computation and model feature derivation.

mod indexes;
mod pipeline;

pub use indexes::{compute_indexes, MedicalIndexSet};
pub use pipeline::{DerivedFeatures, FeatureBuilder, Standardization, StandardizationReference};

use serde::{Deserialize, Serialize};

/// Every column name the builder can supply.
pub const FEATURE_NAMES: [&str; 13] = [
    "SPISE",
    "METS-IR",
    "TyG",
    "TG/HDL",
    "SPISE_METS_interaction",
    "SPISE_METS_ratio",
    "SPISE_TyG_interaction",
    "METS_TyG_interaction",
    "SPISE_squared",
    "METS-IR_squared",
    "TyG_squared",
    "TG/HDL_squared",
    "weighted_combination",
];

/// Named feature values in the order a model declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Single-precision copy for runtimes that take f32 tensors.
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}
