//! Feature derivation: indices → interactions, squares, weighted combination → model-ordered vector.

use super::{FeatureVector, MedicalIndexSet};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Mean/std pair taken from the training population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub mean: f64,
    pub std: f64,
}

impl Standardization {
    pub fn apply(&self, x: f64) -> f64 {
        (x - self.mean) / self.std
    }
}

/// Constants for `weighted_combination`. Ships with the model bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizationReference {
    pub spise: Standardization,
    pub mets_ir: Standardization,
    pub spise_weight: f64,
    pub mets_ir_weight: f64,
}

impl StandardizationReference {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, s) in [("spise", &self.spise), ("mets_ir", &self.mets_ir)] {
            if !s.mean.is_finite() || !s.std.is_finite() || s.std <= 0.0 {
                return Err(ModelError::InvalidManifest(format!(
                    "reference.{name} needs a finite mean and a positive std"
                )));
            }
        }
        if !self.spise_weight.is_finite() || !self.mets_ir_weight.is_finite() {
            return Err(ModelError::InvalidManifest(
                "reference weights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Every feature derivable from one [`MedicalIndexSet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub indexes: MedicalIndexSet,
    pub spise_mets_interaction: f64,
    pub spise_mets_ratio: f64,
    pub spise_tyg_interaction: f64,
    pub mets_tyg_interaction: f64,
    pub spise_squared: f64,
    pub mets_ir_squared: f64,
    pub tyg_squared: f64,
    pub tg_hdl_squared: f64,
    pub weighted_combination: f64,
}

impl DerivedFeatures {
    /// Look a feature up by its training column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let v = match name {
            "SPISE" => self.indexes.spise,
            "METS-IR" => self.indexes.mets_ir,
            "TyG" => self.indexes.tyg,
            "TG/HDL" => self.indexes.tg_hdl,
            "SPISE_METS_interaction" => self.spise_mets_interaction,
            "SPISE_METS_ratio" => self.spise_mets_ratio,
            "SPISE_TyG_interaction" => self.spise_tyg_interaction,
            "METS_TyG_interaction" => self.mets_tyg_interaction,
            "SPISE_squared" => self.spise_squared,
            "METS-IR_squared" => self.mets_ir_squared,
            "TyG_squared" => self.tyg_squared,
            "TG/HDL_squared" => self.tg_hdl_squared,
            "weighted_combination" => self.weighted_combination,
            _ => return None,
        };
        Some(v)
    }
}

pub struct FeatureBuilder {
    reference: StandardizationReference,
}

impl FeatureBuilder {
    pub fn new(reference: StandardizationReference) -> Self {
        Self { reference }
    }

    pub fn derive(&self, idx: &MedicalIndexSet) -> DerivedFeatures {
        let spise_mets_ratio = if idx.mets_ir != 0.0 {
            idx.spise / idx.mets_ir
        } else {
            0.0
        };
        let r = &self.reference;
        let weighted_combination = r.spise_weight * r.spise.apply(idx.spise)
            + r.mets_ir_weight * r.mets_ir.apply(idx.mets_ir);

        DerivedFeatures {
            indexes: *idx,
            spise_mets_interaction: idx.spise * idx.mets_ir,
            spise_mets_ratio,
            spise_tyg_interaction: idx.spise * idx.tyg,
            mets_tyg_interaction: idx.mets_ir * idx.tyg,
            spise_squared: idx.spise.powi(2),
            mets_ir_squared: idx.mets_ir.powi(2),
            tyg_squared: idx.tyg.powi(2),
            tg_hdl_squared: idx.tg_hdl.powi(2),
            weighted_combination,
        }
    }

    /// Derive and lay the features out in `columns` order.
    pub fn build(&self, idx: &MedicalIndexSet, columns: &[String]) -> Result<FeatureVector, ModelError> {
        let derived = self.derive(idx);
        let values = columns
            .iter()
            .map(|c| derived.get(c).ok_or_else(|| ModelError::FeatureMismatch(c.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureVector {
            names: columns.to_vec(),
            values,
        })
    }
}
