//! Clinical indices: TyG, SPISE, METS-IR, TG/HDL.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// Floor applied to each SPISE power term before division.
const POWER_TERM_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedicalIndexSet {
    #[serde(rename = "SPISE")]
    pub spise: f64,
    #[serde(rename = "METS-IR")]
    pub mets_ir: f64,
    #[serde(rename = "TyG")]
    pub tyg: f64,
    #[serde(rename = "TG/HDL")]
    pub tg_hdl: f64,
}

/// Compute all four indices. Inputs in mg/dL (tg, glucose, hdl) and kg/m² (bmi).
pub fn compute_indexes(tg: f64, glucose: f64, hdl: f64, bmi: f64) -> Result<MedicalIndexSet, DomainError> {
    for (field, value) in [("tg", tg), ("glucose", glucose), ("hdl", hdl), ("bmi", bmi)] {
        // Negated comparison so NaN is rejected too.
        if !(value > 0.0) {
            return Err(DomainError::NonPositive(field));
        }
    }
    if hdl <= 1.0 {
        return Err(DomainError::HdlNotAboveOne(hdl));
    }

    // ln(tg · glucose / 2) in log space; the product under- or overflows at the extremes.
    let tyg = tg.ln() + glucose.ln() - LN_2;
    let spise = spise(tg, hdl, bmi)?;
    let mets_ir = mets_ir(tg, glucose, hdl, bmi)?;
    let tg_hdl = tg / hdl;

    let indexes = MedicalIndexSet {
        spise,
        mets_ir,
        tyg,
        tg_hdl,
    };
    ensure_finite(&indexes)?;
    Ok(indexes)
}

fn ensure_finite(idx: &MedicalIndexSet) -> Result<(), DomainError> {
    for (name, value) in [
        ("SPISE", idx.spise),
        ("METS-IR", idx.mets_ir),
        ("TyG", idx.tyg),
        ("TG/HDL", idx.tg_hdl),
    ] {
        if !value.is_finite() {
            return Err(DomainError::NonFiniteIndex(name));
        }
    }
    Ok(())
}

/// 600 · HDL^0.185 / (TG^0.2 · BMI^1.338)
fn spise(tg: f64, hdl: f64, bmi: f64) -> Result<f64, DomainError> {
    let hdl_term = hdl.powf(0.185).max(POWER_TERM_FLOOR);
    let tg_term = tg.powf(0.2).max(POWER_TERM_FLOOR);
    let bmi_term = bmi.powf(1.338).max(POWER_TERM_FLOOR);

    let value = 600.0 * hdl_term / (tg_term * bmi_term);
    if !(value > 0.0) {
        return Err(DomainError::NonPositiveSpise);
    }
    Ok(value)
}

/// ln(2·glucose + TG) · BMI / ln(HDL)
fn mets_ir(tg: f64, glucose: f64, hdl: f64, bmi: f64) -> Result<f64, DomainError> {
    let denominator = hdl.ln();
    if denominator == 0.0 {
        return Err(DomainError::ZeroMetsIrDenominator);
    }
    Ok((2.0 * glucose + tg).ln() * bmi / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn round4(x: f64) -> f64 {
        (x * 1e4).round() / 1e4
    }

    #[test]
    fn reference_example_tyg_and_ratio() {
        let idx = compute_indexes(150.0, 100.0, 50.0, 25.0).unwrap();
        assert_eq!(round4(idx.tyg), 8.9227);
        assert_eq!(round4(idx.tg_hdl), 3.0);
    }

    #[test]
    fn reference_example_spise_and_mets_ir() {
        let idx = compute_indexes(150.0, 100.0, 50.0, 25.0).unwrap();
        let spise = 600.0 * 50f64.powf(0.185) / (150f64.powf(0.2) * 25f64.powf(1.338));
        let mets_ir = 350f64.ln() * 25.0 / 50f64.ln();
        assert_eq!(idx.spise, spise);
        assert_eq!(idx.mets_ir, mets_ir);
        assert!(idx.spise > 0.0);
    }

    #[test]
    fn hdl_at_or_below_one_is_rejected() {
        assert_eq!(
            compute_indexes(100.0, 90.0, 1.0, 22.0),
            Err(DomainError::HdlNotAboveOne(1.0))
        );
        assert_eq!(
            compute_indexes(100.0, 90.0, 0.5, 22.0),
            Err(DomainError::HdlNotAboveOne(0.5))
        );
        let msg = compute_indexes(100.0, 90.0, 1.0, 22.0).unwrap_err().to_string();
        assert!(msg.contains("HDL"));
    }

    #[test]
    fn non_positive_values_rejected_in_field_order() {
        assert_eq!(
            compute_indexes(0.0, 90.0, 50.0, 22.0),
            Err(DomainError::NonPositive("tg"))
        );
        assert_eq!(
            compute_indexes(100.0, -1.0, 50.0, 22.0),
            Err(DomainError::NonPositive("glucose"))
        );
        assert_eq!(
            compute_indexes(100.0, 90.0, 0.0, 22.0),
            Err(DomainError::NonPositive("hdl"))
        );
        assert_eq!(
            compute_indexes(100.0, 90.0, 50.0, f64::NAN),
            Err(DomainError::NonPositive("bmi"))
        );
    }

    #[test]
    fn valid_inputs_give_finite_indices() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..5_000 {
            let tg = rng.gen_range(1e-3..2_000.0);
            let glucose = rng.gen_range(1e-3..800.0);
            let hdl = rng.gen_range(1.0001..250.0);
            let bmi = rng.gen_range(1e-3..80.0);
            let idx = compute_indexes(tg, glucose, hdl, bmi).unwrap();
            for v in [idx.spise, idx.mets_ir, idx.tyg, idx.tg_hdl] {
                assert!(v.is_finite(), "non-finite index for {tg} {glucose} {hdl} {bmi}");
            }
        }
    }

    #[test]
    fn extreme_magnitudes_stay_finite() {
        for (tg, glucose) in [(1e-200, 1e-200), (1e200, 1e200), (f64::MIN_POSITIVE, 1e-300)] {
            let idx = compute_indexes(tg, glucose, 50.0, 25.0).unwrap();
            for v in [idx.spise, idx.mets_ir, idx.tyg, idx.tg_hdl] {
                assert!(v.is_finite(), "non-finite index for tg={tg} glucose={glucose}");
            }
        }
        let idx = compute_indexes(1e-200, 1e-200, 50.0, 25.0).unwrap();
        assert!((idx.tyg - (2.0 * 1e-200f64.ln() - LN_2)).abs() < 1e-9);
    }

    #[test]
    fn overflowing_bmi_term_hits_spise_guard() {
        assert_eq!(
            compute_indexes(150.0, 100.0, 50.0, 1e300),
            Err(DomainError::NonPositiveSpise)
        );
    }

    #[test]
    fn infinite_inputs_surface_as_non_finite_index() {
        assert_eq!(
            compute_indexes(150.0, f64::INFINITY, 50.0, 25.0),
            Err(DomainError::NonFiniteIndex("METS-IR"))
        );
        assert_eq!(
            compute_indexes(150.0, 100.0, f64::INFINITY, 25.0),
            Err(DomainError::NonFiniteIndex("SPISE"))
        );
    }

    #[test]
    fn non_finite_check_names_the_index() {
        let idx = MedicalIndexSet {
            spise: 5.0,
            mets_ir: 40.0,
            tyg: f64::NEG_INFINITY,
            tg_hdl: 3.0,
        };
        assert_eq!(ensure_finite(&idx), Err(DomainError::NonFiniteIndex("TyG")));
    }

    #[test]
    fn deterministic() {
        let a = compute_indexes(123.4, 98.7, 45.6, 27.3).unwrap();
        let b = compute_indexes(123.4, 98.7, 45.6, 27.3).unwrap();
        assert_eq!(a.spise.to_bits(), b.spise.to_bits());
        assert_eq!(a.mets_ir.to_bits(), b.mets_ir.to_bits());
    }
}
