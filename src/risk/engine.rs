//! Classifier probability → percentage → risk tier and recommendation.

use crate::error::AssessmentError;
use crate::features::{compute_indexes, MedicalIndexSet};
use crate::input::ClinicalInput;
use crate::model::ModelHandle;
use serde::{Deserialize, Serialize};

/// Ordered tiers over half-open percentage ranges; a boundary value belongs to the upper tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    MediumHigh,
    High,
}

impl RiskLevel {
    /// Lower bound (inclusive) of each tier, ascending.
    pub const THRESHOLDS: [(f64, RiskLevel); 5] = [
        (0.0, RiskLevel::VeryLow),
        (10.0, RiskLevel::Low),
        (30.0, RiskLevel::Medium),
        (50.0, RiskLevel::MediumHigh),
        (70.0, RiskLevel::High),
    ];

    pub fn from_percentage(percentage: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .rev()
            .find(|(lo, _)| percentage >= *lo)
            .map(|&(_, level)| level)
            .unwrap_or(RiskLevel::VeryLow)
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Very Low Risk",
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::MediumHigh => "Medium-High Risk",
            RiskLevel::High => "High Risk",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Maintain healthy lifestyle, regular check-ups",
            RiskLevel::Low => "Maintain good living habits, balanced diet",
            RiskLevel::Medium => {
                "Suggest improving lifestyle, increasing exercise, controlling weight"
            }
            RiskLevel::MediumHigh => {
                "Recommend medical consultation and liver-related examinations"
            }
            RiskLevel::High => "Strongly recommend immediate medical evaluation and intervention",
        }
    }

    /// CSS class used by the web front end.
    pub fn color_class(self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "risk-very-low",
            RiskLevel::Low => "risk-low",
            RiskLevel::Medium => "risk-medium",
            RiskLevel::MediumHigh => "risk-medium-high",
            RiskLevel::High => "risk-high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Positive-class probability, unrounded
    pub probability: f64,
    /// probability × 100, rounded to one decimal
    pub risk_percentage: f64,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub indexes: MedicalIndexSet,
    pub input: ClinicalInput,
}

/// Score one input against the given model handle.
pub fn assess_risk(input: &ClinicalInput, model: &ModelHandle) -> Result<RiskAssessment, AssessmentError> {
    let model = model.model()?;
    input.validate()?;
    let indexes = compute_indexes(input.tg, input.glucose, input.hdl, input.bmi)?;
    let (_, probability) = model.predict(&indexes)?;

    let percentage = probability * 100.0;
    // Tier from the unrounded percentage; rounding is for display only.
    let risk_level = RiskLevel::from_percentage(percentage);

    Ok(RiskAssessment {
        probability,
        risk_percentage: round_to(percentage, 1),
        risk_level,
        recommendation: risk_level.recommendation().to_string(),
        indexes,
        input: *input,
    })
}

/// Round half away from zero to `decimals` places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_fall_into_upper_tier() {
        assert_eq!(RiskLevel::from_percentage(0.0), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_percentage(9.999), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_percentage(10.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_percentage(29.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_percentage(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_percentage(50.0), RiskLevel::MediumHigh);
        assert_eq!(RiskLevel::from_percentage(69.99), RiskLevel::MediumHigh);
        assert_eq!(RiskLevel::from_percentage(70.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_percentage(100.0), RiskLevel::High);
    }

    #[test]
    fn tiers_are_ordered() {
        let levels: Vec<_> = RiskLevel::THRESHOLDS.iter().map(|&(_, l)| l).collect();
        let mut sorted = levels.clone();
        sorted.sort();
        assert_eq!(levels, sorted);
        assert!(RiskLevel::VeryLow < RiskLevel::High);
    }

    #[test]
    fn labels_match_display() {
        assert_eq!(RiskLevel::MediumHigh.to_string(), "Medium-High Risk");
        assert_eq!(RiskLevel::VeryLow.color_class(), "risk-very-low");
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(42.04, 1), 42.0);
        assert_eq!(round_to(42.05001, 1), 42.1);
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(8.92272, 2), 8.92);
    }
}
