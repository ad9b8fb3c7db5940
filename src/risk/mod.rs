//! Risk tiers and the end-to-end assessment of one clinical input.

mod engine;

pub use engine::{assess_risk, round_to, RiskAssessment, RiskLevel};
