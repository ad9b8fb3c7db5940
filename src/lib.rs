//! MASLD risk scoring core.
//!
//! Modular structure:
//! - [`input`] — Request payload parsing and plausibility checks
//! - [`features`] — Clinical indices (TyG, SPISE, METS-IR, TG/HDL) and derived model features
//! - [`model`] — Model bundle loading, classifiers, present/absent model handle
//! - [`risk`] — Probability → risk tier, end-to-end assessment
//! - [`service`] — Request boundary and response shapes
//! - [`logging`] — Structured JSON logging and audit lines

pub mod config;
pub mod error;
pub mod input;
pub mod features;
pub mod model;
pub mod risk;
pub mod service;
pub mod logging;

pub use config::ServiceConfig;
pub use error::{AssessmentError, DomainError, ModelError, ValidationError};
pub use input::ClinicalInput;
pub use features::{compute_indexes, FeatureBuilder, FeatureVector, MedicalIndexSet};
pub use model::{Classifier, LoadedModel, ModelHandle, ModelSlot};
pub use risk::{assess_risk, RiskAssessment, RiskLevel};
pub use service::{PredictResponse, PredictionService};
pub use logging::StructuredLogger;
