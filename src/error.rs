//! Error taxonomy. Validation and domain errors are user-correctable; model errors are not.

use std::path::PathBuf;
use thiserror::Error;

/// Missing, non-numeric or out-of-range request field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No data received")]
    EmptyPayload,
    #[error("Invalid JSON payload: {0}")]
    MalformedJson(String),
    #[error("Request body must be valid UTF-8")]
    InvalidUtf8,
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Field '{0}' must be a valid number")]
    NotNumeric(&'static str),
    #[error("Field '{0}' must be a finite number")]
    NotFinite(&'static str),
    #[error("Field '{field}' value {value} exceeds plausible limit {limit}")]
    Implausible {
        field: &'static str,
        value: f64,
        limit: f64,
    },
}

impl ValidationError {
    /// Name of the offending field, if the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(f) | Self::NotNumeric(f) | Self::NotFinite(f) => Some(f),
            Self::Implausible { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Input combination outside a formula's mathematical domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("HDL must exceed 1 for METS-IR calculation (got {0})")]
    HdlNotAboveOne(f64),
    #[error("SPISE must be positive")]
    NonPositiveSpise,
    #[error("Denominator in METS-IR calculation is zero")]
    ZeroMetsIrDenominator,
    #[error("{0} is not finite for these inputs")]
    NonFiniteIndex(&'static str),
}

/// Model unavailable, malformed bundle, or inference failure.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model not loaded: {0}")]
    Unavailable(String),
    #[error("failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model manifest: {0}")]
    InvalidManifest(String),
    #[error("model expects feature '{0}' which cannot be derived")]
    FeatureMismatch(String),
    #[error("model expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error("classifier returned invalid probability {0}")]
    InvalidProbability(f64),
}

impl From<ort::Error> for ModelError {
    fn from(e: ort::Error) -> Self {
        Self::Runtime(e.to_string())
    }
}

/// Any failure of a single risk assessment.
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AssessmentError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Domain(_) => "domain",
            Self::Model(_) => "model",
        }
    }

    /// True when the caller can fix the request; false for operator-side failures.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, Self::Model(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
