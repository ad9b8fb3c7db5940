//! Request boundary: JSON payload in, `{success, ...}` JSON out. No error escapes as a fault.

use crate::config::InputConfig;
use crate::error::{AssessmentError, ValidationError};
use crate::input::ClinicalInput;
use crate::logging::{AuditRecord, StructuredLogger};
use crate::model::{ModelHandle, ModelSlot};
use crate::risk::{assess_risk, round_to, RiskAssessment};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{error, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Success(SuccessBody),
    Failure(FailureBody),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessBody {
    pub success: bool,
    pub risk_percentage: f64,
    pub risk_level: String,
    pub recommendation: String,
    pub probability: f64,
    pub color_class: String,
    pub calculated_indexes: CalculatedIndexes,
    pub input_values: InputValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedIndexes {
    #[serde(rename = "SPISE")]
    pub spise: f64,
    #[serde(rename = "METS_IR")]
    pub mets_ir: f64,
    #[serde(rename = "TyG")]
    pub tyg: f64,
    #[serde(rename = "TG_HDL")]
    pub tg_hdl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValues {
    #[serde(rename = "TG")]
    pub tg: f64,
    #[serde(rename = "Glucose")]
    pub glucose: f64,
    #[serde(rename = "HDL")]
    pub hdl: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
}

impl PredictResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(error: &AssessmentError) -> Self {
        Self::Failure(FailureBody {
            success: false,
            error: error.to_string(),
        })
    }
}

impl From<&RiskAssessment> for PredictResponse {
    fn from(a: &RiskAssessment) -> Self {
        Self::Success(SuccessBody {
            success: true,
            risk_percentage: a.risk_percentage,
            risk_level: a.risk_level.label().to_string(),
            recommendation: a.recommendation.clone(),
            probability: round_to(a.probability, 3),
            color_class: a.risk_level.color_class().to_string(),
            calculated_indexes: CalculatedIndexes {
                spise: round_to(a.indexes.spise, 2),
                mets_ir: round_to(a.indexes.mets_ir, 2),
                tyg: round_to(a.indexes.tyg, 2),
                tg_hdl: round_to(a.indexes.tg_hdl, 2),
            },
            input_values: InputValues {
                tg: a.input.tg,
                glucose: a.input.glucose,
                hdl: a.input.hdl,
                bmi: a.input.bmi,
            },
        })
    }
}

impl From<Result<RiskAssessment, AssessmentError>> for PredictResponse {
    fn from(r: Result<RiskAssessment, AssessmentError>) -> Self {
        match r {
            Ok(a) => Self::from(&a),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Parse, apply the plausibility policy, and assess. An unavailable model rejects before parsing.
pub fn evaluate(
    payload: &Value,
    model: &ModelHandle,
    policy: &InputConfig,
) -> Result<RiskAssessment, AssessmentError> {
    model.model()?;
    let input = ClinicalInput::from_json(payload)?;

    let issues = input.plausibility_issues(&policy.limits);
    if policy.reject_implausible {
        if let Some(first) = issues.into_iter().next() {
            return Err(first.into());
        }
    } else {
        for issue in &issues {
            warn!(field = issue.field().unwrap_or_default(), "{issue}");
        }
    }

    assess_risk(&input, model)
}

/// [`evaluate`] on a raw request body.
pub fn evaluate_str(
    body: &str,
    model: &ModelHandle,
    policy: &InputConfig,
) -> Result<RiskAssessment, AssessmentError> {
    model.model()?;
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyPayload.into());
    }
    let payload: Value =
        serde_json::from_str(body).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    evaluate(&payload, model, policy)
}

/// [`evaluate_str`] on raw bytes; a body that is not UTF-8 is a validation failure.
pub fn evaluate_bytes(
    body: &[u8],
    model: &ModelHandle,
    policy: &InputConfig,
) -> Result<RiskAssessment, AssessmentError> {
    model.model()?;
    let body = std::str::from_utf8(body).map_err(|_| ValidationError::InvalidUtf8)?;
    evaluate_str(body, model, policy)
}

pub fn predict(payload: &Value, model: &ModelHandle, policy: &InputConfig) -> PredictResponse {
    evaluate(payload, model, policy).into()
}

pub fn predict_str(body: &str, model: &ModelHandle, policy: &InputConfig) -> PredictResponse {
    evaluate_str(body, model, policy).into()
}

/// Serves requests against whatever model the slot currently holds.
pub struct PredictionService {
    slot: Arc<ModelSlot>,
    policy: InputConfig,
    audit: bool,
}

impl PredictionService {
    pub fn new(slot: Arc<ModelSlot>, policy: InputConfig, audit: bool) -> Self {
        Self {
            slot,
            policy,
            audit,
        }
    }

    /// Handle one request body. Each call takes its own model snapshot.
    pub fn handle(&self, body: &str) -> PredictResponse {
        self.handle_bytes(body.as_bytes())
    }

    /// Like [`handle`](Self::handle), for bodies not yet known to be UTF-8.
    pub fn handle_bytes(&self, body: &[u8]) -> PredictResponse {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("predict", request_id = %request_id);
        let _enter = span.enter();

        let model = self.slot.snapshot();
        let result = evaluate_bytes(body, &model, &self.policy);

        if let Err(e) = &result {
            if e.is_user_correctable() {
                warn!(kind = e.kind(), error = %e, "prediction rejected");
            } else {
                error!(kind = e.kind(), error = %e, "prediction failed");
            }
        }
        if self.audit {
            self.write_audit(&request_id, &model, &result);
        }
        result.into()
    }

    /// Answer one JSON line per non-blank input line until EOF. Returns the number answered.
    ///
    /// Only I/O failures end the loop; a bad request line gets a failure response.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> std::io::Result<u64> {
        let mut buf = Vec::new();
        let mut answered = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(answered);
            }
            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let response = self.handle_bytes(&buf);
            serde_json::to_writer(&mut writer, &response)?;
            writeln!(writer)?;
            writer.flush()?;
            answered += 1;
        }
    }

    fn write_audit(
        &self,
        request_id: &str,
        model: &ModelHandle,
        result: &Result<RiskAssessment, AssessmentError>,
    ) {
        let error_text = result.as_ref().err().map(|e| e.to_string());
        let record = AuditRecord {
            ts: Utc::now().to_rfc3339(),
            request_id,
            outcome: if result.is_ok() { "success" } else { "error" },
            model_version: model.model().ok().map(|m| m.version()),
            probability: result.as_ref().ok().map(|a| a.probability),
            risk_level: result.as_ref().ok().map(|a| a.risk_level.label()),
            error_kind: result.as_ref().err().map(|e| e.kind()),
            error: error_text.as_deref(),
        };
        if let Err(e) = StructuredLogger::emit_json(&record, &mut std::io::stderr().lock()) {
            warn!(error = %e, "audit write failed");
        }
    }
}
