//! Request payload → [`ClinicalInput`]: presence, numeric convertibility, finiteness.

use crate::config::PlausibilityLimits;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Required payload keys, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 4] = ["tg", "glucose", "hdl", "bmi"];

/// Four raw clinical values. Units: mg/dL, mg/dL, mg/dL, kg/m².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    pub tg: f64,
    pub glucose: f64,
    pub hdl: f64,
    pub bmi: f64,
}

impl ClinicalInput {
    pub fn new(tg: f64, glucose: f64, hdl: f64, bmi: f64) -> Self {
        Self {
            tg,
            glucose,
            hdl,
            bmi,
        }
    }

    /// Parse a JSON request object. Values may be numbers or numeric strings.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let obj = match payload {
            Value::Null => return Err(ValidationError::EmptyPayload),
            Value::Object(map) if map.is_empty() => return Err(ValidationError::EmptyPayload),
            Value::Object(map) => map,
            _ => return Err(ValidationError::NotAnObject),
        };

        let mut values = [0.0f64; 4];
        for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = parse_field(field, obj.get(field))?;
        }
        let [tg, glucose, hdl, bmi] = values;
        let input = Self::new(tg, glucose, hdl, bmi);
        input.validate()?;
        Ok(input)
    }

    /// Every field must be a finite number. Sign and domain checks belong to index computation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.fields() {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite(field));
            }
        }
        Ok(())
    }

    /// Values above the configured upper limits.
    pub fn plausibility_issues(&self, limits: &PlausibilityLimits) -> Vec<ValidationError> {
        let limits = [limits.tg, limits.glucose, limits.hdl, limits.bmi];
        self.fields()
            .into_iter()
            .zip(limits)
            .filter(|((_, value), limit)| value > limit)
            .map(|((field, value), limit)| ValidationError::Implausible {
                field,
                value,
                limit,
            })
            .collect()
    }

    fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("tg", self.tg),
            ("glucose", self.glucose),
            ("hdl", self.hdl),
            ("bmi", self.bmi),
        ]
    }
}

fn parse_field(field: &'static str, value: Option<&Value>) -> Result<f64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::NotNumeric(field)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(ValidationError::MissingField(field));
            }
            let v: f64 = s.parse().map_err(|_| ValidationError::NotNumeric(field))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(ValidationError::NotFinite(field))
            }
        }
        Some(_) => Err(ValidationError::NotNumeric(field)),
    }
}
