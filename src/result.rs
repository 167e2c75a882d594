use crate::error::Error;
use crate::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Number,
    String,
    Boolean,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Boolean(bool),
    String(String),
}

impl ResultValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResultValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ResultValue::Number(n) => serde_json::json!(n),
            ResultValue::Boolean(b) => serde_json::Value::Bool(*b),
            ResultValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Outcome of evaluating one formula.
///
/// `kind` is `Error` exactly when `error` is set, and `value` is always present
/// (0 on error) so a calculated field can always display something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaResult {
    pub value: ResultValue,
    #[serde(rename = "type")]
    pub kind: ResultType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormulaResult {
    pub fn number(n: f64) -> Self {
        // NaN, infinities and negative zero never reach the caller as a valid number
        let n = if n.is_finite() && n != 0.0 { n } else { 0.0 };
        Self { value: ResultValue::Number(n), kind: ResultType::Number, error: None }
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        Self { value: ResultValue::String(s.into()), kind: ResultType::String, error: None }
    }

    pub fn boolean(b: bool) -> Self {
        Self { value: ResultValue::Boolean(b), kind: ResultType::Boolean, error: None }
    }

    pub fn error<M: Into<String>>(message: M) -> Self {
        Self {
            value: ResultValue::Number(0.0),
            kind: ResultType::Error,
            error: Some(message.into()),
        }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => Self::number(n),
            Value::Boolean(b) => Self::boolean(b),
            Value::Null => Self::number(0.0),
            Value::String(s) => Self::string(s),
            other @ (Value::Array(_) | Value::Json(_)) => Self::string(other.display()),
        }
    }

    pub fn from_outcome(outcome: Result<Value, Error>) -> Self {
        match outcome {
            Ok(v) => Self::from_value(v),
            Err(e) => Self::error(e.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResultType::Error
    }

    /// Numeric view for callers that need a safe fallback: text and errors read as 0.
    pub fn as_number(&self) -> f64 {
        match &self.value {
            ResultValue::Number(n) => *n,
            ResultValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ResultValue::String(_) => 0.0,
        }
    }
}

/// Advisory pre-flight check of a formula before it is stored in form metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn invalid<M: Into<String>>(message: M) -> Self {
        Self { is_valid: false, error: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_type_tag() {
        let ok = serde_json::to_value(FormulaResult::number(87.5)).unwrap();
        assert_eq!(ok, serde_json::json!({"value": 87.5, "type": "number"}));

        let err = serde_json::to_value(FormulaResult::error("Division by zero")).unwrap();
        assert_eq!(err, serde_json::json!({"value": 0.0, "type": "error", "error": "Division by zero"}));
    }

    #[test]
    fn non_finite_numbers_collapse_to_zero() {
        assert_eq!(FormulaResult::number(f64::NAN), FormulaResult::number(0.0));
        assert_eq!(FormulaResult::number(f64::INFINITY).value, ResultValue::Number(0.0));
    }

    #[test]
    fn negative_zero_is_reported_as_zero() {
        let r = FormulaResult::number(-0.0);
        assert!(matches!(r.value, ResultValue::Number(n) if n == 0.0 && n.is_sign_positive()));
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"value":0.0,"type":"number"}"#);
    }

    #[test]
    fn arrays_render_as_text() {
        let r = FormulaResult::from_value(Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]));
        assert_eq!(r, FormulaResult::string("1,2"));
    }

    #[test]
    fn validation_serializes_camel_case() {
        let v = serde_json::to_value(ValidationResult::invalid("nope")).unwrap();
        assert_eq!(v, serde_json::json!({"isValid": false, "error": "nope"}));
    }
}
