use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Array(Vec<Value>),
    Boolean(bool),
    String(String),
    Null,
    /// Nested object from the form data, kept as serialized JSON.
    Json(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of a value, `None` when it is not numeric-coercible.
    ///
    /// Blank strings and null count as 0 and booleans as 1/0, matching how form data
    /// has always been coerced.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_nan() => None,
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Null => Some(0.0),
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Json(_) => None,
        }
    }

    pub fn number_or_zero(&self) -> f64 {
        self.coerce_number().unwrap_or(0.0)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            Value::Array(_) | Value::Json(_) => true,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Array(items) => items.iter().map(Value::display).collect::<Vec<_>>().join(","),
            Value::Json(s) => s.clone(),
        }
    }

    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            Json::Object(_) => Value::Json(json.to_string()),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
            Value::Boolean(b) => Json::Bool(*b),
            Value::String(s) => Json::String(s.clone()),
            Value::Null => Json::Null,
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Json(s) => serde_json::from_str(s).unwrap_or_else(|_| Json::String(s.clone())),
        }
    }
}

/// Parse text the way form inputs are read as numbers: surrounding whitespace ignored,
/// blank text is 0, `Infinity` is accepted but `inf`/`nan` spellings are not.
pub fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return Some(0.0);
    }
    let unsigned = t.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" {
        return Some(if t.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY });
    }
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| !n.is_nan())
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coercion() {
        assert_eq!(Value::String(" 42 ".into()).coerce_number(), Some(42.0));
        assert_eq!(Value::String("".into()).coerce_number(), Some(0.0));
        assert_eq!(Value::String("yes".into()).coerce_number(), None);
        assert_eq!(Value::String("inf".into()).coerce_number(), None);
        assert_eq!(Value::String("nan".into()).coerce_number(), None);
        assert_eq!(Value::Boolean(true).coerce_number(), Some(1.0));
        assert_eq!(Value::Null.coerce_number(), Some(0.0));
        assert_eq!(Value::Array(vec![]).coerce_number(), None);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::String(String::new()).truthy());
        assert!(Value::String("0".into()).truthy());
        assert!(!Value::Null.truthy());
    }

    #[test]
    fn display_formats_like_form_values() {
        assert_eq!(Value::Number(3.0).display(), "3");
        assert_eq!(Value::Number(-0.0).display(), "0");
        assert_eq!(Value::Number(87.5).display(), "87.5");
        assert_eq!(Value::Boolean(false).display(), "false");
        assert_eq!(
            Value::Array(vec![Value::Number(1.0), Value::String("a".into())]).display(),
            "1,a"
        );
    }

    #[test]
    fn json_conversion() {
        let j = serde_json::json!({"a": [1, "x", true, null], "b": {"c": 1}});
        match Value::from_json(&j["a"]) {
            Value::Array(items) => assert_eq!(items.len(), 4),
            other => panic!("expected array, got {:?}", other),
        }
        assert!(matches!(Value::from_json(&j["b"]), Value::Json(_)));
        assert_eq!(Value::Number(2.5).to_json(), serde_json::json!(2.5));
    }
}
