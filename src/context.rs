use crate::error::Error;
use crate::types::Value;
use serde_json::{Map, Value as Json};

/// Key under which some forms nest their real field map.
pub const FORM_DATA_KEY: &str = "formData";

/// Current form field values that formulas resolve against.
///
/// Accepts both a flat `{ "q1": "yes", ... }` map and one wrapped as
/// `{ "formData": { "q1": "yes", ... } }`; lookups see through the wrapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaContext {
    root: Map<String, Json>,
}

impl FormulaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: Map<String, Json>) -> Self {
        Self { root }
    }

    pub fn from_value(json: Json) -> Result<Self, Error> {
        match json {
            Json::Object(root) => Ok(Self { root }),
            _ => Err(Error::InvalidContext("JSON must be an object with key-value pairs".into())),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let value: Json = serde_json::from_str(json)
            .map_err(|e| Error::InvalidContext(format!("Invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// The effective field map: `formData` when present, otherwise the root.
    pub fn fields(&self) -> &Map<String, Json> {
        match self.root.get(FORM_DATA_KEY) {
            Some(Json::Object(inner)) => inner,
            _ => &self.root,
        }
    }

    /// Set a field, writing inside `formData` when the context is nested.
    pub fn insert<K: Into<String>>(&mut self, name: K, value: Json) {
        if let Some(Json::Object(inner)) = self.root.get_mut(FORM_DATA_KEY) {
            inner.insert(name.into(), value);
            return;
        }
        self.root.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Json> {
        self.fields().get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Resolve a field reference for use in a formula.
    ///
    /// Missing fields are 0 so arithmetic over sparse form data never breaks;
    /// numeric-coercible values come back as numbers and everything else as-is.
    pub fn resolve_field(&self, name: &str) -> Value {
        match self.get(name) {
            None => Value::Number(0.0),
            Some(raw) => {
                let value = Value::from_json(raw);
                match value {
                    Value::Array(_) | Value::Json(_) => value,
                    _ => match value.coerce_number() {
                        Some(n) => Value::Number(n),
                        None => value,
                    },
                }
            }
        }
    }

    /// All field values in map order, used when a range expands to the whole form.
    pub fn values(&self) -> Vec<Value> {
        self.fields().values().map(Value::from_json).collect()
    }

    pub fn into_json(self) -> Json {
        Json::Object(self.root)
    }
}

impl From<Map<String, Json>> for FormulaContext {
    fn from(root: Map<String, Json>) -> Self {
        Self { root }
    }
}

impl FromIterator<(String, Json)> for FormulaContext {
    fn from_iter<I: IntoIterator<Item = (String, Json)>>(iter: I) -> Self {
        Self { root: iter.into_iter().collect() }
    }
}
