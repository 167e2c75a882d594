//! Recomputing calculated fields of a form definition.
//!
//! Form metadata marks a field as calculated with `"calculated": true` and carries its
//! formula as a plain string. Results are written back into the calculator's context
//! so later fields can build on earlier ones.

use crate::calculator::FormulaCalculator;
use crate::error::Error;
use crate::result::FormulaResult;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedField {
    pub name: String,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub calculated: bool,
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
}

fn default_auto_refresh() -> bool {
    true
}

impl CalculatedField {
    pub fn new<N: Into<String>, F: Into<String>>(name: N, formula: F) -> Self {
        Self {
            name: name.into(),
            formula: Some(formula.into()),
            calculated: true,
            auto_refresh: true,
        }
    }

    fn is_computable(&self) -> bool {
        self.calculated && self.formula.as_deref().map_or(false, |f| !f.trim().is_empty())
    }
}

/// Pull calculated fields out of a form definition.
///
/// Accepts either a bare array of field objects or an object with a `fields` array;
/// entries without a `name` are skipped.
pub fn fields_from_definition(definition: &Json) -> Result<Vec<CalculatedField>, Error> {
    let list = match definition {
        Json::Array(items) => items,
        Json::Object(map) => match map.get("fields") {
            Some(Json::Array(items)) => items,
            _ => return Err(Error::InvalidContext("form definition has no `fields` array".into())),
        },
        _ => return Err(Error::InvalidContext("form definition must be an array or an object".into())),
    };
    let fields = list
        .iter()
        .filter(|f| f.get("name").map_or(false, Json::is_string))
        .map(|f| {
            serde_json::from_value::<CalculatedField>(f.clone())
                .map_err(|e| Error::InvalidContext(format!("bad field definition: {}", e)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fields.into_iter().filter(|f| f.calculated).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutcome {
    pub name: String,
    pub result: FormulaResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecalcReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl RecalcReport {
    pub fn get(&self, name: &str) -> Option<&FormulaResult> {
        self.outcomes.iter().find(|o| o.name == name).map(|o| &o.result)
    }

    pub fn errors(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_error())
    }
}

/// Recompute every auto-refreshing calculated field, in declaration order.
pub fn recalculate(calc: &mut FormulaCalculator, fields: &[CalculatedField]) -> RecalcReport {
    run(calc, fields, false)
}

/// Recompute every calculated field, including those with `autoRefresh: false`.
pub fn recalculate_all(calc: &mut FormulaCalculator, fields: &[CalculatedField]) -> RecalcReport {
    run(calc, fields, true)
}

fn run(calc: &mut FormulaCalculator, fields: &[CalculatedField], include_manual: bool) -> RecalcReport {
    let mut report = RecalcReport::default();
    for field in fields {
        if !field.is_computable() || !(field.auto_refresh || include_manual) {
            continue;
        }
        let result = calc.evaluate_opt(field.formula.as_deref());
        if let Some(err) = &result.error {
            tracing::debug!(field = %field.name, error = %err, "calculated field falls back to 0");
        }
        // Errors carry value 0, which is what the field displays
        calc.context_mut().insert(field.name.clone(), result.value.to_json());
        report.outcomes.push(FieldOutcome { name: field.name.clone(), result });
    }
    report
}
