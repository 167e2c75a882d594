//! Form-data functions: field lookup and counting answers across the whole form.

use crate::error::Error;
use crate::runtime::evaluation::Scope;
use crate::types::Value;

pub fn exec_form(name: &str, args: &[Value], scope: Scope<'_>) -> Result<Value, Error> {
    match name {
        "FIELD" => {
            let field = match args.first() {
                Some(v) => strip_quotes(&v.display()).to_string(),
                None => return Ok(Value::Number(0.0)),
            };
            Ok(scope.context.resolve_field(&field))
        }
        // Only reached for legacy formulas; `=COUNT(...)` counts its arguments instead
        "COUNT" => Ok(count_matching(args, scope, true)),
        "COUNT_IGNORE_CASE" => Ok(count_matching(args, scope, false)),
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for q in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// `COUNT(value [, pattern])`: form fields whose value equals `value`, optionally only
/// fields whose name contains `pattern`.
fn count_matching(args: &[Value], scope: Scope<'_>, case_sensitive: bool) -> Value {
    let target = args.first().cloned().unwrap_or(Value::Null);
    let pattern = args.get(1).map(Value::display).filter(|p| !p.is_empty());
    let count = scope
        .context
        .fields()
        .iter()
        .filter(|(key, _)| pattern.as_deref().map_or(true, |p| key.contains(p)))
        .filter(|(_, raw)| answer_equals(&Value::from_json(raw), &target, case_sensitive))
        .count();
    Value::Number(count as f64)
}

fn answer_equals(field: &Value, target: &Value, case_sensitive: bool) -> bool {
    match (field, target) {
        (Value::String(a), Value::String(b)) if case_sensitive => a == b,
        (Value::String(a), Value::String(b)) => a.to_lowercase() == b.to_lowercase(),
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}
