use crate::types::Value;

pub fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Visit every scalar in `args`, descending into arrays.
pub fn for_each_scalar<'a, F: FnMut(&'a Value)>(args: &'a [Value], f: &mut F) {
    for v in args {
        match v {
            Value::Array(items) => for_each_scalar(items, f),
            other => f(other),
        }
    }
}

/// Numeric-coercible scalars in argument order; everything else is skipped.
pub fn numeric_values(args: &[Value]) -> Vec<f64> {
    let mut nums = Vec::new();
    for_each_scalar(args, &mut |v| {
        if let Some(n) = v.coerce_number() {
            nums.push(n);
        }
    });
    nums
}

/// An argument viewed as a list: arrays as-is, a missing argument as empty, scalars as one item.
pub fn as_list(v: Option<&Value>) -> Vec<Value> {
    match v {
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

pub fn arg_number(args: &[Value], i: usize) -> f64 {
    args.get(i).map(Value::number_or_zero).unwrap_or(0.0)
}

/// Half-up rounding to `decimals` places (negative rounds left of the point).
pub fn round_half_up(n: f64, decimals: i32) -> f64 {
    if decimals < 0 {
        let factor = 10f64.powi(-decimals);
        return (n / factor + 0.5).floor() * factor;
    }
    let factor = 10f64.powi(decimals);
    (n * factor + 0.5).floor() / factor
}

/// Criteria match used by COUNTIF: equal text, or equal numbers when both sides are numeric.
pub fn matches_criteria(v: &Value, criteria: &Value) -> bool {
    if v.display() == criteria.display() {
        return true;
    }
    if is_blank(v) || is_blank(criteria) {
        return false;
    }
    match (v.coerce_number(), criteria.coerce_number()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
