use crate::error::Error;
use crate::parser::Parser;
use crate::runtime::evaluation::{eval, Scope};
use crate::types::Value;

pub fn exec_logical(name: &str, args: &[Value], scope: Scope<'_>) -> Result<Value, Error> {
    match name {
        "IF" => {
            let cond = match args.first() {
                Some(Value::String(text)) => reduce_condition(text, scope),
                Some(v) => v.truthy(),
                None => false,
            };
            if cond {
                Ok(args.get(1).cloned().unwrap_or(Value::Boolean(true)))
            } else {
                Ok(args.get(2).cloned().unwrap_or(Value::Boolean(false)))
            }
        }
        "AND" => Ok(Value::Boolean(args.iter().all(Value::truthy))),
        "OR" => Ok(Value::Boolean(args.iter().any(Value::truthy))),
        "NOT" => Ok(Value::Boolean(!args.first().map(Value::truthy).unwrap_or(false))),
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

/// Reduce a text condition such as `"q2 > 2"` to a boolean.
///
/// The text is parsed with the formula grammar and reduced in the dialect of the
/// enclosing formula, so `COUNT('yes')` inside a legacy `IF` still counts answers. Field
/// references resolve against the context (missing fields are 0). Text that does not
/// parse or fails to evaluate is false.
fn reduce_condition(text: &str, scope: Scope<'_>) -> bool {
    let parsed = Parser::new(text).and_then(|mut p| p.parse());
    let reduced = parsed.and_then(|expr| eval(&expr, scope));
    match reduced {
        Ok(v) => v.truthy(),
        Err(e) => {
            tracing::debug!(condition = text, error = %e, "IF condition did not reduce; treating as false");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Dialect;
    use crate::context::FormulaContext;
    use crate::custom::FunctionRegistry;
    use serde_json::json;

    fn with_scope<R>(ctx: serde_json::Value, f: impl FnOnce(Scope<'_>) -> R) -> R {
        let context = FormulaContext::from_value(ctx).unwrap();
        let registry = FunctionRegistry::new();
        f(Scope::new(&context, &registry, Dialect::Excel))
    }

    fn s(x: &str) -> Value {
        Value::String(x.into())
    }

    #[test]
    fn if_with_text_condition_resolves_fields() {
        with_scope(json!({"q2": 3}), |scope| {
            let args = [s("q2 > 2"), s("High"), s("Low")];
            assert_eq!(exec_logical("IF", &args, scope).unwrap(), s("High"));
            let args = [s("missing > 2"), s("High"), s("Low")];
            assert_eq!(exec_logical("IF", &args, scope).unwrap(), s("Low"));
        });
    }

    #[test]
    fn text_condition_follows_enclosing_dialect() {
        let context = FormulaContext::from_value(json!({"q1": "yes", "q2": "yes"})).unwrap();
        let registry = FunctionRegistry::new();
        let args = [s("COUNT('yes') > 1"), s("many"), s("few")];

        let legacy = Scope::new(&context, &registry, Dialect::Legacy);
        assert_eq!(exec_logical("IF", &args, legacy).unwrap(), s("many"));
        assert_eq!(exec_logical("IF", &args, legacy.with_dialect(Dialect::Excel)).unwrap(), s("few"));
    }

    #[test]
    fn if_defaults_false_branch() {
        with_scope(json!({}), |scope| {
            assert_eq!(
                exec_logical("IF", &[Value::Number(0.0), s("x")], scope).unwrap(),
                Value::Boolean(false)
            );
            assert_eq!(exec_logical("IF", &[s("(("), s("x")], scope).unwrap(), Value::Boolean(false));
        });
    }

    #[test]
    fn boolean_combinators() {
        with_scope(json!({}), |scope| {
            let t = Value::Boolean(true);
            let zero = Value::Number(0.0);
            assert_eq!(exec_logical("AND", &[t.clone(), Value::Number(2.0)], scope).unwrap(), t);
            assert_eq!(exec_logical("AND", &[t.clone(), zero.clone()], scope).unwrap(), Value::Boolean(false));
            assert_eq!(exec_logical("OR", &[zero.clone(), s("a")], scope).unwrap(), t);
            assert_eq!(exec_logical("NOT", &[zero], scope).unwrap(), t);
            assert_eq!(exec_logical("NOT", &[], scope).unwrap(), t);
        });
    }
}
