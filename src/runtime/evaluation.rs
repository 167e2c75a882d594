use crate::ast::{BinaryOp, Dialect, Expr, UnaryOp};
use crate::context::FormulaContext;
use crate::custom::FunctionRegistry;
use crate::error::Error;
use crate::parser::MAX_DEPTH;
use crate::runtime::function_dispatch::exec_builtin;
use crate::types::Value;
use std::cmp::Ordering;

/// Everything a formula can see while it is being reduced.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub context: &'a FormulaContext,
    pub registry: &'a FunctionRegistry,
    pub dialect: Dialect,
    /// How many expression levels above this one are being reduced.
    pub depth: usize,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a FormulaContext, registry: &'a FunctionRegistry, dialect: Dialect) -> Self {
        Self { context, registry, dialect, depth: 0 }
    }

    pub fn with_dialect(self, dialect: Dialect) -> Self {
        Self { dialect, ..self }
    }

    fn nested(self) -> Self {
        Self { depth: self.depth + 1, ..self }
    }
}

/// Evaluate a parsed formula body under its dialect's top-level rule.
///
/// Legacy formulas only compute when they contain a function call; around the calls
/// only numbers, parentheses and `+ - * /` are allowed.
pub fn eval_formula(expr: &Expr, scope: Scope<'_>) -> Result<Value, Error> {
    match scope.dialect {
        Dialect::Excel => eval(expr, scope),
        Dialect::Legacy => {
            if !expr.contains_call() {
                tracing::debug!("legacy formula without a function call evaluates to 0");
                return Ok(Value::Number(0.0));
            }
            check_legacy_shape(expr)?;
            eval(expr, scope)
        }
    }
}

fn check_legacy_shape(expr: &Expr) -> Result<(), Error> {
    match expr {
        Expr::Number(_) | Expr::Call { .. } => Ok(()),
        Expr::Unary(UnaryOp::Plus | UnaryOp::Minus, inner) => check_legacy_shape(inner),
        Expr::Binary(l, op, r) if op.is_legacy_arithmetic() => {
            check_legacy_shape(l)?;
            check_legacy_shape(r)
        }
        other => Err(Error::invalid(format!(
            "legacy formulas may only combine function calls with numbers and + - * /, found {}",
            describe(other)
        ))),
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::FieldRef(name) => format!("field reference '{}'", name),
        Expr::Str(_) => "a text literal".to_string(),
        Expr::Bool(_) => "a boolean literal".to_string(),
        Expr::Binary(_, op, _) => format!("operator {:?}", op),
        Expr::Unary(op, _) => format!("operator {:?}", op),
        _ => "an empty expression".to_string(),
    }
}

/// Reduce one expression. Trees taller than the parser would build are refused.
pub fn eval(expr: &Expr, scope: Scope<'_>) -> Result<Value, Error> {
    if scope.depth >= MAX_DEPTH {
        return Err(Error::NestingTooDeep);
    }
    let scope = scope.nested();
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Bool(b) => Ok(Value::Boolean(*b)),
        Expr::Empty => Ok(Value::Null),
        Expr::FieldRef(name) => Ok(scope.context.resolve_field(name)),
        Expr::Unary(op, e) => {
            let v = eval(e, scope)?;
            Ok(match op {
                UnaryOp::Plus => Value::Number(to_operand(&v)),
                UnaryOp::Minus => Value::Number(-to_operand(&v)),
                UnaryOp::Not => Value::Boolean(!v.truthy()),
            })
        }
        Expr::Binary(l, op, r) => {
            let a = eval(l, scope)?;
            let b = eval(r, scope)?;
            eval_binary(&a, *op, &b)
        }
        Expr::Call { name, args } => eval_call(name, args, scope),
    }
}

/// Arithmetic operand: non-numeric values become NaN, which later collapses to 0.
fn to_operand(v: &Value) -> f64 {
    v.coerce_number().unwrap_or(f64::NAN)
}

fn eval_binary(a: &Value, op: BinaryOp, b: &Value) -> Result<Value, Error> {
    Ok(match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            let an = to_operand(a);
            let bn = to_operand(b);
            match op {
                BinaryOp::Add => Value::Number(an + bn),
                BinaryOp::Sub => Value::Number(an - bn),
                BinaryOp::Mul => Value::Number(an * bn),
                BinaryOp::Div => {
                    if bn == 0.0 {
                        return Err(Error::DivisionByZero);
                    }
                    Value::Number(an / bn)
                }
                _ => Value::Number(an.powf(bn)),
            }
        }
        BinaryOp::Concat => Value::String(format!("{}{}", a.display(), b.display())),
        BinaryOp::Eq => Value::Boolean(compare(a, b) == Some(Ordering::Equal)),
        BinaryOp::Ne => Value::Boolean(compare(a, b) != Some(Ordering::Equal)),
        BinaryOp::Gt => Value::Boolean(compare(a, b) == Some(Ordering::Greater)),
        BinaryOp::Lt => Value::Boolean(compare(a, b) == Some(Ordering::Less)),
        BinaryOp::Ge => Value::Boolean(matches!(compare(a, b), Some(Ordering::Greater | Ordering::Equal))),
        BinaryOp::Le => Value::Boolean(matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal))),
    })
}

/// Numbers compare numerically when both sides coerce; anything else compares as text.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    let text_only = matches!(a, Value::String(_)) && matches!(b, Value::String(_));
    match (a.coerce_number(), b.coerce_number()) {
        (Some(x), Some(y)) if !text_only => x.partial_cmp(&y),
        _ => Some(a.display().cmp(&b.display())),
    }
}

fn eval_call(name: &str, args: &[Expr], scope: Scope<'_>) -> Result<Value, Error> {
    let mut values = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        values.push(eval_argument(name, i, arg, scope)?);
    }
    tracing::trace!(function = name, args = values.len(), "call");

    // Registered functions shadow built-ins of the same name
    if scope.registry.has_function(name) {
        return scope.registry.execute(name, values);
    }
    exec_builtin(name, &values, scope)
}

/// Arguments that name a field rather than reference its value.
///
/// `FIELD` takes a quoted or bare name in both dialects; legacy `SUM('q2','q3')` reads
/// quoted arguments as field names.
fn eval_argument(name: &str, index: usize, arg: &Expr, scope: Scope<'_>) -> Result<Value, Error> {
    match (name, arg) {
        ("FIELD", Expr::FieldRef(field)) if index == 0 => Ok(Value::String(field.clone())),
        ("SUM", Expr::Str(field)) if scope.dialect == Dialect::Legacy => {
            Ok(scope.context.resolve_field(field))
        }
        _ => eval(arg, scope),
    }
}
