use formcalc::{calculate, FormulaContext, FormulaResult, ResultType, ResultValue};
use serde_json::json;

fn approxv(r: FormulaResult, b: f64) -> bool {
    matches!(r.value, ResultValue::Number(a) if (a - b).abs() < 1e-9) && r.kind == ResultType::Number
}

fn eval(formula: &str) -> FormulaResult {
    calculate(formula, &FormulaContext::new())
}

fn eval_with(formula: &str, ctx: serde_json::Value) -> FormulaResult {
    calculate(formula, &FormulaContext::from_value(ctx).unwrap())
}

#[test]
fn precedence_and_parentheses() {
    assert!(approxv(eval("=2 + 3 * 4"), 14.0));
    assert!(approxv(eval("=(2 + 3) * 4"), 20.0));
    assert!(approxv(eval("=10 - 4 - 3"), 3.0));
    assert!(approxv(eval("=12 / 4 / 3"), 1.0));
}

#[test]
fn exponent_right_associative() {
    assert!(approxv(eval("=2 ^ 3 ^ 2"), 512.0));
}

#[test]
fn unary_and_equals_prefix() {
    assert!(approxv(eval("=-3 ^ 2"), -9.0));
    assert!(approxv(eval("=(-3) ^ 2"), 9.0));
    assert!(approxv(eval("= 10 + 20 * 3"), 70.0));
    assert!(approxv(eval("=--4"), 4.0));
}

#[test]
fn decimals() {
    assert!(approxv(eval("=.5 + 1.25"), 1.75));
    assert!(approxv(eval("=1e3 / 4"), 250.0));
}

#[test]
fn fields_in_arithmetic() {
    let ctx = json!({"price": "19.99", "quantity": 3, "blank": ""});
    assert!(approxv(eval_with("=price * quantity", ctx.clone()), 59.97));
    assert!(approxv(eval_with("=missing + 1", ctx.clone()), 1.0));
    assert!(approxv(eval_with("=blank + 2", ctx), 2.0));
}

#[test]
fn non_numeric_operands_collapse_to_zero() {
    let r = eval_with("=q1 * 2", json!({"q1": "yes"}));
    assert_eq!(r, FormulaResult::number(0.0));
}

#[test]
fn division_by_zero_is_an_error_not_infinity() {
    for formula in ["=1/0", "=5/(2-2)", "=x/y"] {
        let r = eval_with(formula, json!({"x": 3, "y": 0}));
        assert_eq!(r.kind, ResultType::Error, "{}", formula);
        assert_eq!(r.value, ResultValue::Number(0.0));
        assert_eq!(r.error.as_deref(), Some("Division by zero"));
    }
}

#[test]
fn math_builtins() {
    assert!(approxv(eval("=AVERAGE(1, 2, 3, 4)"), 2.5));
    assert!(approxv(eval("=AVG(2, 4, 6)"), 4.0));
    assert!(approxv(eval("=MIN(3, 5, 1, 9)"), 1.0));
    assert!(approxv(eval("=MAX(3, 5, 1, 9)"), 9.0));
    assert!(approxv(eval("=ROUND(3.14159, 2)"), 3.14));
    assert!(approxv(eval("=ROUND(2.5)"), 3.0));
    assert!(approxv(eval("=ROUND(-2.5)"), -2.0));
    assert!(approxv(eval("=ABS(-10)"), 10.0));
    assert!(approxv(eval("=SQRT(9)"), 3.0));
    assert!(approxv(eval("=POWER(2, 8)"), 256.0));
    assert!(approxv(eval("=POW(2, 3)"), 8.0));
}

#[test]
fn nested_calls_and_operators() {
    let ctx = json!({"a": 4, "b": 6});
    assert!(approxv(eval_with("=ROUND(SUM(a, b) / 3, 1) * 2", ctx), 6.6));
}

#[test]
fn negative_zero_is_plain_zero() {
    for formula in ["=SUMPRODUCT(1)", "=-0", "=0 * -1"] {
        let r = eval(formula);
        assert!(matches!(r.value, ResultValue::Number(n) if n == 0.0 && n.is_sign_positive()), "{}", formula);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"value":0.0,"type":"number"}"#);
    }
}

#[test]
fn deep_parentheses_are_an_error_not_a_crash() {
    let nested = |depth: usize| format!("={}1{}", "(".repeat(depth), ")".repeat(depth));
    assert!(approxv(eval(&nested(50)), 1.0));
    assert_eq!(eval(&nested(200)).kind, ResultType::Error);
    assert_eq!(eval(&nested(200_000)).kind, ResultType::Error);
}
