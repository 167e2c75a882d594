pub mod ast;
pub mod batch;
pub mod calculator;
pub mod context;
pub mod custom;
pub mod error;
pub mod form;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod runtime;
pub mod types;

pub use ast::{BinaryOp, Dialect, Expr, UnaryOp};
pub use batch::{recompute_batch, BatchOutcome};
pub use calculator::{validate_formula, FormulaCalculator};
pub use context::FormulaContext;
pub use custom::{CustomFunction, FnFunction, FunctionRegistry};
pub use error::{Error, ErrorKind};
pub use form::{fields_from_definition, recalculate, recalculate_all, CalculatedField, FieldOutcome, RecalcReport};
pub use parser::{parse_arguments, parse_formula};
pub use result::{FormulaResult, ResultType, ResultValue, ValidationResult};
pub use types::Value;

/// Parse a formula of either dialect into an AST.
///
/// A leading `=` selects the Excel dialect; the returned [`Dialect`] says which one applied.
pub fn parse(input: &str) -> Result<(Dialect, Expr), Error> {
    parse_formula(input)
}

/// Evaluate a formula against `context` with built-in functions only.
pub fn calculate(formula: &str, context: &FormulaContext) -> FormulaResult {
    FormulaCalculator::with_context(context.clone()).evaluate(formula)
}

/// Evaluate with field values provided as a JSON string.
/// JSON format: {"q1": "yes", "hours": 42, "formData": {...}}
/// Nested `formData` objects are looked through.
pub fn evaluate_with_json(formula: &str, json_vars: &str) -> Result<FormulaResult, Error> {
    let context = FormulaContext::from_json_str(json_vars)?;
    Ok(calculate(formula, &context))
}
