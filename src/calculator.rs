use crate::ast::{Dialect, Expr};
use crate::context::FormulaContext;
use crate::custom::{CustomFunction, FunctionRegistry};
use crate::error::Error;
use crate::lexer::{Lexer, Token};
use crate::parser::{parse_formula, recover_call};
use crate::result::{FormulaResult, ValidationResult};
use crate::runtime::{builtin_function_names, eval_formula, has_builtin_function, Scope};
use crate::types::Value;

/// Formula engine owned by one form (or one batch job).
///
/// Holds the current field values and any application-registered functions. Nothing is
/// shared between instances; clone one per concurrent flow.
#[derive(Debug, Clone, Default)]
pub struct FormulaCalculator {
    context: FormulaContext,
    registry: FunctionRegistry,
}

impl FormulaCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: FormulaContext) -> Self {
        Self { context, registry: FunctionRegistry::new() }
    }

    /// Replace the field values formulas resolve against.
    pub fn set_context(&mut self, context: FormulaContext) {
        self.context = context;
    }

    pub fn context(&self) -> &FormulaContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut FormulaContext {
        &mut self.context
    }

    pub fn into_context(self) -> FormulaContext {
        self.context
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Register a variadic function under `name` (stored upper-cased).
    ///
    /// A registered function replaces any earlier registration and shadows a built-in of
    /// the same name.
    pub fn register_function<N, F>(&mut self, name: N, func: F) -> Result<(), Error>
    where
        N: Into<String>,
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.registry.register_fn(name, func)
    }

    /// Register a function with arity limits, see [`CustomFunction`].
    pub fn register_custom(&mut self, function: Box<dyn CustomFunction>) -> Result<(), Error> {
        self.registry.register(function)
    }

    pub fn unregister_function(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    /// True for built-ins and registered functions alike.
    pub fn has_function(&self, name: &str) -> bool {
        self.registry.has_function(name) || has_builtin_function(name)
    }

    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = builtin_function_names().into_iter().map(String::from).collect();
        names.extend(self.registry.list_functions().into_iter().map(String::from));
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Evaluate a formula against the current context.
    ///
    /// Never fails: problems come back as a result of type `error` with value 0, and an
    /// empty formula is simply 0.
    pub fn evaluate(&self, formula: &str) -> FormulaResult {
        let trimmed = formula.trim();
        if trimmed.is_empty() {
            return FormulaResult::number(0.0);
        }
        match parse_formula(trimmed).or_else(|e| recover_legacy_call(trimmed, e)) {
            Ok((dialect, expr)) => {
                tracing::debug!(formula = trimmed, ?dialect, "evaluating formula");
                let outcome = eval_formula(&expr, Scope::new(&self.context, &self.registry, dialect));
                if let Err(e) = &outcome {
                    tracing::debug!(formula = trimmed, error = %e, "formula evaluated to an error");
                }
                FormulaResult::from_outcome(outcome)
            }
            Err(e) => degrade_parse_failure(trimmed, e),
        }
    }

    /// [`evaluate`](Self::evaluate) for formulas that may be absent; `None` is 0.
    pub fn evaluate_opt(&self, formula: Option<&str>) -> FormulaResult {
        match formula {
            Some(f) => self.evaluate(f),
            None => FormulaResult::number(0.0),
        }
    }

    /// Set the context, then evaluate.
    pub fn evaluate_with_context(&mut self, formula: &str, context: FormulaContext) -> FormulaResult {
        self.set_context(context);
        self.evaluate(formula)
    }

    /// Like [`validate_formula`], but also accepts this calculator's registered functions.
    pub fn validate(&self, formula: &str) -> ValidationResult {
        validate_with(formula, |name| self.has_function(name))
    }
}

/// Pre-flight check used before a formula is saved into form metadata.
///
/// Passes when at least one built-in function is called. Advisory only: a valid formula
/// can still evaluate to an error.
pub fn validate_formula(formula: &str) -> ValidationResult {
    validate_with(formula, has_builtin_function)
}

fn validate_with<F: Fn(&str) -> bool>(formula: &str, is_known: F) -> ValidationResult {
    let trimmed = formula.trim();
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    if body.trim().is_empty() {
        return ValidationResult::invalid("Formula cannot be empty");
    }
    let names = called_names(body);
    if names.iter().any(|n| is_known(n)) {
        return ValidationResult::valid();
    }
    match names.first() {
        Some(unknown) => ValidationResult::invalid(format!("Unknown function: {}", unknown.to_uppercase())),
        None => ValidationResult::invalid("Formula must call at least one function such as COUNT, SUM or FIELD"),
    }
}

/// Names written as `NAME(` in the formula, in order; scanning stops at a lexing error.
fn called_names(body: &str) -> Vec<String> {
    let mut lexer = Lexer::new(body);
    let mut names = Vec::new();
    let mut previous: Option<String> = None;
    while let Ok(tok) = lexer.next_token() {
        match tok {
            Token::Eof => break,
            Token::LParen => {
                if let Some(name) = previous.take() {
                    names.push(name);
                }
            }
            Token::Identifier(name) => previous = Some(name),
            _ => previous = None,
        }
    }
    names
}

/// A legacy formula that is a single call with a broken argument list is evaluated with
/// whatever arguments could be read.
fn recover_legacy_call(formula: &str, err: Error) -> Result<(Dialect, Expr), Error> {
    if formula.starts_with('=') || err == Error::NestingTooDeep {
        return Err(err);
    }
    match recover_call(formula) {
        Some(expr) => {
            tracing::debug!(formula, error = %err, "recovered malformed call arguments");
            Ok((Dialect::Legacy, expr))
        }
        None => Err(err),
    }
}

/// A formula that does not parse still yields a result.
///
/// Text that was clearly meant to compute (pure arithmetic after `=`, or a legacy formula
/// with a `NAME(` call) reports an invalid expression; anything else degrades to 0.
/// Nesting past the limit is always an error.
fn degrade_parse_failure(formula: &str, err: Error) -> FormulaResult {
    if err == Error::NestingTooDeep {
        tracing::debug!(formula, "formula nests too deeply");
        return FormulaResult::error(err.to_string());
    }
    let (dialect, body) = match formula.strip_prefix('=') {
        Some(rest) => (Dialect::Excel, rest),
        None => (Dialect::Legacy, formula),
    };
    let meant_to_compute = match dialect {
        Dialect::Excel => body.chars().all(|c| c.is_ascii_digit() || "+-*/(). \t".contains(c)),
        Dialect::Legacy => has_call_shape(body),
    };
    if meant_to_compute {
        tracing::debug!(formula, error = %err, "formula failed to parse");
        FormulaResult::error(Error::invalid(err.to_string()).to_string())
    } else {
        tracing::debug!(formula, error = %err, "unrecognized formula degrades to 0");
        FormulaResult::number(0.0)
    }
}

fn has_call_shape(body: &str) -> bool {
    let bytes = body.as_bytes();
    bytes
        .iter()
        .enumerate()
        .any(|(i, b)| *b == b'(' && i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_'))
}
