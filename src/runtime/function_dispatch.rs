use super::evaluation::Scope;
use super::{arithmetic, form, logical, statistical, string, timesheet};
use crate::ast::Dialect;
use crate::error::Error;
use crate::types::Value;
use std::collections::HashSet;

/// Built-in function table, split by category for O(1) lookup
pub struct FunctionDispatch {
    arithmetic_functions: HashSet<&'static str>,
    logical_functions: HashSet<&'static str>,
    string_functions: HashSet<&'static str>,
    statistical_functions: HashSet<&'static str>,
    form_functions: HashSet<&'static str>,
    timesheet_functions: HashSet<&'static str>,
}

impl FunctionDispatch {
    pub fn new() -> Self {
        let arithmetic_functions = HashSet::from([
            "SUM", "AVERAGE", "AVG", "ROUND", "MAX", "MIN", "ABS", "POWER", "POW", "SQRT", "SUMPRODUCT",
        ]);
        let logical_functions = HashSet::from(["IF", "AND", "OR", "NOT"]);
        let string_functions = HashSet::from(["CONCATENATE", "CONCAT", "LEN", "UPPER", "LOWER"]);
        let statistical_functions = HashSet::from(["COUNT", "COUNTIF", "MEDIAN", "MODE"]);
        let form_functions = HashSet::from(["FIELD", "COUNT_IGNORE_CASE"]);
        let timesheet_functions = HashSet::from(["CALC_HOURS", "SUM_DAILY_HOURS", "CALC_OVERTIME"]);

        Self {
            arithmetic_functions,
            logical_functions,
            string_functions,
            statistical_functions,
            form_functions,
            timesheet_functions,
        }
    }

    /// Execute a builtin function.
    ///
    /// `COUNT` is the one name whose meaning depends on the dialect: legacy formulas count
    /// matching form answers, Excel-style formulas count non-empty arguments.
    pub fn execute(&self, name: &str, args: &[Value], scope: Scope<'_>) -> Result<Value, Error> {
        if name == "COUNT" && scope.dialect == Dialect::Legacy {
            return form::exec_form(name, args, scope);
        }

        if self.arithmetic_functions.contains(name) {
            return arithmetic::exec_arithmetic(name, args);
        }

        if self.logical_functions.contains(name) {
            return logical::exec_logical(name, args, scope);
        }

        if self.string_functions.contains(name) {
            return string::exec_string(name, args);
        }

        if self.statistical_functions.contains(name) {
            return statistical::exec_statistical(name, args, scope);
        }

        if self.form_functions.contains(name) {
            return form::exec_form(name, args, scope);
        }

        if self.timesheet_functions.contains(name) {
            return timesheet::exec_timesheet(name, args, scope);
        }

        Err(Error::UnknownFunction(name.to_string()))
    }

    /// Check if a function is registered in any category
    pub fn has_function(&self, name: &str) -> bool {
        self.categories().any(|set| set.contains(name))
    }

    /// All built-in names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.categories().flat_map(|set| set.iter().copied()).collect();
        names.sort_unstable();
        names
    }

    pub fn count(&self) -> usize {
        self.categories().map(HashSet::len).sum()
    }

    fn categories(&self) -> impl Iterator<Item = &HashSet<&'static str>> {
        [
            &self.arithmetic_functions,
            &self.logical_functions,
            &self.string_functions,
            &self.statistical_functions,
            &self.form_functions,
            &self.timesheet_functions,
        ]
        .into_iter()
    }
}

impl Default for FunctionDispatch {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_DISPATCH: FunctionDispatch = FunctionDispatch::new();
}

pub fn exec_builtin(name: &str, args: &[Value], scope: Scope<'_>) -> Result<Value, Error> {
    GLOBAL_DISPATCH.execute(name, args, scope)
}

/// Check if a builtin function exists (case-insensitive)
pub fn has_builtin_function(name: &str) -> bool {
    GLOBAL_DISPATCH.has_function(&name.to_uppercase())
}

pub fn builtin_function_names() -> Vec<&'static str> {
    GLOBAL_DISPATCH.names()
}
