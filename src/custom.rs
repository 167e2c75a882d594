use crate::error::Error;
use crate::types::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for implementing custom functions callable from formulas
///
/// # Example
/// ```rust
/// use formcalc::custom::CustomFunction;
/// use formcalc::{Value, Error};
///
/// struct DoubleFunction;
///
/// impl CustomFunction for DoubleFunction {
///     fn name(&self) -> &str {
///         "DOUBLE"
///     }
///     fn min_args(&self) -> usize {
///         1
///     }
///     fn max_args(&self) -> Option<usize> {
///         Some(1)
///     }
///
///     fn execute(&self, args: Vec<Value>) -> Result<Value, Error> {
///         Ok(Value::Number(args[0].number_or_zero() * 2.0))
///     }
/// }
/// ```
pub trait CustomFunction: Send + Sync {
    /// The name of the function (case-insensitive)
    fn name(&self) -> &str;

    /// Minimum number of arguments required
    fn min_args(&self) -> usize;

    /// Maximum number of arguments allowed (None = unlimited)
    fn max_args(&self) -> Option<usize>;

    /// Execute the function with the given arguments
    fn execute(&self, args: Vec<Value>) -> Result<Value, Error>;

    /// Optional: Description of the function for documentation
    fn description(&self) -> Option<&str> {
        None
    }

    /// Optional: Example usage for documentation
    fn example(&self) -> Option<&str> {
        None
    }
}

/// Adapts a plain closure into a variadic [`CustomFunction`].
pub struct FnFunction<F> {
    name: String,
    func: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    pub fn new<N: Into<String>>(name: N, func: F) -> Self {
        Self { name: name.into(), func }
    }
}

impl<F> CustomFunction for FnFunction<F>
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn min_args(&self) -> usize {
        0
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn execute(&self, args: Vec<Value>) -> Result<Value, Error> {
        Ok((self.func)(&args))
    }
}

/// Registry for custom functions, owned by one calculator.
///
/// Cloning is cheap: the functions themselves are shared behind `Arc`.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn CustomFunction>>,
}

impl FunctionRegistry {
    /// Create a new empty function registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register a custom function, replacing any function of the same name
    pub fn register(&mut self, function: Box<dyn CustomFunction>) -> Result<(), Error> {
        let name = function.name().trim().to_uppercase();

        if name.is_empty() {
            return Err(Error::invalid("Function name cannot be empty"));
        }

        if function.min_args() > function.max_args().unwrap_or(usize::MAX) {
            return Err(Error::function(name, "min_args cannot be greater than max_args"));
        }

        if self.functions.insert(name.clone(), Arc::from(function)).is_some() {
            tracing::warn!(function = %name, "custom function re-registered; previous definition replaced");
        } else {
            tracing::debug!(function = %name, "custom function registered");
        }
        Ok(())
    }

    /// Register a closure under `name`
    pub fn register_fn<N, F>(&mut self, name: N, func: F) -> Result<(), Error>
    where
        N: Into<String>,
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.register(Box::new(FnFunction::new(name, func)))
    }

    /// Get a function by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&dyn CustomFunction> {
        self.functions.get(&name.to_uppercase()).map(|f| f.as_ref())
    }

    /// List all registered function names, sorted
    pub fn list_functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Remove a function by name
    pub fn unregister(&mut self, name: &str) -> bool {
        self.functions.remove(&name.to_uppercase()).is_some()
    }

    /// Check if a function is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Validate and execute a function
    pub fn execute(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let function = self
            .get(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_uppercase()))?;

        // Validate argument count
        let arg_count = args.len();
        if arg_count < function.min_args() {
            return Err(Error::function(
                name,
                format!("expects at least {} arguments, got {}", function.min_args(), arg_count),
            ));
        }

        if let Some(max_args) = function.max_args() {
            if arg_count > max_args {
                return Err(Error::function(
                    name,
                    format!("expects at most {} arguments, got {}", max_args, arg_count),
                ));
            }
        }

        function.execute(args)
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.list_functions())
            .finish()
    }
}
