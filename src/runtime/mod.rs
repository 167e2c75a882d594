pub mod arithmetic;
pub mod evaluation;
pub mod form;
pub mod function_dispatch;
pub mod logical;
pub mod statistical;
pub mod string;
pub mod timesheet;
pub mod utils;

// Re-export the main public functions
pub use evaluation::{eval, eval_formula, Scope};
pub use function_dispatch::{builtin_function_names, has_builtin_function};
