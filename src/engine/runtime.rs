//! Expression runtime capability.
//!
//! The engine never looks inside programs or prepared data. Anything that can
//! compile expression text, bind a data context and execute the result can be
//! plugged in.

use serde_json::{Map, Value as JsonValue};

use crate::error::EvalResult;

/// Structured data an expression is evaluated against: variable name to value.
pub type DataContext = Map<String, JsonValue>;

/// Compiler plus executor for one expression language.
///
/// Programs and prepared data are cached and shared across threads, so both
/// must be immutable after construction and safe to use concurrently.
pub trait ExpressionRuntime: Send + Sync + 'static {
    /// Compiled, re-executable form of an expression.
    type Program: Send + Sync + 'static;

    /// A data context converted into the runtime's native values.
    type Data: Send + Sync + 'static;

    /// Compiles expression text.
    ///
    /// # Errors
    /// Returns `EvalError::Compile` if the expression is malformed.
    fn compile(&self, expression: &str) -> EvalResult<Self::Program>;

    /// Converts a data context into native values once, so repeated
    /// executions against the same data skip the conversion.
    fn prepare(&self, context: &DataContext) -> Self::Data;

    /// Runs a program against prepared data and renders the result as text.
    ///
    /// # Errors
    /// Returns `EvalError::Evaluation` on any runtime failure.
    fn execute(&self, program: &Self::Program, data: &Self::Data) -> EvalResult<String>;

    /// Resolves a dotted field path directly in prepared data, rendering the
    /// value the same way `execute` would. `None` means "compile instead".
    fn lookup(&self, _data: &Self::Data, _path: &[&str]) -> Option<String> {
        None
    }
}
