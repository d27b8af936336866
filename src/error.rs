//! Error types for the evaluation engine
//!
//! Provides unified error handling using thiserror. `CacheError` belongs to the
//! cache layer; `EvalError` is what the five host calls can fail with, and its
//! `Display` output is the text handed back to the host.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by `BoundedCache`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Keys must be non-empty text
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

// == Eval Error Enum ==
/// Failure kinds of an evaluation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Required text argument absent or empty
    #[error("Invalid input: {0}")]
    NilInput(String),

    /// Malformed expression
    #[error("CEL compilation error: {0}")]
    Compile(String),

    /// Malformed JSON data
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Runtime failure of a valid program against the given data
    #[error("CEL evaluation error: {0}")]
    Evaluation(String),
}

impl EvalError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::NilInput(_) => "nil_input",
            EvalError::Compile(_) => "compile",
            EvalError::JsonParse(_) => "json_parse",
            EvalError::Evaluation(_) => "evaluation",
        }
    }
}

impl From<CacheError> for EvalError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidKey(msg) => EvalError::NilInput(msg),
        }
    }
}

// == Result Type Aliases ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Convenience Result type for evaluation operations.
pub type EvalResult<T> = std::result::Result<T, EvalError>;
