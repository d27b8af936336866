//! Evaluation Engine
//!
//! Resolves programs and parsed data through the two caches, executes, and
//! renders the result. Also exposes the stats and clear operations.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::cel::CelRuntime;
use super::context::CacheContext;
use super::json::{field_path, JsonParser};
use super::runtime::{DataContext, ExpressionRuntime};
use crate::config::Config;
use crate::error::{EvalError, EvalResult};
use crate::models::CacheStatsResponse;

// == Size Estimates ==
// A compiled AST is several times larger than its source text.
const PROGRAM_BYTES_PER_CHAR: u64 = 8;
const PROGRAM_BASE_BYTES: u64 = 512;
const JSON_BYTES_PER_CHAR: u64 = 4;
const JSON_BASE_BYTES: u64 = 256;

/// Text returned by a successful `compile_check`.
pub const COMPILE_OK: &str = "OK";
/// Text returned by `cache_clear`.
pub const CACHE_CLEARED: &str = "Cache cleared successfully";

fn program_size(expression: &str) -> u64 {
    let len = expression.len() as u64;
    // The key text is stored alongside the program
    PROGRAM_BASE_BYTES + len * PROGRAM_BYTES_PER_CHAR + len
}

fn json_size(text: &str) -> u64 {
    let len = text.len() as u64;
    JSON_BASE_BYTES + len * JSON_BYTES_PER_CHAR + len
}

fn require_text<'a>(what: &str, text: &'a str) -> EvalResult<&'a str> {
    if text.trim().is_empty() {
        return Err(EvalError::NilInput(format!("{what} must not be empty")));
    }
    Ok(text)
}

// == Evaluation Engine ==
/// The five public operations over a shared `CacheContext`.
pub struct EvaluationEngine<R: ExpressionRuntime = CelRuntime> {
    runtime: R,
    caches: Arc<CacheContext<R>>,
}

impl EvaluationEngine<CelRuntime> {
    /// Builds a CEL engine with its own caches sized from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CelRuntime::new(), Arc::new(CacheContext::new(config)))
    }
}

impl<R: ExpressionRuntime> EvaluationEngine<R> {
    pub fn new(runtime: R, caches: Arc<CacheContext<R>>) -> Self {
        Self { runtime, caches }
    }

    pub fn caches(&self) -> &Arc<CacheContext<R>> {
        &self.caches
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    // == Evaluate With Data ==
    /// Evaluates `expression` against an already structured data context.
    ///
    /// The context is converted on every call; only the program is cached.
    ///
    /// # Errors
    /// `NilInput` for an empty expression, `Compile` or `Evaluation` otherwise.
    pub fn evaluate_with_data(&self, expression: &str, data: &DataContext) -> EvalResult<String> {
        let expression = require_text("expression", expression)?;
        let program = self.resolve_program(expression)?;
        let prepared = self.runtime.prepare(data);
        self.runtime.execute(&program, &prepared)
    }

    // == Evaluate With JSON ==
    /// Evaluates `expression` against a JSON document given as text.
    ///
    /// The document is parsed first. A bare field path such as `user.name`
    /// that resolves inside the document is answered without compiling.
    ///
    /// # Errors
    /// `NilInput` for empty arguments, `JsonParse`, `Compile` or `Evaluation`
    /// otherwise.
    pub fn evaluate_with_json(&self, expression: &str, json: &str) -> EvalResult<String> {
        let expression = require_text("expression", expression)?;
        let json = require_text("JSON data", json)?;

        let data = self.resolve_json(json)?;

        if let Some(path) = field_path(expression) {
            if let Some(value) = self.runtime.lookup(&data, &path) {
                trace!("Field path '{}' resolved without compiling", expression);
                return Ok(value);
            }
        }

        let program = self.resolve_program(expression)?;
        self.runtime.execute(&program, &data)
    }

    // == Compile Check ==
    /// Compiles `expression` into the program cache without executing it.
    pub fn compile_check(&self, expression: &str) -> EvalResult<String> {
        let expression = require_text("expression", expression)?;
        self.resolve_program(expression)?;
        Ok(COMPILE_OK.to_string())
    }

    // == Cache Stats ==
    /// Returns both caches' statistics as a JSON object.
    pub fn cache_stats(&self) -> String {
        let stats = self.caches.stats();
        let report = CacheStatsResponse::new(&stats.program_cache, &stats.json_cache);
        serde_json::to_string(&report).unwrap_or_else(|err| {
            warn!("Failed to serialize cache stats: {}", err);
            String::from("{}")
        })
    }

    // == Cache Clear ==
    /// Empties both caches and resets their counters.
    pub fn cache_clear(&self) -> String {
        let (programs, documents) = self.caches.clear();
        debug!(
            "Cleared {} programs and {} JSON documents",
            programs, documents
        );
        CACHE_CLEARED.to_string()
    }

    // == Resolution ==
    /// Program cache lookup, compiling and inserting on a miss.
    /// Compile errors are returned and never cached.
    fn resolve_program(&self, expression: &str) -> EvalResult<Arc<R::Program>> {
        let programs = self.caches.programs();
        if let Some(program) = programs.get(expression) {
            trace!("Program cache hit");
            return Ok(program);
        }

        debug!("Program cache miss, compiling {} bytes", expression.len());
        let program = self.runtime.compile(expression)?;
        Ok(programs.put(expression.to_string(), program, program_size(expression))?)
    }

    /// JSON cache lookup, parsing and preparing on a miss.
    fn resolve_json(&self, json: &str) -> EvalResult<Arc<R::Data>> {
        let documents = self.caches.json();
        if let Some(data) = documents.get(json) {
            trace!("JSON cache hit");
            return Ok(data);
        }

        debug!("JSON cache miss, parsing {} bytes", json.len());
        let context = JsonParser::parse(json)?;
        let data = self.runtime.prepare(&context);
        Ok(documents.put(json.to_string(), data, json_size(json))?)
    }
}

impl<R: ExpressionRuntime> std::fmt::Debug for EvaluationEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationEngine")
            .field("caches", &self.caches)
            .finish_non_exhaustive()
    }
}
