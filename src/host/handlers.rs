//! Host Handlers
//!
//! The five text-in/text-out calls a host process makes.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::engine::{CacheInitializer, CelRuntime, DataContext, EvaluationEngine};
use crate::error::{EvalError, EvalResult};

/// Process-wide caches shared by every `HostState` built with `from_config`.
pub static CEL_CACHES: CacheInitializer<CelRuntime> = CacheInitializer::new();

/// Variable the raw data text is bound to by `eval`.
pub const DATA_VARIABLE: &str = "data";

/// State shared by every host call.
#[derive(Clone, Debug)]
pub struct HostState {
    pub engine: Arc<EvaluationEngine>,
}

impl HostState {
    pub fn new(engine: EvaluationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Builds state on the process-wide caches, initializing them on first use.
    pub fn from_config(config: &Config) -> Self {
        let caches = CEL_CACHES.initialize(config);
        Self::new(EvaluationEngine::new(CelRuntime::new(), caches))
    }

    /// Builds state with caches of its own, outside the process-wide ones.
    pub fn standalone(config: &Config) -> Self {
        Self::new(EvaluationEngine::from_config(config))
    }

    /// `eval(expression, data)`: evaluates with the raw data text bound to
    /// `data` as a string. Empty data evaluates against an empty context.
    pub fn eval(&self, expression: Option<&str>, data: Option<&str>) -> EvalResult<String> {
        let expression = required(expression)?;

        let mut context = DataContext::new();
        if let Some(text) = data.filter(|text| !text.is_empty()) {
            context.insert(DATA_VARIABLE.to_string(), JsonValue::String(text.to_string()));
        }

        self.engine.evaluate_with_data(expression, &context)
    }

    /// `evalJson(expression, jsonData)`
    pub fn eval_json(&self, expression: Option<&str>, json: Option<&str>) -> EvalResult<String> {
        let expression = required(expression)?;
        let json = json.ok_or_else(|| EvalError::NilInput("JSON data is missing".to_string()))?;
        self.engine.evaluate_with_json(expression, json)
    }

    /// `compileCheck(expression)`
    pub fn compile_check(&self, expression: Option<&str>) -> EvalResult<String> {
        self.engine.compile_check(required(expression)?)
    }

    /// `cacheStats()`
    pub fn cache_stats(&self) -> String {
        self.engine.cache_stats()
    }

    /// `cacheClear()`
    pub fn cache_clear(&self) -> String {
        self.engine.cache_clear()
    }
}

fn required(expression: Option<&str>) -> EvalResult<&str> {
    expression.ok_or_else(|| EvalError::NilInput("expression is missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> HostState {
        HostState::standalone(&Config::default())
    }

    #[test]
    fn test_eval_binds_raw_data() {
        let state = state();
        assert_eq!(
            state.eval(Some("data.size()"), Some("hello")).unwrap(),
            "5"
        );
        assert_eq!(
            state.eval(Some("data == 'abc'"), Some("abc")).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_eval_with_empty_data() {
        let state = state();
        assert_eq!(state.eval(Some("1 + 1"), Some("")).unwrap(), "2");
        assert_eq!(state.eval(Some("1 + 1"), None).unwrap(), "2");
    }

    #[test]
    fn test_missing_arguments_are_nil_input() {
        let state = state();
        assert!(matches!(state.eval(None, None), Err(EvalError::NilInput(_))));
        assert!(matches!(
            state.eval_json(Some("x"), None),
            Err(EvalError::NilInput(_))
        ));
        assert!(matches!(
            state.compile_check(None),
            Err(EvalError::NilInput(_))
        ));
    }

    #[test]
    fn test_eval_json_and_compile_check() {
        let state = state();
        assert_eq!(
            state.eval_json(Some("x + 1"), Some(r#"{"x": 5}"#)).unwrap(),
            "6"
        );
        assert_eq!(state.compile_check(Some("x + 1")).unwrap(), "OK");
    }

    #[test]
    fn test_process_wide_caches_are_shared() {
        let first = HostState::from_config(&Config::default());
        let second = HostState::from_config(&Config::new(256, 128));

        assert!(Arc::ptr_eq(first.engine.caches(), second.engine.caches()));
        assert!(CEL_CACHES.is_initialized());
    }
}
