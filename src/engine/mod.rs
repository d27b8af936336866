//! Evaluation Engine Module
//!
//! Compiles and executes expressions through the program and JSON caches.
//!
//! # Components
//! - `ExpressionRuntime`: compile/prepare/execute capability
//! - `CelRuntime`: the CEL implementation of it
//! - `JsonParser`: JSON text to data context
//! - `CacheContext` / `CacheInitializer`: the two caches, built once
//! - `EvaluationEngine`: the five public operations

mod cel;
mod context;
mod evaluator;
mod json;
mod runtime;

pub use cel::{cel_to_json, json_to_cel, render, CelData, CelRuntime};
pub use context::{CacheContext, CacheInitializer, CombinedStats};
pub use evaluator::{EvaluationEngine, CACHE_CLEARED, COMPILE_OK};
pub use json::{field_path, JsonParser};
pub use runtime::{DataContext, ExpressionRuntime};
