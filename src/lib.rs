//! CEL Cache - Expression evaluation with memory-bounded program and JSON caches
//!
//! Compiled programs are cached by expression text and parsed documents by
//! raw JSON text, each within its own byte budget and with LRU eviction.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod models;
pub mod tasks;

pub use config::Config;
pub use engine::{CacheContext, CacheInitializer, CelRuntime, EvaluationEngine, ExpressionRuntime};
pub use error::{CacheError, EvalError};
pub use host::HostState;
pub use tasks::spawn_maintenance_task;
