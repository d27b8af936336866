//! Host Module
//!
//! The text-level surface a host process drives.
//!
//! # Calls
//! - `eval` - Evaluate with raw data text bound to `data`
//! - `eval_json` - Evaluate against a JSON document
//! - `compile_check` - Compile into the program cache
//! - `cache_stats` - Both caches' statistics as JSON
//! - `cache_clear` - Empty both caches

pub mod dispatch;
pub mod handlers;

pub use dispatch::{dispatch, handle_line};
pub use handlers::{HostState, CEL_CACHES, DATA_VARIABLE};
