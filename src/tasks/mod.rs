//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the host shim is up.
//!
//! # Tasks
//! - Cache maintenance: trims both caches under budget and logs their stats

mod maintenance;

pub use maintenance::spawn_maintenance_task;
