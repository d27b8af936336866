//! Request and Response models for the host shim
//!
//! This module defines the DTOs used for serializing/deserializing the
//! newline-delimited JSON requests and responses, plus the stats report.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::HostRequest;
pub use responses::{CacheSection, CacheStatsResponse, HostResponse};
