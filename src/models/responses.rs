//! Response DTOs for the host shim
//!
//! Defines the combined stats report and the per-line response envelope.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::error::EvalError;

/// One cache's section of the stats report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Current number of entries
    pub entries: usize,
    /// Approximate bytes charged by live entries
    pub approx_bytes_used: u64,
    /// Configured budget in bytes
    pub capacity_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<&CacheStats> for CacheSection {
    fn from(stats: &CacheStats) -> Self {
        Self {
            entries: stats.entry_count,
            approx_bytes_used: stats.approx_bytes_used,
            capacity_bytes: stats.capacity_bytes,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Body returned by `cache_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub program_cache: CacheSection,
    pub json_cache: CacheSection,
    /// Snapshot time in RFC 3339 format
    pub taken_at: String,
}

impl CacheStatsResponse {
    /// Builds a report stamped with the current time.
    pub fn new(program_cache: &CacheStats, json_cache: &CacheStats) -> Self {
        Self {
            program_cache: program_cache.into(),
            json_cache: json_cache.into(),
            taken_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One response line written by the host shim.
///
/// `ok` tells success text apart from error text. Failures also carry the
/// error `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResponse {
    pub ok: bool,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl HostResponse {
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            ok: true,
            result: result.into(),
            kind: None,
        }
    }

    pub fn failure(kind: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: result.into(),
            kind: Some(kind.into()),
        }
    }
}

impl From<Result<String, EvalError>> for HostResponse {
    fn from(outcome: Result<String, EvalError>) -> Self {
        match outcome {
            Ok(text) => Self::success(text),
            Err(err) => Self::failure(err.kind(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_section_from_stats() {
        let stats = CacheStats {
            entry_count: 3,
            approx_bytes_used: 900,
            capacity_bytes: 4096,
            hits: 3,
            misses: 1,
            evictions: 2,
        };
        let section = CacheSection::from(&stats);

        assert_eq!(section.entries, 3);
        assert_eq!(section.evictions, 2);
        assert_eq!(section.hit_rate, 0.75);
    }

    #[test]
    fn test_stats_response_serialize() {
        let response = CacheStatsResponse::new(&CacheStats::default(), &CacheStats::default());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["program_cache"]["entries"], 0);
        assert_eq!(json["json_cache"]["hit_rate"], 0.0);
        assert!(json["taken_at"].is_string());
    }

    #[test]
    fn test_host_response_from_outcome() {
        let ok: HostResponse = Ok::<_, EvalError>("6".to_string()).into();
        assert_eq!(ok, HostResponse::success("6"));

        let err: HostResponse = Err(EvalError::Compile("bad".to_string())).into();
        assert!(!err.ok);
        assert_eq!(err.result, "CEL compilation error: bad");
        assert_eq!(err.kind.as_deref(), Some("compile"));
    }

    #[test]
    fn test_host_response_serialize() {
        let json = serde_json::to_string(&HostResponse::success("true")).unwrap();
        assert_eq!(json, r#"{"ok":true,"result":"true"}"#);

        let json = serde_json::to_string(&HostResponse::failure("evaluation", "boom")).unwrap();
        assert_eq!(json, r#"{"ok":false,"result":"boom","kind":"evaluation"}"#);
    }
}
