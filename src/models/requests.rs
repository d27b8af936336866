//! Request DTOs for the host shim
//!
//! Each stdin line is one JSON object tagged by `op`.

use serde::Deserialize;

/// A single host call.
///
/// # Example
/// ```text
/// {"op":"eval_json","expression":"x + 1","data":"{\"x\":5}"}
/// {"op":"cache_stats"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostRequest {
    /// Evaluate with the raw data text bound to `data`
    Eval {
        #[serde(default)]
        expression: Option<String>,
        #[serde(default)]
        data: Option<String>,
    },
    /// Evaluate against a JSON document
    EvalJson {
        #[serde(default)]
        expression: Option<String>,
        #[serde(default)]
        data: Option<String>,
    },
    CompileCheck {
        #[serde(default)]
        expression: Option<String>,
    },
    CacheStats,
    CacheClear,
}

impl HostRequest {
    /// Name of the operation, for log lines.
    pub fn op(&self) -> &'static str {
        match self {
            HostRequest::Eval { .. } => "eval",
            HostRequest::EvalJson { .. } => "eval_json",
            HostRequest::CompileCheck { .. } => "compile_check",
            HostRequest::CacheStats => "cache_stats",
            HostRequest::CacheClear => "cache_clear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_json_request_deserialize() {
        let json = r#"{"op": "eval_json", "expression": "x + 1", "data": "{\"x\": 5}"}"#;
        let req: HostRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            req,
            HostRequest::EvalJson {
                expression: Some("x + 1".to_string()),
                data: Some(r#"{"x": 5}"#.to_string()),
            }
        );
        assert_eq!(req.op(), "eval_json");
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let req: HostRequest = serde_json::from_str(r#"{"op": "eval"}"#).unwrap();
        assert_eq!(
            req,
            HostRequest::Eval {
                expression: None,
                data: None
            }
        );
    }

    #[test]
    fn test_unit_ops_deserialize() {
        let stats: HostRequest = serde_json::from_str(r#"{"op": "cache_stats"}"#).unwrap();
        let clear: HostRequest = serde_json::from_str(r#"{"op": "cache_clear"}"#).unwrap();
        assert_eq!(stats, HostRequest::CacheStats);
        assert_eq!(clear, HostRequest::CacheClear);
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(serde_json::from_str::<HostRequest>(r#"{"op": "flush"}"#).is_err());
    }
}
