//! Request Dispatch
//!
//! Maps one newline-delimited JSON request to the matching host call.

use tracing::{debug, warn};

use super::handlers::HostState;
use crate::models::{HostRequest, HostResponse};

/// Parses and answers one request line.
///
/// A line that is not a valid request gets a failure response; it never
/// ends the session.
pub fn handle_line(state: &HostState, line: &str) -> HostResponse {
    match serde_json::from_str::<HostRequest>(line) {
        Ok(request) => dispatch(state, request),
        Err(err) => {
            warn!("Rejected request line: {}", err);
            HostResponse::failure("invalid_request", format!("Invalid request: {err}"))
        }
    }
}

/// Runs a parsed request.
pub fn dispatch(state: &HostState, request: HostRequest) -> HostResponse {
    debug!("Dispatching {}", request.op());

    match request {
        HostRequest::Eval { expression, data } => {
            state.eval(expression.as_deref(), data.as_deref()).into()
        }
        HostRequest::EvalJson { expression, data } => {
            state.eval_json(expression.as_deref(), data.as_deref()).into()
        }
        HostRequest::CompileCheck { expression } => {
            state.compile_check(expression.as_deref()).into()
        }
        HostRequest::CacheStats => HostResponse::success(state.cache_stats()),
        HostRequest::CacheClear => HostResponse::success(state.cache_clear()),
    }
}
