//! Integration Tests for the Host Calls
//!
//! Drives the five host calls and the line dispatcher end to end, and the
//! shim binary over stdin/stdout.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use cel_cache::engine::{CacheContext, CelRuntime};
use cel_cache::host::{dispatch, handle_line};
use cel_cache::models::{HostRequest, HostResponse};
use cel_cache::{Config, EvaluationEngine, HostState};
use serde_json::Value;

// == Helper Functions ==

fn create_test_state() -> HostState {
    HostState::standalone(&Config::default())
}

fn small_state(program_bytes: u64, json_bytes: u64) -> HostState {
    let caches = Arc::new(CacheContext::with_capacities(program_bytes, json_bytes, 90));
    HostState::new(EvaluationEngine::new(CelRuntime::new(), caches))
}

fn stats_json(state: &HostState) -> Value {
    serde_json::from_str(&state.cache_stats()).unwrap()
}

// == Concrete Scenarios ==

#[test]
fn test_compile_check_then_cache_hit() {
    let state = create_test_state();

    assert_eq!(state.compile_check(Some("x + 1")).unwrap(), "OK");
    let misses_after_first = stats_json(&state)["program_cache"]["misses"].clone();

    assert_eq!(state.compile_check(Some("x + 1")).unwrap(), "OK");
    let stats = stats_json(&state);

    assert_eq!(stats["program_cache"]["misses"], misses_after_first);
    assert_eq!(stats["program_cache"]["hits"], 1);
    assert_eq!(stats["program_cache"]["entries"], 1);
}

#[test]
fn test_eval_json_addition() {
    let state = create_test_state();
    assert_eq!(
        state.eval_json(Some("x + 1"), Some(r#"{"x": 5}"#)).unwrap(),
        "6"
    );
}

#[test]
fn test_has_missing_field_is_false() {
    let state = create_test_state();
    assert_eq!(
        state
            .eval_json(Some("has(x.y)"), Some(r#"{"x": {"z": true}}"#))
            .unwrap(),
        "false"
    );
}

#[test]
fn test_division_by_zero_then_success() {
    let state = create_test_state();

    let err = state
        .eval_json(Some("x / y"), Some(r#"{"x":1,"y":0}"#))
        .unwrap_err();
    assert!(err.to_string().starts_with("CEL evaluation error: "));

    assert_eq!(
        state
            .eval_json(Some("x + y"), Some(r#"{"x":1,"y":0}"#))
            .unwrap(),
        "1"
    );
    assert_eq!(
        state
            .eval_json(Some("x / y"), Some(r#"{"x":4,"y":2}"#))
            .unwrap(),
        "2"
    );
}

#[test]
fn test_stats_at_start_are_empty() {
    let stats = stats_json(&create_test_state());

    for section in ["program_cache", "json_cache"] {
        assert_eq!(stats[section]["entries"], 0);
        assert_eq!(stats[section]["approx_bytes_used"], 0);
        assert_eq!(stats[section]["hits"], 0);
        assert_eq!(stats[section]["misses"], 0);
        assert_eq!(stats[section]["evictions"], 0);
    }
    assert_eq!(
        stats["program_cache"]["capacity_bytes"],
        128 * 1024 * 1024
    );
    assert_eq!(stats["json_cache"]["capacity_bytes"], 64 * 1024 * 1024);
}

#[test]
fn test_clear_resets_fully() {
    let state = create_test_state();
    state.eval_json(Some("a && b"), Some(r#"{"a":true,"b":false}"#)).unwrap();
    state.eval_json(Some("a && b"), Some(r#"{"a":true,"b":false}"#)).unwrap();
    state.compile_check(Some("1 +")).unwrap_err();

    assert_eq!(state.cache_clear(), "Cache cleared successfully");

    let stats = stats_json(&state);
    for section in ["program_cache", "json_cache"] {
        assert_eq!(stats[section]["entries"], 0);
        assert_eq!(stats[section]["approx_bytes_used"], 0);
        assert_eq!(stats[section]["hits"], 0);
        assert_eq!(stats[section]["misses"], 0);
        assert_eq!(stats[section]["evictions"], 0);
    }
}

#[test]
fn test_integer_faults_are_contained() {
    let state = create_test_state();
    let cases = [
        ("x % y", r#"{"x":5,"y":0}"#),
        ("x + 1", r#"{"x":9223372036854775807}"#),
        ("x * 2", r#"{"x":9223372036854775807}"#),
        ("-x", r#"{"x":-9223372036854775808}"#),
        ("x / y", r#"{"x":-9223372036854775808,"y":-1}"#),
    ];

    for (expression, doc) in cases {
        let err = state.eval_json(Some(expression), Some(doc)).unwrap_err();
        assert!(
            err.to_string().starts_with("CEL evaluation error: "),
            "{expression}: {err}"
        );
    }

    assert_eq!(
        state.eval_json(Some("x % y"), Some(r#"{"x":5,"y":3}"#)).unwrap(),
        "2"
    );
}

#[test]
fn test_dotted_top_level_key() {
    let state = create_test_state();
    assert_eq!(
        state.eval_json(Some("a.b"), Some(r#"{"a.b": 1}"#)).unwrap(),
        "1"
    );
}

#[test]
fn test_eval_with_raw_data() {
    let state = create_test_state();
    assert_eq!(
        state
            .eval(Some("data.startsWith('ab')"), Some("abc"))
            .unwrap(),
        "true"
    );
}

// == Budgets ==

#[test]
fn test_json_cache_stays_within_budget() {
    let state = small_state(1 << 20, 8 * 1024);

    for i in 0..200 {
        let doc = format!(r#"{{"id": {i}, "name": "user_{i}"}}"#);
        assert_eq!(state.eval_json(Some("id"), Some(doc.as_str())).unwrap(), i.to_string());
    }

    let stats = stats_json(&state);
    let used = stats["json_cache"]["approx_bytes_used"].as_u64().unwrap();
    let capacity = stats["json_cache"]["capacity_bytes"].as_u64().unwrap();
    assert!(used <= capacity);
    assert!(stats["json_cache"]["evictions"].as_u64().unwrap() > 0);
}

// == Concurrency ==

#[test]
fn test_concurrent_callers_share_caches() {
    let state = create_test_state();
    let mut handles = vec![];

    for t in 0..8 {
        let state = state.clone();
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let doc = format!(r#"{{"x": {}}}"#, i % 5);
                let out = state.eval_json(Some("x * 2"), Some(doc.as_str())).unwrap();
                assert_eq!(out, ((i % 5) * 2).to_string());

                if t == 0 && i == 25 {
                    let _ = state.cache_clear();
                }
            }
        }));
    }

    for h in handles {
        h.join().expect("Thread panicked");
    }

    let stats = stats_json(&state);
    assert!(stats["program_cache"]["entries"].as_u64().unwrap() <= 1);
    assert!(stats["json_cache"]["entries"].as_u64().unwrap() <= 5);
}

// == Dispatcher ==

#[test]
fn test_dispatch_all_ops() {
    let state = create_test_state();

    assert_eq!(
        handle_line(
            &state,
            r#"{"op":"eval","expression":"data + '!'","data":"hi"}"#
        ),
        HostResponse::success("hi!")
    );
    assert_eq!(
        handle_line(
            &state,
            r#"{"op":"eval_json","expression":"user.name","data":"{\"user\":{\"name\":\"ana\"}}"}"#
        ),
        HostResponse::success("ana")
    );
    assert_eq!(
        handle_line(&state, r#"{"op":"compile_check","expression":"x > 1"}"#),
        HostResponse::success("OK")
    );

    let stats = dispatch(&state, HostRequest::CacheStats);
    assert!(stats.ok);
    let parsed: Value = serde_json::from_str(&stats.result).unwrap();
    assert!(parsed["program_cache"].is_object());

    assert_eq!(
        dispatch(&state, HostRequest::CacheClear),
        HostResponse::success("Cache cleared successfully")
    );
}

#[test]
fn test_dispatch_errors() {
    let state = create_test_state();

    let missing = handle_line(&state, r#"{"op":"eval_json","expression":"x"}"#);
    assert!(!missing.ok);
    assert!(missing.result.starts_with("Invalid input: "));
    assert_eq!(missing.kind.as_deref(), Some("nil_input"));

    let bad_json = handle_line(
        &state,
        r#"{"op":"eval_json","expression":"x","data":"{oops"}"#,
    );
    assert!(!bad_json.ok);
    assert!(bad_json.result.starts_with("JSON parsing error: "));
    assert_eq!(bad_json.kind.as_deref(), Some("json_parse"));

    let unknown = handle_line(&state, r#"{"op":"shutdown"}"#);
    assert!(!unknown.ok);
    assert!(unknown.result.starts_with("Invalid request: "));
}

// == Shim Binary ==

#[test]
fn test_shim_answers_each_line() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cel_cache"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start shim");

    {
        let stdin = child.stdin.as_mut().expect("stdin is piped");
        writeln!(stdin, r#"{{"op":"eval_json","expression":"x + 1","data":"{{\"x\":5}}"}}"#)
            .unwrap();
        writeln!(stdin).unwrap();
        writeln!(stdin, r#"{{"op":"compile_check","expression":"(x"}}"#).unwrap();
        writeln!(stdin, r#"{{"op":"cache_clear"}}"#).unwrap();
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("Shim did not exit");
    assert!(output.status.success());

    let lines: Vec<HostResponse> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HostResponse::success("6"));
    assert!(!lines[1].ok);
    assert!(lines[1].result.starts_with("CEL compilation error: "));
    assert_eq!(lines[2], HostResponse::success("Cache cleared successfully"));
}

#[test]
fn test_shim_survives_integer_faults() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cel_cache"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start shim");

    {
        let stdin = child.stdin.as_mut().expect("stdin is piped");
        writeln!(stdin, r#"{{"op":"eval_json","expression":"x / y","data":"{{\"x\":1,\"y\":0}}"}}"#)
            .unwrap();
        writeln!(stdin, r#"{{"op":"eval_json","expression":"x % y","data":"{{\"x\":1,\"y\":0}}"}}"#)
            .unwrap();
        writeln!(stdin, r#"{{"op":"cache_stats"}}"#).unwrap();
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("Shim did not exit");
    assert!(output.status.success());

    let lines: Vec<HostResponse> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    for fault in &lines[..2] {
        assert!(!fault.ok);
        assert_eq!(fault.kind.as_deref(), Some("evaluation"));
        assert!(fault.result.starts_with("CEL evaluation error: "));
    }

    assert!(lines[2].ok);
    let stats: Value = serde_json::from_str(&lines[2].result).unwrap();
    assert_eq!(stats["program_cache"]["entries"], 2);
    assert_eq!(stats["json_cache"]["entries"], 1);
}
