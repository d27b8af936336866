//! CEL runtime backed by `cel-interpreter`.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cel_interpreter::objects::{Key, Map};
use cel_interpreter::{Context, Program, Value};
use serde_json::Value as JsonValue;

use super::runtime::{DataContext, ExpressionRuntime};
use crate::error::{EvalError, EvalResult};

/// Variables bound for one evaluation, already converted to CEL values.
#[derive(Debug, Clone, Default)]
pub struct CelData {
    bindings: HashMap<String, Value>,
}

/// The default `ExpressionRuntime`: Common Expression Language.
#[derive(Debug, Clone, Copy, Default)]
pub struct CelRuntime;

impl CelRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl ExpressionRuntime for CelRuntime {
    type Program = Program;
    type Data = CelData;

    fn compile(&self, expression: &str) -> EvalResult<Program> {
        Program::compile(expression).map_err(|e| EvalError::Compile(e.to_string()))
    }

    fn prepare(&self, context: &DataContext) -> CelData {
        CelData {
            bindings: context
                .iter()
                .map(|(name, value)| (name.clone(), json_to_cel(value)))
                .collect(),
        }
    }

    fn execute(&self, program: &Program, data: &CelData) -> EvalResult<String> {
        let mut context = Context::default();
        for (name, value) in &data.bindings {
            context.add_variable_from_value(name.as_str(), value.clone());
        }

        // Integer division by zero and overflow panic inside the interpreter
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| program.execute(&context)))
            .map_err(|payload| EvalError::Evaluation(panic_message(payload.as_ref())))?;

        outcome
            .map(|value| render(&value))
            .map_err(|e| EvalError::Evaluation(e.to_string()))
    }

    fn lookup(&self, data: &CelData, path: &[&str]) -> Option<String> {
        // A top-level key may itself contain dots
        if let Some(value) = data.bindings.get(&path.join(".")) {
            return Some(render(value));
        }

        let (first, rest) = path.split_first()?;
        let mut current = data.bindings.get(*first)?;
        for segment in rest {
            match current {
                Value::Map(map) => {
                    current = map.map.get(&Key::String(Arc::new((*segment).to_string())))?;
                }
                _ => return None,
            }
        }
        Some(render(current))
    }
}

// == Conversions ==

/// Converts a JSON value to its CEL counterpart.
///
/// Integers stay integers so that integer arithmetic (and its errors, such as
/// division by zero) behaves as CEL defines it.
pub fn json_to_cel(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::Float)
            }
        }
        JsonValue::String(s) => Value::String(Arc::new(s.clone())),
        JsonValue::Array(items) => Value::List(Arc::new(items.iter().map(json_to_cel).collect())),
        JsonValue::Object(fields) => {
            let fields: HashMap<Arc<String>, Value> = fields
                .iter()
                .map(|(name, value)| (Arc::new(name.clone()), json_to_cel(value)))
                .collect();
            Value::Map(Map::from(fields))
        }
    }
}

/// Converts a CEL value to JSON for structured rendering.
pub fn cel_to_json(value: &Value) -> JsonValue {
    match value {
        Value::List(items) => JsonValue::Array(items.iter().map(cel_to_json).collect()),
        Value::Map(map) => JsonValue::Object(
            map.map
                .iter()
                .map(|(key, value)| (key_text(key), cel_to_json(value)))
                .collect(),
        ),
        Value::Int(i) => JsonValue::from(*i),
        Value::UInt(u) => JsonValue::from(*u),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Value::String(s) => JsonValue::String(s.to_string()),
        Value::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Duration(d) => JsonValue::String(format_duration(d)),
        Value::Timestamp(t) => JsonValue::String(t.to_rfc3339()),
        Value::Null => JsonValue::Null,
        Value::Function(name, _) => JsonValue::String(format!("<function {name}>")),
    }
}

/// Renders an evaluation result as the text returned to the caller.
///
/// Scalars render bare (`6`, `true`, `hello`); lists and maps render as
/// compact JSON with sorted keys. Non-finite floats render as `null` at any
/// depth.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(_) | Value::Null => "null".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Duration(d) => format_duration(d),
        Value::Timestamp(t) => t.to_rfc3339(),
        other => cel_to_json(other).to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "expression execution aborted".to_string())
}

fn key_text(key: &Key) -> String {
    match key {
        Key::String(s) => s.to_string(),
        Key::Int(i) => i.to_string(),
        Key::Uint(u) => u.to_string(),
        Key::Bool(b) => b.to_string(),
    }
}

fn format_duration(duration: &chrono::Duration) -> String {
    let millis = duration.num_milliseconds();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}s", millis as f64 / 1000.0)
    }
}
