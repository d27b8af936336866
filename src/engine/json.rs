//! JSON parsing for evaluation data.

use serde_json::Value as JsonValue;

use super::runtime::DataContext;
use crate::error::{EvalError, EvalResult};

/// Parses raw JSON text into a `DataContext`. No cache awareness.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
    /// Parses `text`, which must hold a JSON object at the top level.
    ///
    /// # Errors
    /// Returns `EvalError::JsonParse` for malformed JSON or a non-object document.
    pub fn parse(text: &str) -> EvalResult<DataContext> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| EvalError::JsonParse(e.to_string()))?;

        match value {
            JsonValue::Object(fields) => Ok(fields),
            other => Err(EvalError::JsonParse(format!(
                "expected a JSON object at the top level, found {}",
                kind_name(&other)
            ))),
        }
    }
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Splits an expression into field names if it is a bare dotted path such as
/// `user` or `user.address.city`. Anything else returns `None`.
pub fn field_path(expression: &str) -> Option<Vec<&str>> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return None;
    }

    let segments: Vec<&str> = trimmed.split('.').collect();
    segments
        .iter()
        .all(|segment| is_identifier(segment) && !is_reserved(segment))
        .then_some(segments)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Literals and keywords that look like identifiers but are not variables.
fn is_reserved(segment: &str) -> bool {
    matches!(segment, "true" | "false" | "null" | "in")
}
