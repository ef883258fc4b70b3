//! Presence and non-blankness checks for declared fields

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::path::FieldPath;

/// Require every path to resolve to a non-empty value.
///
/// | value     | fails when             |
/// |-----------|------------------------|
/// | missing   | always                 |
/// | null      | always                 |
/// | string    | blank after trimming   |
/// | array     | no elements            |
/// | object    | no keys                |
/// | other     | never                  |
///
/// JSON numbers cannot be NaN, so numbers always pass.
pub fn validate_non_empty(actual: &Value, fields: &[FieldPath]) -> ValidationResult<()> {
    for path in fields {
        if let Some(reason) = emptiness(path.resolve(actual)) {
            return Err(ValidationError::EmptyField {
                path: path.to_string(),
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

fn emptiness(value: Option<&Value>) -> Option<&'static str> {
    match value {
        None => Some("should exist"),
        Some(Value::Null) => Some("should not be null"),
        Some(Value::String(s)) if s.trim().is_empty() => Some("should not be empty"),
        Some(Value::Array(items)) if items.is_empty() => Some("should not be an empty array"),
        Some(Value::Object(map)) if map.is_empty() => Some("should not be an empty object"),
        Some(_) => None,
    }
}
