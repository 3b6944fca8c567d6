//! Helper functions for parsing JSON schemas
//!
//! This module contains utility functions for extracting typed keyword
//! values from `serde_json::Value`s, reporting the schema location on error.

use crate::error::{SchemaError, SchemaResult};
use crate::path::escape_pointer_token;
use serde_json::Value;

/// Location of a child of `location` (`#/a` + `b` → `#/a/b`)
pub(crate) fn child_location(location: &str, token: &str) -> String {
    format!("{}/{}", location, escape_pointer_token(token))
}

/// Human-readable JSON type name
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid(keyword: &str, expected: &str, value: &Value, location: &str) -> SchemaError {
    SchemaError::InvalidStructure {
        message: format!(
            "'{}' must be {}, got {}",
            keyword,
            expected,
            json_type_name(value)
        ),
        location: location.to_string(),
    }
}

/// Get a number
pub(super) fn expect_number(value: &Value, keyword: &str, location: &str) -> SchemaResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| invalid(keyword, "a number", value, location))
}

/// Get a strictly positive number
pub(super) fn expect_positive_number(
    value: &Value,
    keyword: &str,
    location: &str,
) -> SchemaResult<f64> {
    let n = expect_number(value, keyword, location)?;
    if n > 0.0 {
        Ok(n)
    } else {
        Err(SchemaError::InvalidStructure {
            message: format!("'{}' must be greater than 0", keyword),
            location: location.to_string(),
        })
    }
}

/// Get a non-negative integer (`2.0` is accepted)
pub(super) fn expect_usize(value: &Value, keyword: &str, location: &str) -> SchemaResult<usize> {
    let as_integer = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    });
    as_integer
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(keyword, "a non-negative integer", value, location))
}

/// Get a boolean
pub(super) fn expect_bool(value: &Value, keyword: &str, location: &str) -> SchemaResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(keyword, "a boolean", value, location))
}

/// Get a string
pub(super) fn expect_string<'a>(
    value: &'a Value,
    keyword: &str,
    location: &str,
) -> SchemaResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(keyword, "a string", value, location))
}

/// Get an array
pub(super) fn expect_array<'a>(
    value: &'a Value,
    keyword: &str,
    location: &str,
) -> SchemaResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| invalid(keyword, "an array", value, location))
}

/// Get an object
pub(super) fn expect_object<'a>(
    value: &'a Value,
    keyword: &str,
    location: &str,
) -> SchemaResult<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| invalid(keyword, "an object", value, location))
}

/// Get an array of strings
pub(super) fn expect_string_array(
    value: &Value,
    keyword: &str,
    location: &str,
) -> SchemaResult<Vec<String>> {
    expect_array(value, keyword, location)?
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                SchemaError::InvalidStructure {
                    message: format!("'{}' items must be strings", keyword),
                    location: location.to_string(),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_child_location_escapes() {
        assert_eq!(child_location("#", "properties"), "#/properties");
        assert_eq!(child_location("#/properties", "a/b"), "#/properties/a~1b");
    }

    #[test]
    fn test_expect_usize() {
        assert_eq!(expect_usize(&json!(3), "minItems", "#").unwrap(), 3);
        assert_eq!(expect_usize(&json!(3.0), "minItems", "#").unwrap(), 3);
        assert!(expect_usize(&json!(-1), "minItems", "#").is_err());
        assert!(expect_usize(&json!(1.5), "minItems", "#").is_err());
        assert!(expect_usize(&json!("3"), "minItems", "#").is_err());
    }

    #[test]
    fn test_expect_positive_number() {
        assert_eq!(expect_positive_number(&json!(0.5), "multipleOf", "#").unwrap(), 0.5);
        assert!(expect_positive_number(&json!(0), "multipleOf", "#").is_err());
    }

    #[test]
    fn test_error_message_names_keyword_and_type() {
        let err = expect_string(&json!(1), "$ref", "#/properties/a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid schema structure at #/properties/a: '$ref' must be a string, got number"
        );
    }

    #[test]
    fn test_expect_string_array() {
        assert_eq!(
            expect_string_array(&json!(["a", "b"]), "required", "#").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(expect_string_array(&json!(["a", 1]), "required", "#").is_err());
    }
}
