// Error types for schema compilation and instance validation

use crate::path::{InstancePath, PathNotation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while reading or compiling a schema.
///
/// These are faults in the schema itself and are always reported before a
/// [`Validator`](crate::Validator) exists. `location` is the schema location
/// as a `#`-prefixed JSON Pointer (e.g. `#/properties/foo`).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Unknown name in a `type` keyword
    #[error("Invalid schema type '{name}' at {location}")]
    InvalidType { name: String, location: String },

    /// Keyword value of the wrong shape
    #[error("Invalid schema structure at {location}: {message}")]
    InvalidStructure { message: String, location: String },

    /// `pattern` or `patternProperties` key that is not a valid regex
    #[error("Invalid regex pattern '{pattern}' at {location}: {source}")]
    InvalidPattern {
        pattern: String,
        location: String,
        source: regex::Error,
    },

    /// `$ref` that does not name a schema in the document or registry
    #[error("Unresolved schema reference '{reference}' at {location}")]
    UnresolvedRef { reference: String, location: String },

    /// `$ref`/`allOf`/`anyOf` chain that returns to a schema without
    /// descending into the instance
    #[error("Circular schema reference at {location}")]
    CircularReference { location: String },
}

/// Result type for schema parsing and compilation
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Structured validation error kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidationErrorKind {
    /// Type mismatch
    TypeMismatch { expected: Vec<String>, got: String },

    /// Value not in enum
    InvalidEnumValue { allowed: Vec<serde_json::Value> },

    /// Number out of range; exactly one bound is set
    NumberOutOfRange {
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
        exclusive_minimum: Option<f64>,
        exclusive_maximum: Option<f64>,
    },

    /// Number not a multiple of
    NumberNotMultipleOf { value: f64, multiple_of: f64 },

    /// String length invalid; exactly one bound is set
    StringLengthInvalid {
        length: usize,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },

    /// String doesn't match pattern
    StringPatternMismatch { value: String, pattern: String },

    /// Array length invalid; exactly one bound is set
    ArrayLengthInvalid {
        length: usize,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },

    /// Elements past a closed tuple
    AdditionalItems { limit: usize },

    /// Items `j` and `i` (j < i) are equal
    ArrayItemsNotUnique { i: usize, j: usize },

    /// Missing required property
    MissingRequiredProperty { property: String },

    /// Property not allowed by `additionalProperties: false`
    AdditionalProperty { property: String },

    /// Object property count invalid; exactly one bound is set
    ObjectPropertyCountInvalid {
        count: usize,
        min_properties: Option<usize>,
        max_properties: Option<usize>,
    },

    /// No `anyOf` branch matched
    NoMatchingSchema,

    /// The `false` schema
    FalseSchema,
}

impl ValidationErrorKind {
    /// The schema keyword that produced this error
    pub fn keyword(&self) -> &'static str {
        match self {
            ValidationErrorKind::TypeMismatch { .. } => "type",
            ValidationErrorKind::InvalidEnumValue { .. } => "enum",
            ValidationErrorKind::NumberOutOfRange {
                minimum,
                maximum,
                exclusive_minimum,
                ..
            } => {
                if minimum.is_some() {
                    "minimum"
                } else if maximum.is_some() {
                    "maximum"
                } else if exclusive_minimum.is_some() {
                    "exclusiveMinimum"
                } else {
                    "exclusiveMaximum"
                }
            }
            ValidationErrorKind::NumberNotMultipleOf { .. } => "multipleOf",
            ValidationErrorKind::StringLengthInvalid { min_length, .. } => {
                if min_length.is_some() {
                    "minLength"
                } else {
                    "maxLength"
                }
            }
            ValidationErrorKind::StringPatternMismatch { .. } => "pattern",
            ValidationErrorKind::ArrayLengthInvalid { min_items, .. } => {
                if min_items.is_some() {
                    "minItems"
                } else {
                    "maxItems"
                }
            }
            ValidationErrorKind::AdditionalItems { .. } => "additionalItems",
            ValidationErrorKind::ArrayItemsNotUnique { .. } => "uniqueItems",
            ValidationErrorKind::MissingRequiredProperty { .. } => "required",
            ValidationErrorKind::AdditionalProperty { .. } => "additionalProperties",
            ValidationErrorKind::ObjectPropertyCountInvalid { min_properties, .. } => {
                if min_properties.is_some() {
                    "minProperties"
                } else {
                    "maxProperties"
                }
            }
            ValidationErrorKind::NoMatchingSchema => "anyOf",
            ValidationErrorKind::FalseSchema => "false schema",
        }
    }

    /// Format a human-readable message from this error kind
    pub fn message(&self) -> String {
        match self {
            ValidationErrorKind::TypeMismatch { expected, .. } => {
                format!("should be {}", expected.join(","))
            }
            ValidationErrorKind::InvalidEnumValue { .. } => {
                "should be equal to one of the allowed values".to_string()
            }
            ValidationErrorKind::NumberOutOfRange {
                minimum,
                maximum,
                exclusive_minimum,
                exclusive_maximum,
                ..
            } => {
                if let Some(min) = minimum {
                    format!("should be >= {}", min)
                } else if let Some(max) = maximum {
                    format!("should be <= {}", max)
                } else if let Some(min) = exclusive_minimum {
                    format!("should be > {}", min)
                } else if let Some(max) = exclusive_maximum {
                    format!("should be < {}", max)
                } else {
                    "should be in range".to_string()
                }
            }
            ValidationErrorKind::NumberNotMultipleOf { multiple_of, .. } => {
                format!("should be multiple of {}", multiple_of)
            }
            ValidationErrorKind::StringLengthInvalid {
                min_length,
                max_length,
                ..
            } => match (min_length, max_length) {
                (Some(min), _) => format!("should NOT be shorter than {} characters", min),
                (None, Some(max)) => format!("should NOT be longer than {} characters", max),
                (None, None) => "should have a valid length".to_string(),
            },
            ValidationErrorKind::StringPatternMismatch { pattern, .. } => {
                format!("should match pattern \"{}\"", pattern)
            }
            ValidationErrorKind::ArrayLengthInvalid {
                min_items,
                max_items,
                ..
            } => match (min_items, max_items) {
                (Some(min), _) => format!("should NOT have less than {} items", min),
                (None, Some(max)) => format!("should NOT have more than {} items", max),
                (None, None) => "should have a valid number of items".to_string(),
            },
            ValidationErrorKind::AdditionalItems { limit } => {
                format!("should NOT have more than {} items", limit)
            }
            ValidationErrorKind::ArrayItemsNotUnique { i, j } => format!(
                "should NOT have duplicate items (items ## {} and {} are identical)",
                j, i
            ),
            ValidationErrorKind::MissingRequiredProperty { property } => {
                format!("should have required property '{}'", property)
            }
            ValidationErrorKind::AdditionalProperty { .. } => {
                "should NOT have additional properties".to_string()
            }
            ValidationErrorKind::ObjectPropertyCountInvalid {
                min_properties,
                max_properties,
                ..
            } => match (min_properties, max_properties) {
                (Some(min), _) => format!("should NOT have less than {} properties", min),
                (None, Some(max)) => format!("should NOT have more than {} properties", max),
                (None, None) => "should have a valid number of properties".to_string(),
            },
            ValidationErrorKind::NoMatchingSchema => {
                "should match some schema in anyOf".to_string()
            }
            ValidationErrorKind::FalseSchema => "boolean schema is false".to_string(),
        }
    }
}

/// One failed keyword check, located in both the instance and the schema
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    /// The structured error kind
    pub kind: ValidationErrorKind,
    /// Segments leading to the failing value
    pub instance_path: InstancePath,
    /// `instance_path` rendered in the validator's notation
    pub data_path: String,
    /// Location of the failing keyword (e.g. `#/definitions/num/type`)
    pub schema_path: String,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data_path.is_empty() {
            write!(f, "Validation error at (root): {}", self.message)
        } else {
            write!(f, "Validation error at {}: {}", self.data_path, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error, rendering the path and the default message
    pub fn new(
        kind: ValidationErrorKind,
        instance_path: InstancePath,
        notation: PathNotation,
        schema_path: impl Into<String>,
    ) -> Self {
        let data_path = instance_path.render(notation);
        let message = kind.message();
        Self {
            kind,
            instance_path,
            data_path,
            schema_path: schema_path.into(),
            message,
        }
    }

    /// Replace the default message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// The schema keyword that failed
    pub fn keyword(&self) -> &'static str {
        self.kind.keyword()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Machine-readable form: `keyword`, `dataPath`, `schemaPath`, `message`, `params`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "keyword": self.keyword(),
            "dataPath": self.data_path,
            "schemaPath": self.schema_path,
            "message": self.message,
            "params": self.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSegment;

    fn range(minimum: Option<f64>, maximum: Option<f64>) -> ValidationErrorKind {
        ValidationErrorKind::NumberOutOfRange {
            value: 1.0,
            minimum,
            maximum,
            exclusive_minimum: None,
            exclusive_maximum: None,
        }
    }

    #[test]
    fn test_number_messages() {
        assert_eq!(range(Some(10.0), None).message(), "should be >= 10");
        assert_eq!(range(Some(10.0), None).keyword(), "minimum");
        assert_eq!(range(None, Some(2.5)).message(), "should be <= 2.5");
        assert_eq!(range(None, Some(2.5)).keyword(), "maximum");

        let kind = ValidationErrorKind::NumberOutOfRange {
            value: 1.0,
            minimum: None,
            maximum: None,
            exclusive_minimum: Some(-3.0),
            exclusive_maximum: None,
        };
        assert_eq!(kind.message(), "should be > -3");
        assert_eq!(kind.keyword(), "exclusiveMinimum");
    }

    #[test]
    fn test_type_message_joins_types() {
        let kind = ValidationErrorKind::TypeMismatch {
            expected: vec!["integer".to_string(), "null".to_string()],
            got: "string".to_string(),
        };
        assert_eq!(kind.message(), "should be integer,null");
        assert_eq!(kind.keyword(), "type");
    }

    #[test]
    fn test_unique_items_message_orders_indices() {
        let kind = ValidationErrorKind::ArrayItemsNotUnique { i: 4, j: 1 };
        assert_eq!(
            kind.message(),
            "should NOT have duplicate items (items ## 1 and 4 are identical)"
        );
    }

    #[test]
    fn test_validation_error_renders_path() {
        let path = InstancePath::from(vec![
            PathSegment::Key("foo".to_string()),
            PathSegment::Index(2),
        ]);
        let error = ValidationError::new(
            range(Some(10.0), None),
            path.clone(),
            PathNotation::Legacy,
            "#/properties/foo/items/minimum",
        );
        assert_eq!(error.data_path, ".foo[2]");
        assert_eq!(error.keyword(), "minimum");
        assert_eq!(error.to_string(), "Validation error at .foo[2]: should be >= 10");

        let error = ValidationError::new(
            range(Some(10.0), None),
            path,
            PathNotation::JsonPointer,
            "#/properties/foo/items/minimum",
        );
        assert_eq!(error.data_path, "/foo/2");
    }

    #[test]
    fn test_with_message_overrides_default() {
        let error = ValidationError::new(
            ValidationErrorKind::MissingRequiredProperty {
                property: "foo".to_string(),
            },
            InstancePath::new(),
            PathNotation::Legacy,
            "#/required",
        );
        assert_eq!(error.message(), "should have required property 'foo'");
        assert_eq!(error.to_string(), "Validation error at (root): should have required property 'foo'");

        let error = error.with_message("is a required property");
        assert_eq!(error.message(), "is a required property");
        assert_eq!(error.keyword(), "required");
    }

    #[test]
    fn test_to_json_shape() {
        let error = ValidationError::new(
            ValidationErrorKind::AdditionalProperty {
                property: "baz".to_string(),
            },
            InstancePath::from(vec![PathSegment::Key("baz".to_string())]),
            PathNotation::JsonPointer,
            "#/additionalProperties",
        );
        let json = error.to_json();
        assert_eq!(json["keyword"], "additionalProperties");
        assert_eq!(json["dataPath"], "/baz");
        assert_eq!(json["schemaPath"], "#/additionalProperties");
        assert_eq!(json["message"], "should NOT have additional properties");
        assert_eq!(json["params"]["type"], "AdditionalProperty");
        assert_eq!(json["params"]["data"]["property"], "baz");
    }

    #[test]
    fn test_schema_error_display() {
        let error = SchemaError::UnresolvedRef {
            reference: "#/definitions/missing".to_string(),
            location: "#/properties/foo".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unresolved schema reference '#/definitions/missing' at #/properties/foo"
        );
    }
}
