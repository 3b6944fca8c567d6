//! Validator configuration
//!
//! Options are fixed when a schema is compiled and captured by the resulting
//! [`Validator`](crate::Validator); they cannot change afterwards.

use crate::path::PathNotation;
use serde::{Deserialize, Serialize};

/// Where a missing `required` property error points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredErrorMode {
    /// At the object holding the property; the name only appears in the message
    #[default]
    Root,
    /// At the missing property itself
    Property,
}

/// Options controlling error collection and error path rendering
///
/// Deserializes from camelCase JSON; absent fields keep their defaults:
///
/// ```
/// use jsv_validation::{PathNotation, ValidatorOptions};
///
/// let options: ValidatorOptions =
///     serde_json::from_str(r#"{"allErrors": true, "pathNotation": "jsonPointer"}"#).unwrap();
/// assert!(options.collect_all_errors);
/// assert_eq!(options.path_notation, PathNotation::JsonPointer);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    /// Keep validating after the first failure and report every error
    #[serde(alias = "allErrors")]
    pub collect_all_errors: bool,
    /// Notation of `dataPath` strings
    pub path_notation: PathNotation,
    /// Location of missing-property errors
    pub required_error_mode: RequiredErrorMode,
}

impl ValidatorOptions {
    /// Fail-fast, legacy paths, required errors at the parent object
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all_errors(mut self) -> Self {
        self.collect_all_errors = true;
        self
    }

    pub fn with_json_pointers(mut self) -> Self {
        self.path_notation = PathNotation::JsonPointer;
        self
    }

    pub fn with_path_notation(mut self, notation: PathNotation) -> Self {
        self.path_notation = notation;
        self
    }

    pub fn with_required_error_mode(mut self, mode: RequiredErrorMode) -> Self {
        self.required_error_mode = mode;
        self
    }

    /// Whether validation stops at the first error
    pub fn fail_fast(&self) -> bool {
        !self.collect_all_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ValidatorOptions::new();
        assert!(options.fail_fast());
        assert_eq!(options.path_notation, PathNotation::Legacy);
        assert_eq!(options.required_error_mode, RequiredErrorMode::Root);
    }

    #[test]
    fn test_builder() {
        let options = ValidatorOptions::new()
            .with_all_errors()
            .with_json_pointers()
            .with_required_error_mode(RequiredErrorMode::Property);
        assert!(!options.fail_fast());
        assert_eq!(options.path_notation, PathNotation::JsonPointer);
        assert_eq!(options.required_error_mode, RequiredErrorMode::Property);

        let options = options.with_path_notation(PathNotation::Legacy);
        assert_eq!(options.path_notation, PathNotation::Legacy);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ValidatorOptions =
            serde_json::from_str(r#"{"requiredErrorMode": "property"}"#).unwrap();
        assert_eq!(options.required_error_mode, RequiredErrorMode::Property);
        assert!(options.fail_fast());

        let options: ValidatorOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ValidatorOptions::default());
    }

    #[test]
    fn test_deserialize_all_errors_alias() {
        let a: ValidatorOptions = serde_json::from_str(r#"{"allErrors": true}"#).unwrap();
        let b: ValidatorOptions = serde_json::from_str(r#"{"collectAllErrors": true}"#).unwrap();
        assert_eq!(a, b);
        assert!(a.collect_all_errors);
    }

    #[test]
    fn test_deserialize_rejects_unknown_notation() {
        let result: Result<ValidatorOptions, _> =
            serde_json::from_str(r#"{"pathNotation": "xpath"}"#);
        assert!(result.is_err());
    }
}
