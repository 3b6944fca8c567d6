// JSON validation engine

use crate::collector::{ErrorCollector, Flow};
use crate::compiler::{CompiledSchema, NodeId, SchemaNode};
use crate::error::{ValidationError, ValidationErrorKind};
use crate::keywords::validate_node;
use crate::options::ValidatorOptions;
use crate::path::{InstancePath, PathSegment};
use serde_json::Value;

/// A compiled schema, ready to validate instances.
///
/// A `Validator` is immutable after compilation: every `validate` call gets
/// its own path and error state, so one validator can be shared across
/// threads.
///
/// # Example
///
/// ```
/// use jsv_validation::{compile, Schema, ValidatorOptions};
/// use serde_json::json;
///
/// let schema = Schema::from_json(&json!({
///     "properties": {"foo": {"type": "number"}},
/// }))
/// .unwrap();
/// let validator = compile(&schema, ValidatorOptions::default()).unwrap();
///
/// let result = validator.validate(&json!({"foo": "bar"}));
/// assert!(!result.is_valid());
/// assert_eq!(result.errors()[0].data_path, ".foo");
/// assert_eq!(result.errors()[0].message, "should be number");
/// ```
#[derive(Debug)]
pub struct Validator {
    nodes: Vec<SchemaNode>,
    root: NodeId,
    options: ValidatorOptions,
}

impl Validator {
    pub(crate) fn new(compiled: CompiledSchema, options: ValidatorOptions) -> Self {
        Self {
            nodes: compiled.nodes,
            root: compiled.root,
            options,
        }
    }

    /// Validate an instance, reporting errors per the validator's options
    pub fn validate(&self, instance: &Value) -> ValidationResult {
        let mut context = ValidationContext::new(self, self.options.collect_all_errors);
        let _ = validate_node(instance, self.root, &mut context);
        let errors = context.into_errors();
        tracing::trace!(errors = errors.len(), "Validated instance");
        ValidationResult { errors }
    }

    /// Validity only; stops at the first failure regardless of options
    pub fn is_valid(&self, instance: &Value) -> bool {
        let mut context = ValidationContext::new(self, false);
        validate_node(instance, self.root, &mut context).is_continue() && context.errors.is_empty()
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Number of compiled schema nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// A session that keeps the errors of its latest validation
    pub fn session(&self) -> ValidationSession<'_> {
        ValidationSession {
            validator: self,
            last: None,
        }
    }
}

/// Outcome of one validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in report order; empty when valid
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// `Ok(())` when valid, otherwise the error list
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// `null` when valid, otherwise an array of error objects
    pub fn to_json(&self) -> Value {
        if self.errors.is_empty() {
            Value::Null
        } else {
            Value::Array(self.errors.iter().map(ValidationError::to_json).collect())
        }
    }
}

/// Validate-then-inspect wrapper around a shared [`Validator`].
///
/// ```
/// use jsv_validation::{compile, Schema, ValidatorOptions};
/// use serde_json::json;
///
/// let schema = Schema::from_json(&json!({"required": ["id"]})).unwrap();
/// let validator = compile(&schema, ValidatorOptions::default()).unwrap();
///
/// let mut session = validator.session();
/// assert!(!session.validate(&json!({})));
/// assert_eq!(session.errors().map(|e| e.len()), Some(1));
/// assert!(session.validate(&json!({"id": 1})));
/// assert!(session.errors().is_none());
/// ```
#[derive(Debug)]
pub struct ValidationSession<'v> {
    validator: &'v Validator,
    last: Option<ValidationResult>,
}

impl<'v> ValidationSession<'v> {
    /// Validate and remember the outcome, replacing the previous one
    pub fn validate(&mut self, instance: &Value) -> bool {
        let result = self.validator.validate(instance);
        let valid = result.is_valid();
        self.last = Some(result);
        valid
    }

    /// Errors of the latest validation; `None` if it passed or none ran yet
    pub fn errors(&self) -> Option<&[ValidationError]> {
        self.last
            .as_ref()
            .filter(|result| !result.is_valid())
            .map(ValidationResult::errors)
    }

    pub fn validator(&self) -> &'v Validator {
        self.validator
    }
}

/// Validation context tracks state during one validation
pub(crate) struct ValidationContext<'a> {
    nodes: &'a [SchemaNode],
    options: &'a ValidatorOptions,
    /// Current instance path (e.g., [foo, 0, bar])
    instance_path: InstancePath,
    errors: ErrorCollector,
}

impl<'a> ValidationContext<'a> {
    fn new(validator: &'a Validator, collect_all: bool) -> Self {
        Self {
            nodes: &validator.nodes,
            options: &validator.options,
            instance_path: InstancePath::new(),
            errors: ErrorCollector::new(collect_all),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &'a SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn options(&self) -> &'a ValidatorOptions {
        self.options
    }

    /// Build an error at the current instance path
    pub(crate) fn error(&self, kind: ValidationErrorKind, schema_path: String) -> ValidationError {
        ValidationError::new(
            kind,
            self.instance_path.clone(),
            self.options.path_notation,
            schema_path,
        )
    }

    /// Report an error at the current instance path
    pub(crate) fn report(&mut self, kind: ValidationErrorKind, schema_path: String) -> Flow {
        let error = self.error(kind, schema_path);
        self.errors.report(error)
    }

    pub(crate) fn push_error(&mut self, error: ValidationError) -> Flow {
        self.errors.report(error)
    }

    /// Execute a function with a new instance path segment
    pub(crate) fn with_instance_path<F>(&mut self, segment: PathSegment, f: F) -> Flow
    where
        F: FnOnce(&mut Self) -> Flow,
    {
        self.instance_path.push(segment);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    pub(crate) fn mark(&self) -> usize {
        self.errors.mark()
    }

    pub(crate) fn take_since(&mut self, mark: usize) -> Vec<ValidationError> {
        self.errors.take_since(mark)
    }

    pub(crate) fn restore(&mut self, errors: Vec<ValidationError>) {
        self.errors.restore(errors)
    }

    pub(crate) fn collects_all(&self) -> bool {
        self.errors.collects_all()
    }

    fn into_errors(self) -> Vec<ValidationError> {
        self.errors.into_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::options::RequiredErrorMode;
    use crate::schema::Schema;
    use serde_json::json;

    fn validator(schema: Value, options: ValidatorOptions) -> Validator {
        compile(&Schema::from_json(&schema).unwrap(), options).unwrap()
    }

    fn data_paths(result: &ValidationResult) -> Vec<&str> {
        result.errors().iter().map(|e| e.data_path.as_str()).collect()
    }

    #[test]
    fn test_validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
    }

    #[test]
    fn test_valid_instance_has_no_errors() {
        let v = validator(json!({"type": "object"}), ValidatorOptions::default());
        let result = v.validate(&json!({}));
        assert!(result.is_valid());
        assert_eq!(result.to_json(), Value::Null);
        assert_eq!(result.into_result(), Ok(()));
    }

    #[test]
    fn test_fail_fast_reports_one_error() {
        let schema = json!({"properties": {"a": {"type": "string"}, "b": {"type": "string"}}});
        let v = validator(schema, ValidatorOptions::default());
        let result = v.validate(&json!({"a": 1, "b": 2}));
        assert_eq!(data_paths(&result), vec![".a"]);
    }

    #[test]
    fn test_collect_all_reports_every_error() {
        let schema = json!({"properties": {"a": {"type": "string"}, "b": {"type": "string"}}});
        let v = validator(schema, ValidatorOptions::new().with_all_errors());
        let result = v.validate(&json!({"a": 1, "b": 2}));
        assert_eq!(data_paths(&result), vec![".a", ".b"]);
    }

    #[test]
    fn test_is_valid_ignores_collect_all() {
        let v = validator(
            json!({"items": {"type": "integer"}}),
            ValidatorOptions::new().with_all_errors(),
        );
        assert!(v.is_valid(&json!([1, 2, 3])));
        assert!(!v.is_valid(&json!([1, "2", 3.5])));
    }

    #[test]
    fn test_schema_paths() {
        let v = validator(
            json!({
                "definitions": {"int": {"type": "integer"}},
                "properties": {"a": {"$ref": "#/definitions/int"}, "b": false},
            }),
            ValidatorOptions::new().with_all_errors(),
        );
        let result = v.validate(&json!({"a": "x", "b": 1}));
        let schema_paths: Vec<_> = result.errors().iter().map(|e| e.schema_path.as_str()).collect();
        assert_eq!(schema_paths, vec!["#/definitions/int/type", "#/properties/b"]);
    }

    #[test]
    fn test_required_modes() {
        let schema = json!({"required": ["foo"]});

        let root = validator(schema.clone(), ValidatorOptions::default());
        let error = &root.validate(&json!({})).into_errors()[0];
        assert_eq!(error.data_path, "");
        assert_eq!(error.message, "should have required property 'foo'");

        let property = validator(
            schema,
            ValidatorOptions::new()
                .with_json_pointers()
                .with_required_error_mode(RequiredErrorMode::Property),
        );
        let error = &property.validate(&json!({})).into_errors()[0];
        assert_eq!(error.data_path, "/foo");
        assert_eq!(error.message, "is a required property");
        assert_eq!(error.keyword(), "required");
    }

    #[test]
    fn test_any_of_withdraws_errors_when_a_branch_passes() {
        let v = validator(
            json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}),
            ValidatorOptions::new().with_all_errors(),
        );
        assert!(v.validate(&json!(3)).is_valid());

        let result = v.validate(&json!(1.5));
        let keywords: Vec<_> = result.errors().iter().map(ValidationError::keyword).collect();
        assert_eq!(keywords, vec!["type", "type", "anyOf"]);
    }

    #[test]
    fn test_any_of_fail_fast_reports_only_any_of() {
        let v = validator(
            json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}),
            ValidatorOptions::default(),
        );
        let result = v.validate(&json!(1.5));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].keyword(), "anyOf");
    }

    #[test]
    fn test_session_tracks_latest_result() {
        let v = validator(json!({"type": "string"}), ValidatorOptions::default());
        let mut session = v.session();
        assert!(session.errors().is_none());

        assert!(!session.validate(&json!(1)));
        assert_eq!(session.errors().unwrap()[0].message, "should be string");

        assert!(session.validate(&json!("ok")));
        assert!(session.errors().is_none());
    }

    #[test]
    fn test_node_count() {
        let v = validator(
            json!({"properties": {"a": {}, "b": {}}}),
            ValidatorOptions::default(),
        );
        assert_eq!(v.node_count(), 3);
    }
}
