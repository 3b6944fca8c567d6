// Keyword checks

use crate::collector::Flow;
use crate::compiler::{Additional, Check, NodeId, SchemaNode};
use crate::error::ValidationErrorKind;
use crate::options::RequiredErrorMode;
use crate::path::PathSegment;
use crate::schema::InstanceType;
use crate::validator::ValidationContext;
use serde_json::{Map, Value};
use std::ops::ControlFlow;

const CONTINUE: Flow = ControlFlow::Continue(());

/// Run every check of `id` against `value`, in declaration order
pub(crate) fn validate_node(value: &Value, id: NodeId, ctx: &mut ValidationContext<'_>) -> Flow {
    let node = ctx.node(id);
    for check in &node.checks {
        validate_check(value, node, check, ctx)?;
    }
    CONTINUE
}

fn validate_check(
    value: &Value,
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    match check {
        Check::False => ctx.report(ValidationErrorKind::FalseSchema, node.location.clone()),
        Check::Type(types) => validate_type(value, types, node, ctx),
        Check::Enum(allowed) => {
            if allowed.iter().any(|candidate| json_equal(candidate, value)) {
                CONTINUE
            } else {
                ctx.report(
                    ValidationErrorKind::InvalidEnumValue {
                        allowed: allowed.clone(),
                    },
                    schema_path(node, check),
                )
            }
        }
        Check::Minimum(_)
        | Check::Maximum(_)
        | Check::ExclusiveMinimum(_)
        | Check::ExclusiveMaximum(_)
        | Check::MultipleOf(_) => match value.as_f64() {
            Some(num) => validate_number(num, node, check, ctx),
            None => CONTINUE,
        },
        Check::MinLength(_) | Check::MaxLength(_) | Check::Pattern(_) => match value {
            Value::String(s) => validate_string(s, node, check, ctx),
            _ => CONTINUE,
        },
        Check::Items(_)
        | Check::TupleItems(_)
        | Check::AdditionalItems { .. }
        | Check::MinItems(_)
        | Check::MaxItems(_)
        | Check::UniqueItems => match value {
            Value::Array(items) => validate_array(items, node, check, ctx),
            _ => CONTINUE,
        },
        Check::Properties(_)
        | Check::PatternProperties(_)
        | Check::AdditionalProperties { .. }
        | Check::Required(_)
        | Check::MinProperties(_)
        | Check::MaxProperties(_) => match value {
            Value::Object(map) => validate_object(map, node, check, ctx),
            _ => CONTINUE,
        },
        Check::AllOf(branches) => {
            for branch in branches {
                validate_node(value, *branch, ctx)?;
            }
            CONTINUE
        }
        Check::AnyOf(branches) => validate_any_of(value, branches, node, check, ctx),
        Check::Ref(target) => validate_node(value, *target, ctx),
    }
}

/// `#/properties/foo` + `type` → `#/properties/foo/type`
fn schema_path(node: &SchemaNode, check: &Check) -> String {
    format!("{}/{}", node.location, check.keyword())
}

fn validate_type(
    value: &Value,
    types: &[InstanceType],
    node: &SchemaNode,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    if types.iter().any(|t| t.matches(value)) {
        return CONTINUE;
    }
    let got = InstanceType::of(value);
    ctx.report(
        ValidationErrorKind::TypeMismatch {
            expected: types.iter().map(|t| t.as_str().to_string()).collect(),
            got: got.as_str().to_string(),
        },
        format!("{}/type", node.location),
    )
}

/// Validate a number value
fn validate_number(
    num: f64,
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    let out_of_range = |minimum, maximum, exclusive_minimum, exclusive_maximum| {
        ValidationErrorKind::NumberOutOfRange {
            value: num,
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
        }
    };

    let kind = match *check {
        Check::Minimum(min) if num < min => out_of_range(Some(min), None, None, None),
        Check::Maximum(max) if num > max => out_of_range(None, Some(max), None, None),
        Check::ExclusiveMinimum(min) if num <= min => out_of_range(None, None, Some(min), None),
        Check::ExclusiveMaximum(max) if num >= max => out_of_range(None, None, None, Some(max)),
        Check::MultipleOf(multiple) if !is_multiple_of(num, multiple) => {
            ValidationErrorKind::NumberNotMultipleOf {
                value: num,
                multiple_of: multiple,
            }
        }
        _ => return CONTINUE,
    };
    ctx.report(kind, schema_path(node, check))
}

/// Quotient must be integral, up to float rounding (`0.3 / 0.1`)
fn is_multiple_of(num: f64, multiple: f64) -> bool {
    let quotient = num / multiple;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0) * 4.0
}

/// Validate a string value
fn validate_string(
    s: &str,
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    // Length in characters, not bytes
    let length = || s.chars().count();

    let kind = match check {
        Check::MinLength(min) if length() < *min => ValidationErrorKind::StringLengthInvalid {
            length: length(),
            min_length: Some(*min),
            max_length: None,
        },
        Check::MaxLength(max) if length() > *max => ValidationErrorKind::StringLengthInvalid {
            length: length(),
            min_length: None,
            max_length: Some(*max),
        },
        Check::Pattern(pattern) if !pattern.regex.is_match(s) => {
            ValidationErrorKind::StringPatternMismatch {
                value: s.to_string(),
                pattern: pattern.source.clone(),
            }
        }
        _ => return CONTINUE,
    };
    ctx.report(kind, schema_path(node, check))
}

/// Validate an array value
fn validate_array(
    items: &[Value],
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    match check {
        Check::Items(child) => {
            for (i, item) in items.iter().enumerate() {
                ctx.with_instance_path(PathSegment::Index(i), |ctx| {
                    validate_node(item, *child, ctx)
                })?;
            }
            CONTINUE
        }
        Check::TupleItems(children) => {
            // Elements past the tuple are left to additionalItems
            for (i, (item, child)) in items.iter().zip(children).enumerate() {
                ctx.with_instance_path(PathSegment::Index(i), |ctx| {
                    validate_node(item, *child, ctx)
                })?;
            }
            CONTINUE
        }
        Check::AdditionalItems { tuple_len, rule } => {
            if items.len() <= *tuple_len {
                return CONTINUE;
            }
            match rule {
                Additional::Forbidden => ctx.report(
                    ValidationErrorKind::AdditionalItems { limit: *tuple_len },
                    schema_path(node, check),
                ),
                Additional::Schema(child) => {
                    for (i, item) in items.iter().enumerate().skip(*tuple_len) {
                        ctx.with_instance_path(PathSegment::Index(i), |ctx| {
                            validate_node(item, *child, ctx)
                        })?;
                    }
                    CONTINUE
                }
            }
        }
        Check::MinItems(min) if items.len() < *min => ctx.report(
            ValidationErrorKind::ArrayLengthInvalid {
                length: items.len(),
                min_items: Some(*min),
                max_items: None,
            },
            schema_path(node, check),
        ),
        Check::MaxItems(max) if items.len() > *max => ctx.report(
            ValidationErrorKind::ArrayLengthInvalid {
                length: items.len(),
                min_items: None,
                max_items: Some(*max),
            },
            schema_path(node, check),
        ),
        Check::UniqueItems => match find_duplicate(items) {
            Some((i, j)) => ctx.report(
                ValidationErrorKind::ArrayItemsNotUnique { i, j },
                schema_path(node, check),
            ),
            None => CONTINUE,
        },
        _ => CONTINUE,
    }
}

/// Last duplicated element `i` and the closest earlier `j` equal to it
fn find_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for i in (0..items.len()).rev() {
        for j in (0..i).rev() {
            if json_equal(&items[i], &items[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Validate an object value
fn validate_object(
    map: &Map<String, Value>,
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    match check {
        Check::Properties(properties) => {
            for (name, child) in properties {
                if let Some(property) = map.get(name) {
                    ctx.with_instance_path(PathSegment::Key(name.clone()), |ctx| {
                        validate_node(property, *child, ctx)
                    })?;
                }
            }
            CONTINUE
        }
        Check::PatternProperties(patterns) => {
            for (pattern, child) in patterns {
                for (key, property) in map {
                    if pattern.regex.is_match(key) {
                        ctx.with_instance_path(PathSegment::Key(key.clone()), |ctx| {
                            validate_node(property, *child, ctx)
                        })?;
                    }
                }
            }
            CONTINUE
        }
        Check::AdditionalProperties {
            declared,
            patterns,
            rule,
        } => {
            // Instance key order
            for (key, property) in map {
                if declared.contains(key) || patterns.iter().any(|p| p.is_match(key)) {
                    continue;
                }
                ctx.with_instance_path(PathSegment::Key(key.clone()), |ctx| match rule {
                    Additional::Forbidden => ctx.report(
                        ValidationErrorKind::AdditionalProperty {
                            property: key.clone(),
                        },
                        schema_path(node, check),
                    ),
                    Additional::Schema(child) => validate_node(property, *child, ctx),
                })?;
            }
            CONTINUE
        }
        Check::Required(names) => validate_required(map, names, node, check, ctx),
        Check::MinProperties(min) if map.len() < *min => ctx.report(
            ValidationErrorKind::ObjectPropertyCountInvalid {
                count: map.len(),
                min_properties: Some(*min),
                max_properties: None,
            },
            schema_path(node, check),
        ),
        Check::MaxProperties(max) if map.len() > *max => ctx.report(
            ValidationErrorKind::ObjectPropertyCountInvalid {
                count: map.len(),
                min_properties: None,
                max_properties: Some(*max),
            },
            schema_path(node, check),
        ),
        _ => CONTINUE,
    }
}

/// Missing properties are reported in declaration order. Where the error
/// points depends on [`RequiredErrorMode`]: the object itself, or the
/// missing property under it.
fn validate_required(
    map: &Map<String, Value>,
    names: &[String],
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    for name in names {
        if map.contains_key(name) {
            continue;
        }
        let kind = ValidationErrorKind::MissingRequiredProperty {
            property: name.clone(),
        };
        match ctx.options().required_error_mode {
            RequiredErrorMode::Root => ctx.report(kind, schema_path(node, check))?,
            RequiredErrorMode::Property => {
                ctx.with_instance_path(PathSegment::Key(name.clone()), |ctx| {
                    let error = ctx
                        .error(kind, schema_path(node, check))
                        .with_message("is a required property");
                    ctx.push_error(error)
                })?
            }
        }
    }
    CONTINUE
}

/// Each branch is probed on its own. A passing branch withdraws the errors
/// of the branches before it; if none pass, branch errors are kept only in
/// collect-all mode and an `anyOf` error follows them.
fn validate_any_of(
    value: &Value,
    branches: &[NodeId],
    node: &SchemaNode,
    check: &Check,
    ctx: &mut ValidationContext<'_>,
) -> Flow {
    let mark = ctx.mark();
    let mut branch_errors = Vec::new();
    for branch in branches {
        // A break here only ends this branch
        let _ = validate_node(value, *branch, ctx);
        let errors = ctx.take_since(mark);
        if errors.is_empty() {
            return CONTINUE;
        }
        branch_errors.extend(errors);
    }
    if ctx.collects_all() {
        ctx.restore(branch_errors);
    }
    ctx.report(ValidationErrorKind::NoMatchingSchema, schema_path(node, check))
}

/// JSON equality with numbers compared by value (`1 == 1.0`)
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| json_equal(value, other)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_equal_numbers() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!([1, {"a": 2.0}]), &json!([1.0, {"a": 2}])));
        assert!(!json_equal(&json!(1), &json!("1")));
        assert!(json_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
        assert!(!json_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(json_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn test_find_duplicate_reports_last_pair() {
        assert_eq!(find_duplicate(&[json!(1), json!(2), json!(3)]), None);
        assert_eq!(
            find_duplicate(&[json!(1), json!(2), json!(1), json!(2)]),
            Some((3, 1))
        );
        assert_eq!(find_duplicate(&[json!("a"), json!("a")]), Some((1, 0)));
    }

    #[test]
    fn test_is_multiple_of() {
        assert!(is_multiple_of(10.0, 5.0));
        assert!(is_multiple_of(0.3, 0.1));
        assert!(is_multiple_of(-4.0, 2.0));
        assert!(!is_multiple_of(7.0, 5.0));
        assert!(!is_multiple_of(0.35, 0.1));
    }
}
