//! Schema parsing entry point
//!
//! Builds a [`Schema`] from a `serde_json::Value`:
//! - `true` / `false`: boolean schemas
//! - objects: keyword schemas, keywords kept in document order
//!
//! Annotation keywords are skipped silently, unknown keywords with a debug
//! log. Keyword values of the wrong shape are errors.

use crate::error::{SchemaError, SchemaResult};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::Schema;
use super::helpers::{
    child_location, expect_array, expect_bool, expect_number, expect_object,
    expect_positive_number, expect_string, expect_string_array, expect_usize, json_type_name,
};
use super::types::{InstanceType, Items, Keyword, SchemaObject};

/// Keywords that carry no validation meaning
const ANNOTATIONS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
];

/// Parse the schema at document location `location` (`#` for the root)
pub(super) fn from_json(value: &Value, location: &str) -> SchemaResult<Schema> {
    match value {
        Value::Bool(b) => Ok(Schema::Bool(*b)),
        Value::Object(map) => parse_schema_object(map, location).map(Schema::Object),
        other => Err(SchemaError::InvalidStructure {
            message: format!("Expected schema object or boolean, got {}", json_type_name(other)),
            location: location.to_string(),
        }),
    }
}

fn parse_schema_object(map: &Map<String, Value>, location: &str) -> SchemaResult<SchemaObject> {
    let mut keywords = Vec::with_capacity(map.len());

    for (name, value) in map {
        let here = child_location(location, name);
        let keyword = match name.as_str() {
            "type" => Keyword::Type(parse_type(value, &here)?),
            "enum" => Keyword::Enum(expect_array(value, name, &here)?.clone()),

            "minimum" => Keyword::Minimum(expect_number(value, name, &here)?),
            "maximum" => Keyword::Maximum(expect_number(value, name, &here)?),
            "exclusiveMinimum" => Keyword::ExclusiveMinimum(expect_number(value, name, &here)?),
            "exclusiveMaximum" => Keyword::ExclusiveMaximum(expect_number(value, name, &here)?),
            "multipleOf" => Keyword::MultipleOf(expect_positive_number(value, name, &here)?),

            "minLength" => Keyword::MinLength(expect_usize(value, name, &here)?),
            "maxLength" => Keyword::MaxLength(expect_usize(value, name, &here)?),
            "pattern" => Keyword::Pattern(expect_string(value, name, &here)?.to_string()),

            "items" => Keyword::Items(parse_items(value, &here)?),
            "additionalItems" => Keyword::AdditionalItems(Box::new(from_json(value, &here)?)),
            "minItems" => Keyword::MinItems(expect_usize(value, name, &here)?),
            "maxItems" => Keyword::MaxItems(expect_usize(value, name, &here)?),
            "uniqueItems" => Keyword::UniqueItems(expect_bool(value, name, &here)?),

            "properties" => Keyword::Properties(parse_schema_map(value, name, &here)?),
            "patternProperties" => {
                Keyword::PatternProperties(parse_schema_map(value, name, &here)?)
            }
            "additionalProperties" => {
                Keyword::AdditionalProperties(Box::new(from_json(value, &here)?))
            }
            "required" => Keyword::Required(expect_string_array(value, name, &here)?),
            "minProperties" => Keyword::MinProperties(expect_usize(value, name, &here)?),
            "maxProperties" => Keyword::MaxProperties(expect_usize(value, name, &here)?),

            "allOf" => Keyword::AllOf(parse_schema_list(value, name, &here)?),
            "anyOf" => Keyword::AnyOf(parse_schema_list(value, name, &here)?),

            "$ref" => Keyword::Ref(expect_string(value, name, &here)?.to_string()),
            "definitions" => Keyword::Definitions(parse_schema_map(value, name, &here)?),

            annotation if ANNOTATIONS.contains(&annotation) => continue,
            unknown => {
                tracing::debug!(keyword = unknown, location, "Ignoring unknown schema keyword");
                continue;
            }
        };
        keywords.push(keyword);
    }

    Ok(SchemaObject { keywords })
}

/// `type: "string"` or `type: ["string", "null"]`
fn parse_type(value: &Value, location: &str) -> SchemaResult<Vec<InstanceType>> {
    let names: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| expect_string(item, "type", location))
            .collect::<SchemaResult<_>>()?,
        other => {
            return Err(SchemaError::InvalidStructure {
                message: format!(
                    "'type' must be a string or an array of strings, got {}",
                    json_type_name(other)
                ),
                location: location.to_string(),
            });
        }
    };

    names
        .into_iter()
        .map(|name| {
            InstanceType::from_name(name).ok_or_else(|| SchemaError::InvalidType {
                name: name.to_string(),
                location: location.to_string(),
            })
        })
        .collect()
}

/// `items: {schema}` or `items: [{schema}, ...]`
fn parse_items(value: &Value, location: &str) -> SchemaResult<Items> {
    match value {
        Value::Array(schemas) => schemas
            .iter()
            .enumerate()
            .map(|(i, s)| from_json(s, &child_location(location, &i.to_string())))
            .collect::<SchemaResult<Vec<_>>>()
            .map(Items::Tuple),
        single => Ok(Items::Single(Box::new(from_json(single, location)?))),
    }
}

/// `allOf` / `anyOf`: a non-empty array of schemas
fn parse_schema_list(value: &Value, keyword: &str, location: &str) -> SchemaResult<Vec<Schema>> {
    let items = expect_array(value, keyword, location)?;
    if items.is_empty() {
        return Err(SchemaError::InvalidStructure {
            message: format!("'{}' must not be empty", keyword),
            location: location.to_string(),
        });
    }
    items
        .iter()
        .enumerate()
        .map(|(i, s)| from_json(s, &child_location(location, &i.to_string())))
        .collect()
}

/// `properties` / `patternProperties` / `definitions`: name → schema
fn parse_schema_map(
    value: &Value,
    keyword: &str,
    location: &str,
) -> SchemaResult<IndexMap<String, Schema>> {
    let entries = expect_object(value, keyword, location)?;
    let mut schemas = IndexMap::with_capacity(entries.len());
    for (key, schema) in entries {
        schemas.insert(key.clone(), from_json(schema, &child_location(location, key))?);
    }
    Ok(schemas)
}
