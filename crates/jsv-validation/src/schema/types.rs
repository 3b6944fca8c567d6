//! Schema keyword definitions
//!
//! An object schema is an ordered list of [`Keyword`]s, kept in the order
//! they appear in the source document. Validation visits them in that order,
//! which fixes the order of reported errors at each node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::Schema;

/// JSON instance types usable in the `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    /// Any number without a fractional part
    Integer,
}

impl InstanceType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(InstanceType::Null),
            "boolean" => Some(InstanceType::Boolean),
            "object" => Some(InstanceType::Object),
            "array" => Some(InstanceType::Array),
            "number" => Some(InstanceType::Number),
            "string" => Some(InstanceType::String),
            "integer" => Some(InstanceType::Integer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Object => "object",
            InstanceType::Array => "array",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Integer => "integer",
        }
    }

    /// The most specific type of a value (`integer` for integral numbers)
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => InstanceType::Null,
            Value::Bool(_) => InstanceType::Boolean,
            Value::Object(_) => InstanceType::Object,
            Value::Array(_) => InstanceType::Array,
            Value::String(_) => InstanceType::String,
            Value::Number(n) if is_integral(n) => InstanceType::Integer,
            Value::Number(_) => InstanceType::Number,
        }
    }

    /// Whether `value` is an instance of this type
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (InstanceType::Null, Value::Null)
            | (InstanceType::Boolean, Value::Bool(_))
            | (InstanceType::Object, Value::Object(_))
            | (InstanceType::Array, Value::Array(_))
            | (InstanceType::Number, Value::Number(_))
            | (InstanceType::String, Value::String(_)) => true,
            (InstanceType::Integer, Value::Number(n)) => is_integral(n),
            _ => false,
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Value of the `items` keyword
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    /// One schema applied to every element
    Single(Box<Schema>),
    /// Positional schemas; element `i` is checked against schema `i`
    Tuple(Vec<Schema>),
}

/// A single schema keyword with its parsed value
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    Type(Vec<InstanceType>),
    Enum(Vec<Value>),
    Minimum(f64),
    Maximum(f64),
    ExclusiveMinimum(f64),
    ExclusiveMaximum(f64),
    MultipleOf(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(String),
    Items(Items),
    /// Only meaningful next to tuple-form `items`
    AdditionalItems(Box<Schema>),
    MinItems(usize),
    MaxItems(usize),
    UniqueItems(bool),
    Properties(IndexMap<String, Schema>),
    PatternProperties(IndexMap<String, Schema>),
    AdditionalProperties(Box<Schema>),
    Required(Vec<String>),
    MinProperties(usize),
    MaxProperties(usize),
    AllOf(Vec<Schema>),
    AnyOf(Vec<Schema>),
    Ref(String),
    Definitions(IndexMap<String, Schema>),
}

impl Keyword {
    /// The keyword's name as written in a schema document
    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Type(_) => "type",
            Keyword::Enum(_) => "enum",
            Keyword::Minimum(_) => "minimum",
            Keyword::Maximum(_) => "maximum",
            Keyword::ExclusiveMinimum(_) => "exclusiveMinimum",
            Keyword::ExclusiveMaximum(_) => "exclusiveMaximum",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::MinLength(_) => "minLength",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::Items(_) => "items",
            Keyword::AdditionalItems(_) => "additionalItems",
            Keyword::MinItems(_) => "minItems",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::UniqueItems(_) => "uniqueItems",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties(_) => "additionalProperties",
            Keyword::Required(_) => "required",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::Ref(_) => "$ref",
            Keyword::Definitions(_) => "definitions",
        }
    }
}

/// Object-form schema: keywords in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaObject {
    pub keywords: Vec<Keyword>,
}

impl SchemaObject {
    pub fn new(keywords: Vec<Keyword>) -> Self {
        Self { keywords }
    }

    /// Find a keyword by name
    pub fn get(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.name() == name)
    }

    /// The `$ref` target, if this schema is a reference
    pub fn reference(&self) -> Option<&str> {
        self.keywords.iter().find_map(|k| match k {
            Keyword::Ref(r) => Some(r.as_str()),
            _ => None,
        })
    }
}
