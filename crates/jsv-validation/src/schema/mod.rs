//! Schema object model
//!
//! A [`Schema`] is either a boolean schema or an ordered list of keyword
//! constraints. Schemas are plain trees: `$ref` is kept as a string here and
//! only becomes a link between nodes when the schema is compiled (see
//! [`crate::compiler`]). That keeps recursive schemas expressible without
//! reference cycles in memory.

use crate::error::SchemaResult;
use serde_json::Value;
use std::collections::HashMap;

// Internal modules
pub(crate) mod helpers;
mod parser;
mod types;

// Public re-exports
pub use types::{InstanceType, Items, Keyword, SchemaObject};

/// A JSON schema
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// `true` accepts every instance, `false` rejects every instance
    Bool(bool),
    /// Keyword constraints in declaration order
    Object(SchemaObject),
}

impl Schema {
    /// Parse a Schema from a JSON document.
    ///
    /// # Example
    ///
    /// ```
    /// use jsv_validation::Schema;
    /// use serde_json::json;
    ///
    /// let schema = Schema::from_json(&json!({
    ///     "type": "object",
    ///     "required": ["id"],
    /// }))
    /// .unwrap();
    /// assert!(schema.keyword("required").is_some());
    /// ```
    pub fn from_json(value: &Value) -> SchemaResult<Schema> {
        parser::from_json(value, "#")
    }

    /// Keywords of an object schema; empty for boolean schemas
    pub fn keywords(&self) -> &[Keyword] {
        match self {
            Schema::Bool(_) => &[],
            Schema::Object(obj) => &obj.keywords,
        }
    }

    /// Find a keyword by name
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords().iter().find(|k| k.name() == name)
    }

    /// Resolve a JSON Pointer (without the leading `#`) to a subschema.
    ///
    /// Only steps through schema-valued keywords: `properties/<name>`,
    /// `definitions/<name>`, `items`, `items/<i>`, `allOf/<i>`, ...
    pub fn pointer(&self, tokens: &[String]) -> Option<&Schema> {
        let Some((first, rest)) = tokens.split_first() else {
            return Some(self);
        };
        let keyword = self.keyword(first)?;
        let (child, rest) = match keyword {
            Keyword::Items(Items::Single(schema))
            | Keyword::AdditionalItems(schema)
            | Keyword::AdditionalProperties(schema) => (schema.as_ref(), rest),
            Keyword::Items(Items::Tuple(schemas))
            | Keyword::AllOf(schemas)
            | Keyword::AnyOf(schemas) => {
                let (index, rest) = rest.split_first()?;
                let index: usize = index.parse().ok()?;
                (schemas.get(index)?, rest)
            }
            Keyword::Properties(map)
            | Keyword::PatternProperties(map)
            | Keyword::Definitions(map) => {
                let (name, rest) = rest.split_first()?;
                (map.get(name)?, rest)
            }
            _ => return None,
        };
        child.pointer(rest)
    }
}

/// Schema registry for `$ref`s that name another document by id
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create a new empty schema registry
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Register a schema with an ID
    pub fn register(&mut self, id: impl Into<String>, schema: Schema) {
        self.schemas.insert(id.into(), schema);
    }

    /// Resolve a schema id
    pub fn resolve(&self, id: &str) -> Option<&Schema> {
        self.schemas.get(id)
    }

    /// Get all registered schema IDs
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.schemas.keys()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
