//! Schema compilation
//!
//! Compilation turns a [`Schema`] tree into a flat arena of nodes. Each node
//! holds the ordered list of checks to run against a value, and children are
//! referred to by [`NodeId`] handles. `$ref` becomes a handle to the target
//! node, so recursive schemas are just cycles between indices.
//!
//! Compilation resolves:
//! - `#`-fragment references within the same document
//! - references to documents in a [`SchemaRegistry`] (`id` or `id#/pointer`)
//! - regexes of `pattern` and `patternProperties`
//!
//! and rejects reference cycles that never descend into the instance
//! (e.g. `{"$ref": "#"}`), which could not terminate at validation time.

use crate::error::{SchemaError, SchemaResult};
use crate::options::ValidatorOptions;
use crate::path::parse_json_pointer;
use crate::schema::helpers::child_location;
use crate::schema::{InstanceType, Items, Keyword, Schema, SchemaObject, SchemaRegistry};
use crate::validator::Validator;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Compile a schema that only references itself
pub fn compile(schema: &Schema, options: ValidatorOptions) -> SchemaResult<Validator> {
    compile_with_registry(schema, &SchemaRegistry::new(), options)
}

/// Compile a schema whose `$ref`s may name documents in `registry`
pub fn compile_with_registry(
    schema: &Schema,
    registry: &SchemaRegistry,
    options: ValidatorOptions,
) -> SchemaResult<Validator> {
    let compiled = SchemaCompiler::new(schema, registry).compile()?;
    Ok(Validator::new(compiled, options))
}

/// Handle to a node in a compiled schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// Placeholder target for a `$ref` awaiting resolution
const UNRESOLVED: NodeId = NodeId(usize::MAX);

/// The checks of one schema, in declaration order
#[derive(Debug)]
pub(crate) struct SchemaNode {
    /// `#/properties/foo` (or `id#/...` for registry documents)
    pub(crate) location: String,
    pub(crate) checks: Vec<Check>,
}

/// A compiled regex with its source text
#[derive(Debug)]
pub(crate) struct Pattern {
    pub(crate) source: String,
    pub(crate) regex: Regex,
}

impl Pattern {
    fn new(source: &str, location: &str) -> SchemaResult<Self> {
        let regex = Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
            pattern: source.to_string(),
            location: location.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }
}

/// What to do with array elements or object properties not covered by
/// `items` / `properties` / `patternProperties`
#[derive(Debug)]
pub(crate) enum Additional {
    Forbidden,
    Schema(NodeId),
}

/// One compiled keyword check
#[derive(Debug)]
pub(crate) enum Check {
    False,
    Type(Vec<InstanceType>),
    Enum(Vec<Value>),
    Minimum(f64),
    Maximum(f64),
    ExclusiveMinimum(f64),
    ExclusiveMaximum(f64),
    MultipleOf(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(Pattern),
    Items(NodeId),
    TupleItems(Vec<NodeId>),
    AdditionalItems {
        tuple_len: usize,
        rule: Additional,
    },
    MinItems(usize),
    MaxItems(usize),
    UniqueItems,
    Properties(Vec<(String, NodeId)>),
    PatternProperties(Vec<(Pattern, NodeId)>),
    AdditionalProperties {
        declared: HashSet<String>,
        patterns: Vec<Regex>,
        rule: Additional,
    },
    Required(Vec<String>),
    MinProperties(usize),
    MaxProperties(usize),
    AllOf(Vec<NodeId>),
    AnyOf(Vec<NodeId>),
    Ref(NodeId),
}

impl Check {
    /// Keyword name used in schema paths; empty for the `false` schema
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            Check::False => "",
            Check::Type(_) => "type",
            Check::Enum(_) => "enum",
            Check::Minimum(_) => "minimum",
            Check::Maximum(_) => "maximum",
            Check::ExclusiveMinimum(_) => "exclusiveMinimum",
            Check::ExclusiveMaximum(_) => "exclusiveMaximum",
            Check::MultipleOf(_) => "multipleOf",
            Check::MinLength(_) => "minLength",
            Check::MaxLength(_) => "maxLength",
            Check::Pattern(_) => "pattern",
            Check::Items(_) | Check::TupleItems(_) => "items",
            Check::AdditionalItems { .. } => "additionalItems",
            Check::MinItems(_) => "minItems",
            Check::MaxItems(_) => "maxItems",
            Check::UniqueItems => "uniqueItems",
            Check::Properties(_) => "properties",
            Check::PatternProperties(_) => "patternProperties",
            Check::AdditionalProperties { .. } => "additionalProperties",
            Check::Required(_) => "required",
            Check::MinProperties(_) => "minProperties",
            Check::MaxProperties(_) => "maxProperties",
            Check::AllOf(_) => "allOf",
            Check::AnyOf(_) => "anyOf",
            Check::Ref(_) => "$ref",
        }
    }

    /// Nodes validated against the same instance value as this check
    fn same_instance_targets(&self) -> &[NodeId] {
        match self {
            Check::Ref(target) => std::slice::from_ref(target),
            Check::AllOf(branches) | Check::AnyOf(branches) => branches,
            _ => &[],
        }
    }
}

/// Output of compilation: the node arena and its entry point
#[derive(Debug)]
pub(crate) struct CompiledSchema {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) root: NodeId,
}

/// A `$ref` check waiting for its target
struct PendingRef {
    node: NodeId,
    check: usize,
    reference: String,
    /// Registry id of the document holding the `$ref` ("" for the root document)
    document: String,
    location: String,
}

struct SchemaCompiler<'a> {
    root: &'a Schema,
    registry: &'a SchemaRegistry,
    nodes: Vec<SchemaNode>,
    /// `document + location` → node
    locations: HashMap<String, NodeId>,
    pending: Vec<PendingRef>,
}

impl<'a> SchemaCompiler<'a> {
    fn new(root: &'a Schema, registry: &'a SchemaRegistry) -> Self {
        Self {
            root,
            registry,
            nodes: Vec::new(),
            locations: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn compile(mut self) -> SchemaResult<CompiledSchema> {
        let root = self.compile_node(self.root, "", "#")?;
        self.resolve_refs()?;
        self.check_cycles()?;
        tracing::debug!(nodes = self.nodes.len(), "Compiled schema");
        Ok(CompiledSchema {
            nodes: self.nodes,
            root,
        })
    }

    /// Compile `schema` found at `location` in `document`, reusing the node
    /// if that location was already compiled
    fn compile_node(
        &mut self,
        schema: &'a Schema,
        document: &str,
        location: &str,
    ) -> SchemaResult<NodeId> {
        let key = format!("{}{}", document, location);
        if let Some(id) = self.locations.get(&key) {
            return Ok(*id);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            location: key.clone(),
            checks: Vec::new(),
        });
        self.locations.insert(key, id);

        let checks = match schema {
            Schema::Bool(true) => Vec::new(),
            Schema::Bool(false) => vec![Check::False],
            Schema::Object(obj) => self.compile_keywords(obj, id, document, location)?,
        };
        self.nodes[id.0].checks = checks;
        Ok(id)
    }

    fn compile_keywords(
        &mut self,
        obj: &'a SchemaObject,
        id: NodeId,
        document: &str,
        location: &str,
    ) -> SchemaResult<Vec<Check>> {
        // Siblings of $ref are ignored, but definitions stay addressable
        if let Some(reference) = obj.reference() {
            if let Some(Keyword::Definitions(definitions)) = obj.get("definitions") {
                self.compile_definitions(definitions, document, location)?;
            }
            self.pending.push(PendingRef {
                node: id,
                check: 0,
                reference: reference.to_string(),
                document: document.to_string(),
                location: format!("{}{}", document, location),
            });
            return Ok(vec![Check::Ref(UNRESOLVED)]);
        }

        let mut checks = Vec::with_capacity(obj.keywords.len());
        for keyword in &obj.keywords {
            let here = child_location(location, keyword.name());
            let check = match keyword {
                Keyword::Type(types) => Check::Type(types.clone()),
                Keyword::Enum(values) => Check::Enum(values.clone()),
                Keyword::Minimum(n) => Check::Minimum(*n),
                Keyword::Maximum(n) => Check::Maximum(*n),
                Keyword::ExclusiveMinimum(n) => Check::ExclusiveMinimum(*n),
                Keyword::ExclusiveMaximum(n) => Check::ExclusiveMaximum(*n),
                Keyword::MultipleOf(n) => Check::MultipleOf(*n),
                Keyword::MinLength(n) => Check::MinLength(*n),
                Keyword::MaxLength(n) => Check::MaxLength(*n),
                Keyword::Pattern(source) => Check::Pattern(Pattern::new(source, &here)?),
                Keyword::Items(Items::Single(schema)) => {
                    Check::Items(self.compile_node(schema, document, &here)?)
                }
                Keyword::Items(Items::Tuple(schemas)) => {
                    Check::TupleItems(self.compile_list(schemas, document, &here)?)
                }
                Keyword::AdditionalItems(schema) => {
                    let Some(Keyword::Items(Items::Tuple(tuple))) = obj.get("items") else {
                        tracing::debug!(location = %here, "Ignoring additionalItems without tuple items");
                        continue;
                    };
                    let Some(rule) = self.compile_additional(schema, document, &here)? else {
                        continue;
                    };
                    Check::AdditionalItems {
                        tuple_len: tuple.len(),
                        rule,
                    }
                }
                Keyword::MinItems(n) => Check::MinItems(*n),
                Keyword::MaxItems(n) => Check::MaxItems(*n),
                Keyword::UniqueItems(true) => Check::UniqueItems,
                Keyword::UniqueItems(false) => continue,
                Keyword::Properties(properties) => {
                    let mut compiled = Vec::with_capacity(properties.len());
                    for (name, schema) in properties {
                        let child = self.compile_node(schema, document, &child_location(&here, name))?;
                        compiled.push((name.clone(), child));
                    }
                    Check::Properties(compiled)
                }
                Keyword::PatternProperties(properties) => {
                    let mut compiled = Vec::with_capacity(properties.len());
                    for (source, schema) in properties {
                        let child_here = child_location(&here, source);
                        let pattern = Pattern::new(source, &child_here)?;
                        let child = self.compile_node(schema, document, &child_here)?;
                        compiled.push((pattern, child));
                    }
                    Check::PatternProperties(compiled)
                }
                Keyword::AdditionalProperties(schema) => {
                    let Some(rule) = self.compile_additional(schema, document, &here)? else {
                        continue;
                    };
                    let declared = match obj.get("properties") {
                        Some(Keyword::Properties(properties)) => properties.keys().cloned().collect(),
                        _ => HashSet::new(),
                    };
                    let patterns = match obj.get("patternProperties") {
                        Some(Keyword::PatternProperties(properties)) => properties
                            .keys()
                            .map(|source| {
                                let pattern_here = child_location(
                                    &child_location(location, "patternProperties"),
                                    source,
                                );
                                Pattern::new(source, &pattern_here).map(|p| p.regex)
                            })
                            .collect::<SchemaResult<Vec<_>>>()?,
                        _ => Vec::new(),
                    };
                    Check::AdditionalProperties {
                        declared,
                        patterns,
                        rule,
                    }
                }
                Keyword::Required(names) if names.is_empty() => continue,
                Keyword::Required(names) => {
                    // A missing property is reported once even if listed twice
                    let mut seen = HashSet::new();
                    Check::Required(
                        names
                            .iter()
                            .filter(|name| seen.insert(name.as_str()))
                            .cloned()
                            .collect(),
                    )
                }
                Keyword::MinProperties(n) => Check::MinProperties(*n),
                Keyword::MaxProperties(n) => Check::MaxProperties(*n),
                Keyword::AllOf(schemas) => Check::AllOf(self.compile_list(schemas, document, &here)?),
                Keyword::AnyOf(schemas) => Check::AnyOf(self.compile_list(schemas, document, &here)?),
                // Handled above: a schema with $ref compiles to a single Ref check
                Keyword::Ref(_) => continue,
                Keyword::Definitions(definitions) => {
                    self.compile_definitions(definitions, document, location)?;
                    continue;
                }
            };
            checks.push(check);
        }
        Ok(checks)
    }

    fn compile_list(
        &mut self,
        schemas: &'a [Schema],
        document: &str,
        location: &str,
    ) -> SchemaResult<Vec<NodeId>> {
        schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| self.compile_node(schema, document, &child_location(location, &i.to_string())))
            .collect()
    }

    fn compile_definitions(
        &mut self,
        definitions: &'a indexmap::IndexMap<String, Schema>,
        document: &str,
        location: &str,
    ) -> SchemaResult<()> {
        let here = child_location(location, "definitions");
        for (name, schema) in definitions {
            self.compile_node(schema, document, &child_location(&here, name))?;
        }
        Ok(())
    }

    /// `true` allows everything (no check), `false` forbids, anything else
    /// is a schema for the extra members
    fn compile_additional(
        &mut self,
        schema: &'a Schema,
        document: &str,
        location: &str,
    ) -> SchemaResult<Option<Additional>> {
        match schema {
            Schema::Bool(true) => Ok(None),
            Schema::Bool(false) => Ok(Some(Additional::Forbidden)),
            Schema::Object(_) => Ok(Some(Additional::Schema(
                self.compile_node(schema, document, location)?,
            ))),
        }
    }

    /// Point every `$ref` at its target, compiling targets on demand.
    /// Targets may themselves contain `$ref`s, so loop until none remain.
    fn resolve_refs(&mut self) -> SchemaResult<()> {
        while let Some(pending) = self.pending.pop() {
            let target = self.resolve_reference(&pending)?;
            tracing::debug!(
                reference = %pending.reference,
                from = %pending.location,
                to = %self.nodes[target.0].location,
                "Resolved schema reference"
            );
            if let Some(Check::Ref(slot)) = self.nodes[pending.node.0].checks.get_mut(pending.check) {
                *slot = target;
            }
        }
        Ok(())
    }

    fn resolve_reference(&mut self, pending: &PendingRef) -> SchemaResult<NodeId> {
        let unresolved = || SchemaError::UnresolvedRef {
            reference: pending.reference.clone(),
            location: pending.location.clone(),
        };

        let (document, fragment) = match pending.reference.split_once('#') {
            Some((document, fragment)) => (document, fragment),
            None => (pending.reference.as_str(), ""),
        };
        let document = if document.is_empty() {
            pending.document.as_str()
        } else {
            document
        };

        let tokens = parse_json_pointer(fragment).ok_or_else(unresolved)?;
        let location = tokens
            .iter()
            .fold("#".to_string(), |location, token| child_location(&location, token));

        if let Some(id) = self.locations.get(&format!("{}{}", document, location)) {
            return Ok(*id);
        }

        let document_root = if document.is_empty() {
            self.root
        } else {
            self.registry.resolve(document).ok_or_else(unresolved)?
        };
        let target = document_root.pointer(&tokens).ok_or_else(unresolved)?;
        let document = document.to_string();
        self.compile_node(target, &document, &location)
    }

    /// Reject cycles through `$ref`/`allOf`/`anyOf` edges: following them
    /// never moves into a child value, so such a cycle would not terminate.
    fn check_cycles(&self) -> SchemaResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(nodes: &[SchemaNode], marks: &mut [Mark], id: NodeId) -> SchemaResult<()> {
            match marks[id.0] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    return Err(SchemaError::CircularReference {
                        location: nodes[id.0].location.clone(),
                    });
                }
                Mark::New => {}
            }
            marks[id.0] = Mark::Active;
            for check in &nodes[id.0].checks {
                for target in check.same_instance_targets() {
                    visit(nodes, marks, *target)?;
                }
            }
            marks[id.0] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        for id in 0..self.nodes.len() {
            visit(&self.nodes, &mut marks, NodeId(id))?;
        }
        Ok(())
    }
}
