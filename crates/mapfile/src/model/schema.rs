//! Structural rules for the document tree.
//!
//! A [`Schema`] is a catalog of named node types. Each type declares, in
//! order, the child-node slots and child-leaf slots a document node bound to
//! it may hold. Slot order is significant: it fixes the slot indices the
//! tree validates against and the canonical order the codecs serialize in.
//!
//! Schemas are built once (usually by [`Schema::parse`] from a text
//! description) and never mutated afterwards; they are shared read-only.

use rustc_hash::FxHashMap;

use crate::error::SchemaParseError;
use crate::model::BasicType;

/// Instance-count constraint for one slot.
///
/// Only `Once` and `Optional` are enforced as "at most one" when a child is
/// inserted. The lower bound of `Once` and `Multiple` is checked when the
/// tree is consumed (encoding), not while it is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Zero or more.
    Any,
    /// Exactly one.
    Once,
    /// Zero or one.
    Optional,
    /// One or more.
    Multiple,
}

impl Cardinality {
    /// True for the cardinalities that cap a slot at a single instance.
    pub fn single_instance(self) -> bool {
        matches!(self, Cardinality::Once | Cardinality::Optional)
    }

    /// True for the cardinalities that require at least one instance.
    pub fn required(self) -> bool {
        matches!(self, Cardinality::Once | Cardinality::Multiple)
    }

    /// Parses the schema-text spelling of a cardinality.
    pub fn from_keyword(word: &str) -> Option<Cardinality> {
        match word {
            "any" => Some(Cardinality::Any),
            "once" => Some(Cardinality::Once),
            "optional" => Some(Cardinality::Optional),
            "multiple" => Some(Cardinality::Multiple),
            _ => None,
        }
    }
}

/// Index of a type within its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) usize);

/// A declared child-node slot.
#[derive(Debug, Clone)]
pub struct NodeSlot {
    /// Slot name; a child node's name must match it exactly.
    pub name: String,
    pub cardinality: Cardinality,
    /// Rule for children of this slot, when the schema defines one.
    /// A slot without a type leaves its children unconstrained.
    pub child: Option<TypeId>,
}

/// A declared child-leaf slot.
#[derive(Debug, Clone)]
pub struct LeafSlot {
    pub name: String,
    pub cardinality: Cardinality,
    pub value_type: BasicType,
    /// Maximum byte length, `String` slots only.
    pub max_len: Option<usize>,
}

/// One named node type: its ordered node and leaf slot lists.
#[derive(Debug, Clone)]
pub struct SchemaType {
    name: String,
    node_slots: Vec<NodeSlot>,
    leaf_slots: Vec<LeafSlot>,
    node_index: FxHashMap<String, usize>,
    leaf_index: FxHashMap<String, usize>,
}

impl SchemaType {
    fn new(name: String) -> Self {
        Self {
            name,
            node_slots: Vec::new(),
            leaf_slots: Vec::new(),
            node_index: FxHashMap::default(),
            leaf_index: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_slots(&self) -> &[NodeSlot] {
        &self.node_slots
    }

    pub fn leaf_slots(&self) -> &[LeafSlot] {
        &self.leaf_slots
    }

    /// Resolves a node slot by name to its index and descriptor.
    pub fn node_slot(&self, name: &str) -> Option<(usize, &NodeSlot)> {
        let idx = *self.node_index.get(name)?;
        Some((idx, &self.node_slots[idx]))
    }

    /// Resolves a leaf slot by name to its index and descriptor.
    pub fn leaf_slot(&self, name: &str) -> Option<(usize, &LeafSlot)> {
        let idx = *self.leaf_index.get(name)?;
        Some((idx, &self.leaf_slots[idx]))
    }
}

/// An immutable catalog of node types, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: Vec<SchemaType>,
    by_name: FxHashMap<String, TypeId>,
}

impl Schema {
    /// Looks up a type by name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the type for an id issued by this schema.
    pub fn ty(&self, id: TypeId) -> &SchemaType {
        &self.types[id.0]
    }

    /// Number of types in the catalog.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parses a schema from its text description.
    ///
    /// The grammar is line-based. `#` starts a comment, blank lines are
    /// skipped, indentation is free-form:
    ///
    /// ```text
    /// type Object
    ///   leaf Type int32 once
    ///   leaf X single optional
    ///   leaf Name string(31) optional
    /// type Objects
    ///   node Object any
    /// ```
    ///
    /// A `node` slot's name doubles as the child's type name; slots naming a
    /// type not defined anywhere in the text produce unconstrained children.
    /// Forward references are allowed.
    pub fn parse(text: &str) -> Result<Schema, SchemaParseError> {
        let mut schema = Schema::default();

        // First pass: register type names so slots can forward-reference.
        for (n, raw) in text.lines().enumerate() {
            let line = n + 1;
            let Some(words) = significant_words(raw) else {
                continue;
            };
            if words[0] == "type" {
                if words.len() != 2 {
                    return Err(SchemaParseError::MalformedLine { line });
                }
                let name = words[1].to_string();
                if schema.by_name.contains_key(&name) {
                    return Err(SchemaParseError::DuplicateType { line, name });
                }
                let id = TypeId(schema.types.len());
                schema.by_name.insert(name.clone(), id);
                schema.types.push(SchemaType::new(name));
            }
        }

        // Second pass: fill slot lists.
        let mut current: Option<usize> = None;
        for (n, raw) in text.lines().enumerate() {
            let line = n + 1;
            let Some(words) = significant_words(raw) else {
                continue;
            };
            match words[0] {
                "type" => {
                    current = Some(schema.by_name[words[1]].0);
                }
                "node" => {
                    let Some(ty) = current else {
                        return Err(SchemaParseError::SlotOutsideType { line });
                    };
                    if words.len() != 3 {
                        return Err(SchemaParseError::MalformedLine { line });
                    }
                    let name = words[1].to_string();
                    let cardinality = Cardinality::from_keyword(words[2]).ok_or_else(|| {
                        SchemaParseError::UnknownCardinality {
                            line,
                            word: words[2].to_string(),
                        }
                    })?;
                    let child = schema.by_name.get(&name).copied();
                    let slots = &mut schema.types[ty];
                    if slots.node_index.contains_key(&name) {
                        return Err(SchemaParseError::DuplicateSlot {
                            line,
                            name,
                            ty: slots.name.clone(),
                        });
                    }
                    slots.node_index.insert(name.clone(), slots.node_slots.len());
                    slots.node_slots.push(NodeSlot {
                        name,
                        cardinality,
                        child,
                    });
                }
                "leaf" => {
                    let Some(ty) = current else {
                        return Err(SchemaParseError::SlotOutsideType { line });
                    };
                    if words.len() != 4 {
                        return Err(SchemaParseError::MalformedLine { line });
                    }
                    let name = words[1].to_string();
                    let (value_type, max_len) = parse_value_type(words[2], line)?;
                    let cardinality = Cardinality::from_keyword(words[3]).ok_or_else(|| {
                        SchemaParseError::UnknownCardinality {
                            line,
                            word: words[3].to_string(),
                        }
                    })?;
                    let slots = &mut schema.types[ty];
                    if slots.leaf_index.contains_key(&name) {
                        return Err(SchemaParseError::DuplicateSlot {
                            line,
                            name,
                            ty: slots.name.clone(),
                        });
                    }
                    slots.leaf_index.insert(name.clone(), slots.leaf_slots.len());
                    slots.leaf_slots.push(LeafSlot {
                        name,
                        cardinality,
                        value_type,
                        max_len,
                    });
                }
                _ => return Err(SchemaParseError::MalformedLine { line }),
            }
        }

        Ok(schema)
    }
}

/// Splits a line into words, dropping comments and blanks.
fn significant_words(raw: &str) -> Option<Vec<&str>> {
    let line = raw.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }
    Some(line.split_whitespace().collect())
}

/// Parses `byte` / `int32` / `single` / `string` / `string(N)` / `void`.
fn parse_value_type(word: &str, line: usize) -> Result<(BasicType, Option<usize>), SchemaParseError> {
    if let Some(rest) = word.strip_prefix("string(") {
        let digits = rest.strip_suffix(')').ok_or_else(|| SchemaParseError::UnknownValueType {
            line,
            word: word.to_string(),
        })?;
        let max = digits.parse::<usize>().map_err(|_| SchemaParseError::UnknownValueType {
            line,
            word: word.to_string(),
        })?;
        return Ok((BasicType::String, Some(max)));
    }
    let ty = BasicType::from_keyword(word).ok_or_else(|| SchemaParseError::UnknownValueType {
        line,
        word: word.to_string(),
    })?;
    Ok((ty, None))
}
