//! Error types for the document tree, schema parsing, and the binary codecs.

use thiserror::Error;

use crate::model::BasicType;

/// Error during binary decoding.
///
/// A magic mismatch is not an error: `load_world`/`load_mission` report it
/// as `Ok(None)` so callers can probe a file against both codecs. Everything
/// in this enum means the buffer claimed to be this format and then broke
/// the layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("{field} count {count} is negative")]
    NegativeCount { field: &'static str, count: i32 },

    #[error("{field} count {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("reserved bits are non-zero in {context}")]
    ReservedBitsSet { context: &'static str },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Error during binary encoding.
///
/// Encoders build into a fresh buffer and return it only on success, so any
/// of these means no output was produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} contains an interior NUL byte")]
    InteriorNul { field: &'static str },

    #[error("{field} has {len} entries, exceeding maximum {max}")]
    TooManyEntries {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("required section {name:?} is missing")]
    MissingNode { name: &'static str },

    #[error("node {node:?} is missing required leaf {leaf:?}")]
    MissingLeaf { node: String, leaf: &'static str },

    #[error("leaf {leaf:?} on node {node:?} is not a {expected:?}")]
    ValueType {
        node: String,
        leaf: &'static str,
        expected: BasicType,
    },

    #[error("malformed object entry: {context}")]
    MalformedObject { context: &'static str },
}

/// Error raised by document tree operations.
///
/// Schema violations (`UnknownChild`, `SlotOccupied`, `TypeMismatch`,
/// `StringTooLong`) leave the tree unchanged: the offending child is never
/// partially attached. Lookup failures (`NodeNotFound`, `LeafNotFound`) are
/// a distinct condition so callers can tell "you may not add this" from
/// "this is not here".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("node type {parent:?} declares no child slot named {child:?}")]
    UnknownChild { parent: String, child: String },

    #[error("slot {name:?} allows a single instance and is already occupied")]
    SlotOccupied { name: String },

    #[error("leaf {name:?} holds a {found:?}, expected {expected:?}")]
    TypeMismatch {
        name: String,
        expected: BasicType,
        found: BasicType,
    },

    #[error("string leaf {name:?} length {len} exceeds maximum {max}")]
    StringTooLong {
        name: String,
        len: usize,
        max: usize,
    },

    #[error("node {node:?} has no bound rule; by-name counts require one")]
    UnboundRule { node: String },

    #[error("schema declares no type named {name:?}")]
    UnknownType { name: String },

    #[error("no child node named {name:?}")]
    NodeNotFound { name: String },

    #[error("no child leaf named {name:?}")]
    LeafNotFound { name: String },
}

/// Error from parsing a text schema description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaParseError {
    #[error("line {line}: expected `type <name>`, `node <name> <cardinality>`, or `leaf <name> <type> <cardinality>`")]
    MalformedLine { line: usize },

    #[error("line {line}: slot declared outside a `type` block")]
    SlotOutsideType { line: usize },

    #[error("line {line}: unknown cardinality {word:?}")]
    UnknownCardinality { line: usize, word: String },

    #[error("line {line}: unknown value type {word:?}")]
    UnknownValueType { line: usize, word: String },

    #[error("line {line}: duplicate type {name:?}")]
    DuplicateType { line: usize, name: String },

    #[error("line {line}: duplicate slot {name:?} in type {ty:?}")]
    DuplicateSlot {
        line: usize,
        name: String,
        ty: String,
    },
}
