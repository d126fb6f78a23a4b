//! Data model: leaf values, structural rules, and the document tree.
//!
//! - [`value`]: basic value types and leaf payloads
//! - [`schema`]: named node types with slot/cardinality rules
//! - [`tree`]: the schema-aware hierarchical document

pub mod schema;
pub mod tree;
pub mod value;

pub use schema::{Cardinality, LeafSlot, NodeSlot, Schema, SchemaType, TypeId};
pub use tree::{LeafId, NodeId, Tree};
pub use value::{BasicType, Value};
