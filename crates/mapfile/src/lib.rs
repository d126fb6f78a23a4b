//! Schema-validated document model and binary codecs for a legacy game's
//! world and mission files.
//!
//! The heart of the crate is a generic hierarchical document: named nodes
//! holding named, typed leaves, with structure constrained at runtime by a
//! swappable [`Schema`] (per-slot names, value types, and cardinalities).
//! Two codecs translate such documents to and from the engine's fixed-layout
//! binary formats, byte for byte.
//!
//! # Quick Start
//!
//! ```rust
//! use mapfile::catalog::{self, names};
//! use mapfile::{load_mission, save_mission};
//!
//! // Start from a seeded mission document and place one object.
//! let mut tree = catalog::new_mission();
//! let objects = tree.get_node(tree.root(), names::OBJECTS)?;
//! let obj = tree.add_node(objects, names::OBJECT)?;
//! tree.add_int32(obj, names::TYPE, 50)?;
//! tree.add_single(obj, names::X, 1.0)?;
//! tree.add_single(obj, names::Y, 2.0)?;
//! tree.add_single(obj, names::Z, 3.0)?;
//! tree.add_single(obj, names::DIR_FACING, 0.5)?;
//!
//! // Encode to the mission layout and read it back.
//! let bytes = save_mission(&tree).unwrap();
//! let loaded = load_mission(&bytes).unwrap().expect("mission magic");
//! let objects = loaded.get_node(loaded.root(), names::OBJECTS)?;
//! assert_eq!(loaded.node_count(objects), 1);
//! # Ok::<(), mapfile::TreeError>(())
//! ```
//!
//! # Modules
//!
//! - [`model`]: the document tree, its leaf values, and the schema rules
//! - [`codec`]: byte cursors and the world/mission format codecs
//! - [`catalog`]: section names and the built-in format schemas
//! - [`limits`]: magics, caps, and fixed buffer widths
//! - [`error`]: error types, one enum per failure domain
//!
//! # Probing files
//!
//! A load call answers "is this my format?" before anything else:
//! `load_world`/`load_mission` return `Ok(None)` on a magic mismatch, so a
//! caller can try both codecs on an unknown file and only treat decode
//! errors from the matching one as corruption. Past the magic, any short
//! read or rule violation aborts the load; a partial tree is never
//! returned.
//!
//! # Editing under rules
//!
//! Every mutation of a rule-bound node is validated at the call site:
//! unknown child names and over-occupied single-instance slots are rejected
//! with [`TreeError`], and the tree is left untouched. Leaf presence is
//! meaningful — optional wire fields exist in the tree only when they were
//! present in the file, and only present leaves are written back.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{Reader, Writer, load_mission, load_world, save_mission, save_world};
pub use error::{DecodeError, EncodeError, SchemaParseError, TreeError};
pub use model::{BasicType, Cardinality, LeafId, NodeId, Schema, Tree, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
