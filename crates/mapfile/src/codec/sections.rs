//! Section codecs shared by the world and mission layouts, plus the typed
//! leaf-extraction helpers the encoders are built from.
//!
//! Encoders read the tree through `find`-style lookups and convert absence
//! or a mistyped value into an [`EncodeError`]; this is where the `Once`
//! lower bound the tree does not enforce during editing gets checked.
//! Decoders build the tree through its schema-checked API, so a section that
//! would violate the rules surfaces as [`DecodeError::Tree`].

use crate::catalog::names;
use crate::codec::object;
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    INCLUDE_NAME_LEN, MAP_NAME_LEN, MAX_EFFECTS, MAX_INCLUDE_FILES, MAX_OBJECTS, MAX_SCENARIOS,
};
use crate::model::{BasicType, NodeId, Tree};

// =============================================================================
// TREE EXTRACTION HELPERS
// =============================================================================

/// Resolves a required section node.
pub(crate) fn require_node(tree: &Tree, parent: NodeId, name: &'static str) -> Result<NodeId, EncodeError> {
    tree.find_node(parent, name)
        .ok_or(EncodeError::MissingNode { name })
}

fn require_leaf(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<crate::model::LeafId, EncodeError> {
    tree.find_leaf(node, leaf).ok_or_else(|| EncodeError::MissingLeaf {
        node: tree.node_name(node).to_string(),
        leaf,
    })
}

pub(crate) fn require_int32(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<i32, EncodeError> {
    let id = require_leaf(tree, node, leaf)?;
    tree.value(id).as_int32().ok_or_else(|| EncodeError::ValueType {
        node: tree.node_name(node).to_string(),
        leaf,
        expected: BasicType::Int32,
    })
}

pub(crate) fn require_single(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<f32, EncodeError> {
    let id = require_leaf(tree, node, leaf)?;
    tree.value(id).as_single().ok_or_else(|| EncodeError::ValueType {
        node: tree.node_name(node).to_string(),
        leaf,
        expected: BasicType::Single,
    })
}

pub(crate) fn require_byte(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<u8, EncodeError> {
    let id = require_leaf(tree, node, leaf)?;
    tree.value(id).as_byte().ok_or_else(|| EncodeError::ValueType {
        node: tree.node_name(node).to_string(),
        leaf,
        expected: BasicType::Byte,
    })
}

pub(crate) fn require_str<'t>(tree: &'t Tree, node: NodeId, leaf: &'static str) -> Result<&'t str, EncodeError> {
    let id = require_leaf(tree, node, leaf)?;
    tree.value(id).as_str().ok_or_else(|| EncodeError::ValueType {
        node: tree.node_name(node).to_string(),
        leaf,
        expected: BasicType::String,
    })
}

/// A leaf that may be absent; present-but-mistyped is still an error.
pub(crate) fn optional_single(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<Option<f32>, EncodeError> {
    match tree.find_leaf(node, leaf) {
        None => Ok(None),
        Some(id) => tree
            .value(id)
            .as_single()
            .map(Some)
            .ok_or_else(|| EncodeError::ValueType {
                node: tree.node_name(node).to_string(),
                leaf,
                expected: BasicType::Single,
            }),
    }
}

pub(crate) fn optional_byte(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<Option<u8>, EncodeError> {
    match tree.find_leaf(node, leaf) {
        None => Ok(None),
        Some(id) => tree
            .value(id)
            .as_byte()
            .map(Some)
            .ok_or_else(|| EncodeError::ValueType {
                node: tree.node_name(node).to_string(),
                leaf,
                expected: BasicType::Byte,
            }),
    }
}

pub(crate) fn optional_int32(tree: &Tree, node: NodeId, leaf: &'static str) -> Result<Option<i32>, EncodeError> {
    match tree.find_leaf(node, leaf) {
        None => Ok(None),
        Some(id) => tree
            .value(id)
            .as_int32()
            .map(Some)
            .ok_or_else(|| EncodeError::ValueType {
                node: tree.node_name(node).to_string(),
                leaf,
                expected: BasicType::Int32,
            }),
    }
}

/// Reads a record count: i32 on the wire, non-negative, capped.
pub(crate) fn read_count(r: &mut Reader<'_>, field: &'static str, max: usize) -> Result<usize, DecodeError> {
    let count = r.read_int32(field)?;
    if count < 0 {
        return Err(DecodeError::NegativeCount { field, count });
    }
    let count = count as usize;
    if count > max {
        return Err(DecodeError::LengthExceedsLimit {
            field,
            len: count,
            max,
        });
    }
    Ok(count)
}

// =============================================================================
// SHARED SECTIONS
// =============================================================================

pub(crate) fn encode_header(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let header = require_node(tree, root, names::HEADER)?;
    w.write_int32(require_int32(tree, header, names::VERSION)?);
    let name = require_str(tree, header, names::NAME)?;
    w.write_fixed_str(name, MAP_NAME_LEN, "Header.Name")
}

pub(crate) fn decode_header(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let version = r.read_int32("Header.Version")?;
    let name = r.read_fixed_str(MAP_NAME_LEN, "Header.Name")?;
    let header = tree.add_node(root, names::HEADER)?;
    tree.add_int32(header, names::VERSION, version)?;
    tree.add_string(header, names::NAME, &name)?;
    Ok(())
}

pub(crate) fn encode_versions(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let versions = require_node(tree, root, names::VERSIONS)?;
    w.write_int32(require_int32(tree, versions, names::OBJECT_VERSION)?);
    w.write_int32(require_int32(tree, versions, names::EFFECT_VERSION)?);
    Ok(())
}

pub(crate) fn decode_versions(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let object_version = r.read_int32("Versions.ObjectVersion")?;
    let effect_version = r.read_int32("Versions.EffectVersion")?;
    let versions = tree.add_node(root, names::VERSIONS)?;
    tree.add_int32(versions, names::OBJECT_VERSION, object_version)?;
    tree.add_int32(versions, names::EFFECT_VERSION, effect_version)?;
    Ok(())
}

pub(crate) fn encode_objects(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let objects = require_node(tree, root, names::OBJECTS)?;
    let count = tree.node_count(objects);
    if count > MAX_OBJECTS {
        return Err(EncodeError::TooManyEntries {
            field: "Objects",
            len: count,
            max: MAX_OBJECTS,
        });
    }
    w.write_int32(count as i32);
    for obj in tree.child_nodes(objects) {
        object::encode_object(tree, obj, w)?;
    }
    Ok(())
}

pub(crate) fn decode_objects(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let count = read_count(r, "Objects", MAX_OBJECTS)?;
    let objects = tree.add_node(root, names::OBJECTS)?;
    for _ in 0..count {
        object::decode_object(tree, objects, r)?;
    }
    Ok(())
}

pub(crate) fn encode_effects(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let effects = require_node(tree, root, names::EFFECTS)?;
    let count = tree.node_count(effects);
    if count > MAX_EFFECTS {
        return Err(EncodeError::TooManyEntries {
            field: "Effects",
            len: count,
            max: MAX_EFFECTS,
        });
    }
    w.write_int32(count as i32);
    for effect in tree.child_nodes(effects) {
        w.write_int32(require_int32(tree, effect, names::TYPE)?);
        w.write_single(require_single(tree, effect, names::X)?);
        w.write_single(require_single(tree, effect, names::Y)?);
        w.write_single(require_single(tree, effect, names::Z)?);
    }
    Ok(())
}

pub(crate) fn decode_effects(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let count = read_count(r, "Effects", MAX_EFFECTS)?;
    let effects = tree.add_node(root, names::EFFECTS)?;
    for _ in 0..count {
        let ty = r.read_int32("effect Type")?;
        let x = r.read_single("effect X")?;
        let y = r.read_single("effect Y")?;
        let z = r.read_single("effect Z")?;
        let effect = tree.add_node(effects, names::EFFECT)?;
        tree.add_int32(effect, names::TYPE, ty)?;
        tree.add_single(effect, names::X, x)?;
        tree.add_single(effect, names::Y, y)?;
        tree.add_single(effect, names::Z, z)?;
    }
    Ok(())
}

pub(crate) fn encode_scenarios(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let scenarios = require_node(tree, root, names::SCENARIOS)?;
    let count = tree.node_count(scenarios);
    if count > MAX_SCENARIOS {
        return Err(EncodeError::TooManyEntries {
            field: "Scenarios",
            len: count,
            max: MAX_SCENARIOS,
        });
    }
    w.write_int32(count as i32);
    for scenario in tree.child_nodes(scenarios) {
        w.write_prefixed_str(require_str(tree, scenario, names::NAME)?, "Scenario.Name")?;
        w.write_int32(require_int32(tree, scenario, names::INDEX)?);
    }
    Ok(())
}

pub(crate) fn decode_scenarios(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let count = read_count(r, "Scenarios", MAX_SCENARIOS)?;
    let scenarios = tree.add_node(root, names::SCENARIOS)?;
    for _ in 0..count {
        let name = r.read_prefixed_str("Scenario.Name")?;
        let index = r.read_int32("Scenario.Index")?;
        let scenario = tree.add_node(scenarios, names::SCENARIO)?;
        tree.add_string(scenario, names::NAME, &name)?;
        tree.add_int32(scenario, names::INDEX, index)?;
    }
    Ok(())
}

pub(crate) fn encode_includes(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let includes = require_node(tree, root, names::INCLUDES)?;
    let count = tree.node_count(includes);
    if count > MAX_INCLUDE_FILES {
        return Err(EncodeError::TooManyEntries {
            field: "Includes",
            len: count,
            max: MAX_INCLUDE_FILES,
        });
    }
    w.write_int32(count as i32);
    for include in tree.child_nodes(includes) {
        let name = require_str(tree, include, names::NAME)?;
        w.write_fixed_str(name, INCLUDE_NAME_LEN, "Include.Name")?;
    }
    Ok(())
}

pub(crate) fn decode_includes(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let count = read_count(r, "Includes", MAX_INCLUDE_FILES)?;
    let includes = tree.add_node(root, names::INCLUDES)?;
    for _ in 0..count {
        let name = r.read_fixed_str(INCLUDE_NAME_LEN, "Include.Name")?;
        let include = tree.add_node(includes, names::INCLUDE)?;
        tree.add_string(include, names::NAME, &name)?;
    }
    Ok(())
}
