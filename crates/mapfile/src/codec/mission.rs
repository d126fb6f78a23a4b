//! The mission format: placed content for an already-loaded world.
//!
//! Layout, in order: magic, header, version block, object list, effect
//! list, scenario list, include list. Missions carry no terrain or
//! atmosphere sections; those belong to the world file they play in.

use crate::catalog::{self, names};
use crate::codec::primitives::{Reader, Writer};
use crate::codec::sections;
use crate::error::{DecodeError, EncodeError};
use crate::limits::MISSION_MAGIC;
use crate::model::Tree;

/// Encodes a mission document to bytes.
pub fn save_mission(tree: &Tree) -> Result<Vec<u8>, EncodeError> {
    let root = tree.root();
    let mut w = Writer::with_capacity(256);
    w.write_bytes(MISSION_MAGIC);
    sections::encode_header(tree, root, &mut w)?;
    sections::encode_versions(tree, root, &mut w)?;
    sections::encode_objects(tree, root, &mut w)?;
    sections::encode_effects(tree, root, &mut w)?;
    sections::encode_scenarios(tree, root, &mut w)?;
    sections::encode_includes(tree, root, &mut w)?;
    Ok(w.into_bytes())
}

/// Decodes a mission document; `Ok(None)` when the magic is not the
/// mission magic. See [`crate::codec::world::load_world`] for the probing
/// contract.
pub fn load_mission(input: &[u8]) -> Result<Option<Tree>, DecodeError> {
    if input.len() < MISSION_MAGIC.len() || &input[..MISSION_MAGIC.len()] != MISSION_MAGIC {
        return Ok(None);
    }
    let mut r = Reader::new(input);
    r.set_position(MISSION_MAGIC.len());

    let mut tree = Tree::with_schema(catalog::mission_schema().clone(), names::MAP_DATA)?;
    let root = tree.root();
    sections::decode_header(&mut tree, root, &mut r)?;
    sections::decode_versions(&mut tree, root, &mut r)?;
    sections::decode_objects(&mut tree, root, &mut r)?;
    sections::decode_effects(&mut tree, root, &mut r)?;
    sections::decode_scenarios(&mut tree, root, &mut r)?;
    sections::decode_includes(&mut tree, root, &mut r)?;
    Ok(Some(tree))
}
