//! The world format: terrain, atmosphere, and placed content.
//!
//! Layout, in order: magic, header, tiling, fog, underwater fog, texture
//! list, version block, object list, effect list, scenario list, include
//! list. No section is optional and none may be reordered.

use crate::catalog::{self, names};
use crate::codec::primitives::{Reader, Writer};
use crate::codec::sections;
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_TEXTURES, WORLD_MAGIC};
use crate::model::{NodeId, Tree};

/// Encodes a world document to bytes.
///
/// The tree is walked in canonical slot order; every section the layout
/// requires must be present. Nothing is returned on failure, so a partial
/// buffer can never be mistaken for a valid file.
pub fn save_world(tree: &Tree) -> Result<Vec<u8>, EncodeError> {
    let root = tree.root();
    let mut w = Writer::with_capacity(512);
    w.write_bytes(WORLD_MAGIC);
    sections::encode_header(tree, root, &mut w)?;
    encode_tiling(tree, root, &mut w)?;
    encode_fog(tree, root, names::FOG, &mut w)?;
    encode_fog(tree, root, names::UNDERWATER_FOG, &mut w)?;
    encode_textures(tree, root, &mut w)?;
    sections::encode_versions(tree, root, &mut w)?;
    sections::encode_objects(tree, root, &mut w)?;
    sections::encode_effects(tree, root, &mut w)?;
    sections::encode_scenarios(tree, root, &mut w)?;
    sections::encode_includes(tree, root, &mut w)?;
    Ok(w.into_bytes())
}

/// Decodes a world document.
///
/// Returns `Ok(None)` when the buffer does not carry the world magic: the
/// caller was probing the wrong format, which is not a failure. Once the
/// magic matches, every section must decode or the whole load fails; no
/// partial tree is ever returned.
pub fn load_world(input: &[u8]) -> Result<Option<Tree>, DecodeError> {
    if input.len() < WORLD_MAGIC.len() || &input[..WORLD_MAGIC.len()] != WORLD_MAGIC {
        return Ok(None);
    }
    let mut r = Reader::new(input);
    r.set_position(WORLD_MAGIC.len());

    let mut tree = Tree::with_schema(catalog::world_schema().clone(), names::MAP_DATA)?;
    let root = tree.root();
    sections::decode_header(&mut tree, root, &mut r)?;
    decode_tiling(&mut tree, root, &mut r)?;
    decode_fog(&mut tree, root, names::FOG, &mut r)?;
    decode_fog(&mut tree, root, names::UNDERWATER_FOG, &mut r)?;
    decode_textures(&mut tree, root, &mut r)?;
    sections::decode_versions(&mut tree, root, &mut r)?;
    sections::decode_objects(&mut tree, root, &mut r)?;
    sections::decode_effects(&mut tree, root, &mut r)?;
    sections::decode_scenarios(&mut tree, root, &mut r)?;
    sections::decode_includes(&mut tree, root, &mut r)?;
    Ok(Some(tree))
}

fn encode_tiling(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let tiling = sections::require_node(tree, root, names::TILING)?;
    w.write_single(sections::require_single(tree, tiling, names::TILE_SIZE)?);
    w.write_int32(sections::require_int32(tree, tiling, names::TILES_X)?);
    w.write_int32(sections::require_int32(tree, tiling, names::TILES_Z)?);
    Ok(())
}

fn decode_tiling(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let tile_size = r.read_single("Tiling.TileSize")?;
    let tiles_x = r.read_int32("Tiling.TilesX")?;
    let tiles_z = r.read_int32("Tiling.TilesZ")?;
    let tiling = tree.add_node(root, names::TILING)?;
    tree.add_single(tiling, names::TILE_SIZE, tile_size)?;
    tree.add_int32(tiling, names::TILES_X, tiles_x)?;
    tree.add_int32(tiling, names::TILES_Z, tiles_z)?;
    Ok(())
}

// Fog and underwater fog share one record shape: min/max distance plus an
// RGB color triple.
fn encode_fog(tree: &Tree, root: NodeId, section: &'static str, w: &mut Writer) -> Result<(), EncodeError> {
    let fog = sections::require_node(tree, root, section)?;
    w.write_single(sections::require_single(tree, fog, names::MIN)?);
    w.write_single(sections::require_single(tree, fog, names::MAX)?);
    w.write_rgb([
        sections::require_byte(tree, fog, names::R)?,
        sections::require_byte(tree, fog, names::G)?,
        sections::require_byte(tree, fog, names::B)?,
    ]);
    Ok(())
}

fn decode_fog(tree: &mut Tree, root: NodeId, section: &'static str, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let min = r.read_single("fog Min")?;
    let max = r.read_single("fog Max")?;
    let rgb = r.read_rgb("fog color")?;
    let fog = tree.add_node(root, section)?;
    tree.add_single(fog, names::MIN, min)?;
    tree.add_single(fog, names::MAX, max)?;
    tree.add_byte(fog, names::R, rgb[0])?;
    tree.add_byte(fog, names::G, rgb[1])?;
    tree.add_byte(fog, names::B, rgb[2])?;
    Ok(())
}

fn encode_textures(tree: &Tree, root: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let textures = sections::require_node(tree, root, names::TEXTURES)?;
    let count = tree.node_count(textures);
    if count > MAX_TEXTURES {
        return Err(EncodeError::TooManyEntries {
            field: "Textures",
            len: count,
            max: MAX_TEXTURES,
        });
    }
    w.write_int32(count as i32);
    for texture in tree.child_nodes(textures) {
        w.write_byte(sections::require_byte(tree, texture, names::DETAIL)?);
        w.write_byte(sections::require_byte(tree, texture, names::SKY_DOME)?);
        let name = sections::require_str(tree, texture, names::NAME)?;
        w.write_prefixed_str(name, "Texture.Name")?;
    }
    Ok(())
}

fn decode_textures(tree: &mut Tree, root: NodeId, r: &mut Reader<'_>) -> Result<(), DecodeError> {
    let count = sections::read_count(r, "Textures", MAX_TEXTURES)?;
    let textures = tree.add_node(root, names::TEXTURES)?;
    for _ in 0..count {
        let detail = r.read_byte("Texture.Detail")?;
        let sky = r.read_byte("Texture.SkyDome")?;
        let name = r.read_prefixed_str("Texture.Name")?;
        let texture = tree.add_node(textures, names::TEXTURE)?;
        tree.add_byte(texture, names::DETAIL, detail)?;
        tree.add_byte(texture, names::SKY_DOME, sky)?;
        tree.add_string(texture, names::NAME, &name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::MISSION_MAGIC;

    #[test]
    fn test_wrong_magic_is_absent_not_error() {
        assert!(load_world(b"JUNKdata").unwrap().is_none());
        assert!(load_world(b"WR").unwrap().is_none());
        assert!(load_world(&[]).unwrap().is_none());
    }

    #[test]
    fn test_mission_bytes_probe_as_absent() {
        let bytes = crate::codec::mission::save_mission(&catalog::new_mission()).unwrap();
        assert_eq!(bytes[..4], MISSION_MAGIC[..]);
        assert!(load_world(&bytes).unwrap().is_none());
    }

    #[test]
    fn test_default_world_roundtrips() {
        let tree = catalog::new_world();
        let bytes = save_world(&tree).unwrap();
        assert_eq!(bytes[..4], WORLD_MAGIC[..]);

        let out = load_world(&bytes).unwrap().expect("world magic");
        let root = out.root();
        let tiling = out.get_node(root, names::TILING).unwrap();
        let tiles_x = out.get_leaf(tiling, names::TILES_X).unwrap();
        assert_eq!(out.value(tiles_x).as_int32(), Some(64));

        let fog = out.get_node(root, names::FOG).unwrap();
        let b = out.get_leaf(fog, names::B).unwrap();
        assert_eq!(out.value(b).as_byte(), Some(210));
    }

    #[test]
    fn test_texture_entries_roundtrip() {
        let mut tree = catalog::new_world();
        let textures = tree.get_node(tree.root(), names::TEXTURES).unwrap();
        for (detail, sky, name) in [(1u8, 0u8, "grass01"), (0, 1, "skydome_dusk")] {
            let t = tree.add_node(textures, names::TEXTURE).unwrap();
            tree.add_byte(t, names::DETAIL, detail).unwrap();
            tree.add_byte(t, names::SKY_DOME, sky).unwrap();
            tree.add_string(t, names::NAME, name).unwrap();
        }

        let out = load_world(&save_world(&tree).unwrap()).unwrap().unwrap();
        let textures = out.get_node(out.root(), names::TEXTURES).unwrap();
        assert_eq!(out.node_count(textures), 2);
        let second = out.child_nodes(textures).nth(1).unwrap();
        let sky = out.get_leaf(second, names::SKY_DOME).unwrap();
        assert_eq!(out.value(sky).as_byte(), Some(1));
        let name = out.get_leaf(second, names::NAME).unwrap();
        assert_eq!(out.value(name).as_str(), Some("skydome_dusk"));
    }

    #[test]
    fn test_truncated_world_fails_with_eof() {
        let bytes = save_world(&catalog::new_world()).unwrap();
        for cut in [5, 20, bytes.len() - 1] {
            assert!(matches!(
                load_world(&bytes[..cut]),
                Err(DecodeError::UnexpectedEof { .. })
            ));
        }
    }

    #[test]
    fn test_missing_section_fails_encode() {
        let mut tree = catalog::new_world();
        let tiling = tree.get_node(tree.root(), names::TILING).unwrap();
        tree.remove_node(tiling);
        assert!(matches!(
            save_world(&tree),
            Err(EncodeError::MissingNode { name: "Tiling" })
        ));
    }
}
