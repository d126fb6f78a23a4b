//! The fixed catalog both binary formats are written against.
//!
//! Section and leaf names here are the node names the codecs emit and
//! expect; the built-in schemas bind them to cardinality and type rules.
//! Everything in this module is static: the schemas are parsed once from
//! the embedded text and shared read-only for the life of the process.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::limits::{EFFECT_LIST_VERSION, FORMAT_VERSION, OBJECT_LIST_VERSION};
use crate::model::{Schema, Tree};

/// Node and leaf names used by the world/mission layouts.
pub mod names {
    pub const MAP_DATA: &str = "MapData";

    pub const HEADER: &str = "Header";
    pub const VERSION: &str = "Version";
    pub const NAME: &str = "Name";

    pub const TILING: &str = "Tiling";
    pub const TILE_SIZE: &str = "TileSize";
    pub const TILES_X: &str = "TilesX";
    pub const TILES_Z: &str = "TilesZ";

    pub const FOG: &str = "Fog";
    pub const UNDERWATER_FOG: &str = "UnderwaterFog";
    pub const MIN: &str = "Min";
    pub const MAX: &str = "Max";
    pub const R: &str = "R";
    pub const G: &str = "G";
    pub const B: &str = "B";

    pub const TEXTURES: &str = "Textures";
    pub const TEXTURE: &str = "Texture";
    pub const DETAIL: &str = "Detail";
    pub const SKY_DOME: &str = "SkyDome";

    pub const VERSIONS: &str = "Versions";
    pub const OBJECT_VERSION: &str = "ObjectVersion";
    pub const EFFECT_VERSION: &str = "EffectVersion";

    pub const OBJECTS: &str = "Objects";
    pub const OBJECT: &str = "Object";
    pub const TYPE: &str = "Type";
    pub const X: &str = "X";
    pub const Y: &str = "Y";
    pub const Z: &str = "Z";
    pub const DIR_FACING: &str = "DirFacing";
    pub const TILT_FORWARD: &str = "TiltForward";
    pub const TILT_LEFT: &str = "TiltLeft";
    pub const AI_MODE: &str = "AIMode";
    pub const TEAM_ID: &str = "TeamID";
    pub const SCALE: &str = "Scale";

    pub const EFFECTS: &str = "Effects";
    pub const EFFECT: &str = "Effect";

    pub const SCENARIOS: &str = "Scenarios";
    pub const SCENARIO: &str = "Scenario";
    pub const INDEX: &str = "Index";

    pub const INCLUDES: &str = "Includes";
    pub const INCLUDE: &str = "Include";
}

// Sections both formats carry. Slot order here is wire order.
const COMMON_TYPES: &str = "
type Header
  leaf Version int32 once
  leaf Name string(31) once
type Versions
  leaf ObjectVersion int32 once
  leaf EffectVersion int32 once
type Objects
  node Object any
type Object
  leaf Type int32 once
  leaf X single once
  leaf Y single once
  leaf Z single once
  leaf DirFacing single once
  leaf TiltForward single optional
  leaf TiltLeft single optional
  leaf AIMode byte optional
  leaf TeamID int32 optional
  leaf Scale single optional
type Effects
  node Effect any
type Effect
  leaf Type int32 once
  leaf X single once
  leaf Y single once
  leaf Z single once
type Scenarios
  node Scenario any
type Scenario
  leaf Name string once
  leaf Index int32 once
type Includes
  node Include any
type Include
  leaf Name string(31) once
";

const WORLD_TYPES: &str = "
type MapData
  node Header once
  node Tiling once
  node Fog once
  node UnderwaterFog once
  node Textures once
  node Versions once
  node Objects once
  node Effects once
  node Scenarios once
  node Includes once
type Tiling
  leaf TileSize single once
  leaf TilesX int32 once
  leaf TilesZ int32 once
type Fog
  leaf Min single once
  leaf Max single once
  leaf R byte once
  leaf G byte once
  leaf B byte once
type UnderwaterFog
  leaf Min single once
  leaf Max single once
  leaf R byte once
  leaf G byte once
  leaf B byte once
type Textures
  node Texture any
type Texture
  leaf Detail byte once
  leaf SkyDome byte once
  leaf Name string once
";

const MISSION_TYPES: &str = "
type MapData
  node Header once
  node Versions once
  node Objects once
  node Effects once
  node Scenarios once
  node Includes once
";

lazy_static! {
    static ref WORLD_SCHEMA: Arc<Schema> = Arc::new(
        Schema::parse(&format!("{WORLD_TYPES}\n{COMMON_TYPES}"))
            .expect("embedded world schema is well-formed")
    );
    static ref MISSION_SCHEMA: Arc<Schema> = Arc::new(
        Schema::parse(&format!("{MISSION_TYPES}\n{COMMON_TYPES}"))
            .expect("embedded mission schema is well-formed")
    );
}

/// Structural rules for world documents.
pub fn world_schema() -> &'static Arc<Schema> {
    &WORLD_SCHEMA
}

/// Structural rules for mission documents.
pub fn mission_schema() -> &'static Arc<Schema> {
    &MISSION_SCHEMA
}

/// A fresh world document with every required section present and header
/// defaults filled in, ready for editing or encoding.
pub fn new_world() -> Tree {
    let mut tree = Tree::with_schema(world_schema().clone(), names::MAP_DATA)
        .expect("world schema defines MapData");
    let root = tree.root();

    seed_header(&mut tree, root);

    let tiling = tree.add_node(root, names::TILING).expect("Tiling slot");
    tree.add_single(tiling, names::TILE_SIZE, 1.0).expect("TileSize leaf");
    tree.add_int32(tiling, names::TILES_X, 64).expect("TilesX leaf");
    tree.add_int32(tiling, names::TILES_Z, 64).expect("TilesZ leaf");

    seed_fog(&mut tree, root, names::FOG, [180, 190, 210]);
    seed_fog(&mut tree, root, names::UNDERWATER_FOG, [40, 70, 90]);

    tree.add_node(root, names::TEXTURES).expect("Textures slot");
    seed_common_tail(&mut tree, root);
    tree
}

/// A fresh mission document, seeded like [`new_world`] minus the
/// terrain/atmosphere sections missions do not carry.
pub fn new_mission() -> Tree {
    let mut tree = Tree::with_schema(mission_schema().clone(), names::MAP_DATA)
        .expect("mission schema defines MapData");
    let root = tree.root();
    seed_header(&mut tree, root);
    seed_common_tail(&mut tree, root);
    tree
}

fn seed_header(tree: &mut Tree, root: crate::model::NodeId) {
    let header = tree.add_node(root, names::HEADER).expect("Header slot");
    tree.add_int32(header, names::VERSION, FORMAT_VERSION).expect("Version leaf");
    tree.add_string(header, names::NAME, "Untitled").expect("Name leaf");
}

fn seed_fog(tree: &mut Tree, root: crate::model::NodeId, section: &str, rgb: [u8; 3]) {
    let fog = tree.add_node(root, section).expect("fog slot");
    tree.add_single(fog, names::MIN, 0.0).expect("Min leaf");
    tree.add_single(fog, names::MAX, 1000.0).expect("Max leaf");
    tree.add_byte(fog, names::R, rgb[0]).expect("R leaf");
    tree.add_byte(fog, names::G, rgb[1]).expect("G leaf");
    tree.add_byte(fog, names::B, rgb[2]).expect("B leaf");
}

fn seed_common_tail(tree: &mut Tree, root: crate::model::NodeId) {
    let versions = tree.add_node(root, names::VERSIONS).expect("Versions slot");
    tree.add_int32(versions, names::OBJECT_VERSION, OBJECT_LIST_VERSION)
        .expect("ObjectVersion leaf");
    tree.add_int32(versions, names::EFFECT_VERSION, EFFECT_LIST_VERSION)
        .expect("EffectVersion leaf");

    tree.add_node(root, names::OBJECTS).expect("Objects slot");
    tree.add_node(root, names::EFFECTS).expect("Effects slot");
    tree.add_node(root, names::SCENARIOS).expect("Scenarios slot");
    tree.add_node(root, names::INCLUDES).expect("Includes slot");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;

    #[test]
    fn test_builtin_schemas_parse() {
        assert!(world_schema().lookup(names::MAP_DATA).is_some());
        assert!(world_schema().lookup(names::TILING).is_some());
        assert!(mission_schema().lookup(names::MAP_DATA).is_some());
        assert!(mission_schema().lookup(names::TILING).is_none());
    }

    #[test]
    fn test_new_world_has_every_section() {
        let tree = new_world();
        let root = tree.root();
        for section in [
            names::HEADER,
            names::TILING,
            names::FOG,
            names::UNDERWATER_FOG,
            names::TEXTURES,
            names::VERSIONS,
            names::OBJECTS,
            names::EFFECTS,
            names::SCENARIOS,
            names::INCLUDES,
        ] {
            assert!(tree.find_node(root, section).is_some(), "missing {section}");
        }
    }

    #[test]
    fn test_new_mission_omits_terrain_sections() {
        let mut tree = new_mission();
        let root = tree.root();
        assert!(tree.find_node(root, names::HEADER).is_some());
        assert!(tree.find_node(root, names::OBJECTS).is_some());
        assert!(tree.find_node(root, names::TILING).is_none());
        // And the mission schema rejects them outright.
        assert!(matches!(
            tree.add_node(root, names::TILING),
            Err(TreeError::UnknownChild { .. })
        ));
    }

    #[test]
    fn test_seeded_sections_are_once_slots() {
        let mut tree = new_world();
        let root = tree.root();
        assert!(matches!(
            tree.add_node(root, names::HEADER),
            Err(TreeError::SlotOccupied { .. })
        ));
    }

    #[test]
    fn test_object_slot_accepts_many() {
        let mut tree = new_mission();
        let objects = tree.get_node(tree.root(), names::OBJECTS).unwrap();
        for i in 0..3 {
            let obj = tree.add_node(objects, names::OBJECT).unwrap();
            tree.add_int32(obj, names::TYPE, i).unwrap();
        }
        assert_eq!(tree.node_count_of(objects, names::OBJECT).unwrap(), 3);
    }
}
