//! Placed-object entries: the variant records of both formats.
//!
//! Every entry opens with one flags byte. Bit 0 selects the 3-angle variant
//! (tilt pair follows the baseline fields); bits 1-3 flag which optional
//! attributes trail the record. Presence on the wire mirrors leaf presence
//! in the tree exactly: an absent attribute produces no leaf, and a leaf
//! that exists is always written. High bits are reserved and must be zero.

use crate::catalog::names;
use crate::codec::primitives::{Reader, Writer};
use crate::codec::sections::{optional_byte, optional_int32, optional_single, require_int32, require_single};
use crate::error::{DecodeError, EncodeError};
use crate::model::{NodeId, Tree};

const FLAG_THREE_ANGLE: u8 = 0x01;
const FLAG_HAS_AI_MODE: u8 = 0x02;
const FLAG_HAS_TEAM: u8 = 0x04;
const FLAG_HAS_SCALE: u8 = 0x08;
const OBJECT_RESERVED_MASK: u8 = 0xF0;

/// Encodes one object node. Flags are derived from which leaves exist.
pub(crate) fn encode_object(tree: &Tree, object: NodeId, w: &mut Writer) -> Result<(), EncodeError> {
    let ty = require_int32(tree, object, names::TYPE)?;
    let x = require_single(tree, object, names::X)?;
    let y = require_single(tree, object, names::Y)?;
    let z = require_single(tree, object, names::Z)?;
    let facing = require_single(tree, object, names::DIR_FACING)?;

    let tilt_forward = optional_single(tree, object, names::TILT_FORWARD)?;
    let tilt_left = optional_single(tree, object, names::TILT_LEFT)?;
    let tilt = match (tilt_forward, tilt_left) {
        (Some(f), Some(l)) => Some((f, l)),
        (None, None) => None,
        _ => {
            return Err(EncodeError::MalformedObject {
                context: "TiltForward and TiltLeft must be present together",
            });
        }
    };

    let ai_mode = optional_byte(tree, object, names::AI_MODE)?;
    let team = optional_int32(tree, object, names::TEAM_ID)?;
    let scale = optional_single(tree, object, names::SCALE)?;

    let mut flags = 0u8;
    if tilt.is_some() {
        flags |= FLAG_THREE_ANGLE;
    }
    if ai_mode.is_some() {
        flags |= FLAG_HAS_AI_MODE;
    }
    if team.is_some() {
        flags |= FLAG_HAS_TEAM;
    }
    if scale.is_some() {
        flags |= FLAG_HAS_SCALE;
    }

    w.write_byte(flags);
    w.write_int32(ty);
    w.write_single(x);
    w.write_single(y);
    w.write_single(z);
    w.write_single(facing);
    if let Some((forward, left)) = tilt {
        w.write_single(forward);
        w.write_single(left);
    }
    if let Some(mode) = ai_mode {
        w.write_byte(mode);
    }
    if let Some(team) = team {
        w.write_int32(team);
    }
    if let Some(scale) = scale {
        w.write_single(scale);
    }
    Ok(())
}

/// Decodes one object entry into a new child of `objects`.
///
/// Only flagged fields produce leaves; a baseline record round-trips with
/// exactly its five baseline leaves and nothing else.
pub(crate) fn decode_object(
    tree: &mut Tree,
    objects: NodeId,
    r: &mut Reader<'_>,
) -> Result<NodeId, DecodeError> {
    let flags = r.read_byte("object flags")?;
    if flags & OBJECT_RESERVED_MASK != 0 {
        return Err(DecodeError::ReservedBitsSet {
            context: "object flags",
        });
    }

    let ty = r.read_int32("object Type")?;
    let x = r.read_single("object X")?;
    let y = r.read_single("object Y")?;
    let z = r.read_single("object Z")?;
    let facing = r.read_single("object DirFacing")?;

    let object = tree.add_node(objects, names::OBJECT)?;
    tree.add_int32(object, names::TYPE, ty)?;
    tree.add_single(object, names::X, x)?;
    tree.add_single(object, names::Y, y)?;
    tree.add_single(object, names::Z, z)?;
    tree.add_single(object, names::DIR_FACING, facing)?;

    if flags & FLAG_THREE_ANGLE != 0 {
        let forward = r.read_single("object TiltForward")?;
        let left = r.read_single("object TiltLeft")?;
        tree.add_single(object, names::TILT_FORWARD, forward)?;
        tree.add_single(object, names::TILT_LEFT, left)?;
    }
    if flags & FLAG_HAS_AI_MODE != 0 {
        let mode = r.read_byte("object AIMode")?;
        tree.add_byte(object, names::AI_MODE, mode)?;
    }
    if flags & FLAG_HAS_TEAM != 0 {
        let team = r.read_int32("object TeamID")?;
        tree.add_int32(object, names::TEAM_ID, team)?;
    }
    if flags & FLAG_HAS_SCALE != 0 {
        let scale = r.read_single("object Scale")?;
        tree.add_single(object, names::SCALE, scale)?;
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn object_fixture() -> (Tree, NodeId) {
        let mut tree = catalog::new_mission();
        let objects = tree.get_node(tree.root(), names::OBJECTS).unwrap();
        (tree, objects)
    }

    fn roundtrip_one(tree: &Tree, object: NodeId) -> (Tree, NodeId) {
        let mut w = Writer::new();
        encode_object(tree, object, &mut w).unwrap();
        let (mut out, objects) = object_fixture();
        let mut r = Reader::new(w.as_bytes());
        let decoded = decode_object(&mut out, objects, &mut r).unwrap();
        assert!(!r.has_more(), "record not fully consumed");
        (out, decoded)
    }

    fn leaf_names(tree: &Tree, node: NodeId) -> Vec<String> {
        tree.child_leaves(node)
            .map(|l| tree.leaf_name(l).to_string())
            .collect()
    }

    fn baseline_object(tree: &mut Tree, objects: NodeId) -> NodeId {
        let obj = tree.add_node(objects, names::OBJECT).unwrap();
        tree.add_int32(obj, names::TYPE, 50).unwrap();
        tree.add_single(obj, names::X, 1.0).unwrap();
        tree.add_single(obj, names::Y, 2.0).unwrap();
        tree.add_single(obj, names::Z, 3.0).unwrap();
        tree.add_single(obj, names::DIR_FACING, 0.5).unwrap();
        obj
    }

    #[test]
    fn test_baseline_variant_roundtrips_without_tilt() {
        let (mut tree, objects) = object_fixture();
        let obj = baseline_object(&mut tree, objects);

        let (out, decoded) = roundtrip_one(&tree, obj);
        assert_eq!(
            leaf_names(&out, decoded),
            ["Type", "X", "Y", "Z", "DirFacing"]
        );
        let ty = out.get_leaf(decoded, names::TYPE).unwrap();
        assert_eq!(out.value(ty).as_int32(), Some(50));
    }

    #[test]
    fn test_three_angle_variant_roundtrips_tilt() {
        let (mut tree, objects) = object_fixture();
        let obj = baseline_object(&mut tree, objects);
        tree.add_single(obj, names::TILT_FORWARD, 0.2).unwrap();
        tree.add_single(obj, names::TILT_LEFT, 0.3).unwrap();

        let (out, decoded) = roundtrip_one(&tree, obj);
        let forward = out.get_leaf(decoded, names::TILT_FORWARD).unwrap();
        let left = out.get_leaf(decoded, names::TILT_LEFT).unwrap();
        assert_eq!(out.value(forward).as_single(), Some(0.2));
        assert_eq!(out.value(left).as_single(), Some(0.3));
    }

    #[test]
    fn test_half_specified_tilt_is_rejected() {
        let (mut tree, objects) = object_fixture();
        let obj = baseline_object(&mut tree, objects);
        tree.add_single(obj, names::TILT_FORWARD, 0.2).unwrap();

        let mut w = Writer::new();
        assert!(matches!(
            encode_object(&tree, obj, &mut w),
            Err(EncodeError::MalformedObject { .. })
        ));
    }

    #[test]
    fn test_optional_attributes_roundtrip_in_every_combination() {
        for mask in 0u8..8 {
            let (mut tree, objects) = object_fixture();
            let obj = baseline_object(&mut tree, objects);
            let mut expected = vec![
                "Type".to_string(),
                "X".into(),
                "Y".into(),
                "Z".into(),
                "DirFacing".into(),
            ];
            if mask & 1 != 0 {
                tree.add_byte(obj, names::AI_MODE, 3).unwrap();
                expected.push("AIMode".into());
            }
            if mask & 2 != 0 {
                tree.add_int32(obj, names::TEAM_ID, 2).unwrap();
                expected.push("TeamID".into());
            }
            if mask & 4 != 0 {
                tree.add_single(obj, names::SCALE, 1.5).unwrap();
                expected.push("Scale".into());
            }

            let (out, decoded) = roundtrip_one(&tree, obj);
            assert_eq!(leaf_names(&out, decoded), expected, "mask {mask}");
        }
    }

    #[test]
    fn test_absent_attribute_is_no_leaf_not_zero() {
        let (mut tree, objects) = object_fixture();
        let obj = baseline_object(&mut tree, objects);
        let (out, decoded) = roundtrip_one(&tree, obj);
        assert!(out.find_leaf(decoded, names::AI_MODE).is_none());
        assert!(out.find_leaf(decoded, names::TEAM_ID).is_none());
        assert!(out.find_leaf(decoded, names::SCALE).is_none());
    }

    #[test]
    fn test_reserved_flag_bits_rejected() {
        let (mut out, objects) = object_fixture();
        let mut r = Reader::new(&[0x10]);
        assert!(matches!(
            decode_object(&mut out, objects, &mut r),
            Err(DecodeError::ReservedBitsSet { .. })
        ));
    }

    #[test]
    fn test_truncated_record_is_eof() {
        let (mut out, objects) = object_fixture();
        // Flags promise a scale field that is not there.
        let mut bytes = vec![FLAG_HAS_SCALE];
        bytes.extend_from_slice(&50i32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]); // X, Y, Z, DirFacing
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            decode_object(&mut out, objects, &mut r),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_missing_baseline_leaf_rejected_on_encode() {
        let (mut tree, objects) = object_fixture();
        let obj = tree.add_node(objects, names::OBJECT).unwrap();
        tree.add_int32(obj, names::TYPE, 1).unwrap();
        let mut w = Writer::new();
        assert!(matches!(
            encode_object(&tree, obj, &mut w),
            Err(EncodeError::MissingLeaf { .. })
        ));
    }
}
