//! The schema-aware document tree.
//!
//! A [`Tree`] owns every node and leaf in an arena; callers hold [`NodeId`]
//! and [`LeafId`] handles. A node bound to a schema rule partitions its
//! children into one ordered sequence per declared slot, so cardinality
//! checks are O(1) after a single name-to-slot hash lookup and enumeration
//! follows the schema's declared order. An unbound node keeps a single
//! catch-all slot in insertion order.
//!
//! Children hold a non-owning back-reference to their parent. It exists only
//! so `remove_node`/`remove_leaf` can detach; ownership and traversal order
//! live exclusively in the parent's slot vectors.

use std::sync::Arc;

use crate::error::TreeError;
use crate::model::schema::{Schema, TypeId};
use crate::model::Value;

/// Handle to a node owned by a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to a leaf owned by a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafId(usize);

#[derive(Debug, Clone)]
struct NodeEntry {
    name: String,
    rule: Option<TypeId>,
    parent: Option<NodeId>,
    node_slots: Vec<Vec<NodeId>>,
    leaf_slots: Vec<Vec<LeafId>>,
}

#[derive(Debug, Clone)]
struct LeafEntry {
    name: String,
    value: Value,
    max_len: Option<usize>,
    parent: Option<NodeId>,
}

/// A hierarchical document: one root node, arena-owned children.
///
/// Handles are only meaningful for the tree that issued them. Detached
/// entries stay in the arena until the tree is dropped; ids are never
/// reused.
#[derive(Debug, Clone)]
pub struct Tree {
    schema: Option<Arc<Schema>>,
    nodes: Vec<NodeEntry>,
    leaves: Vec<LeafEntry>,
    root: NodeId,
}

impl Tree {
    /// Creates an unconstrained tree with a root of the given name.
    pub fn new(root_name: &str) -> Tree {
        Tree {
            schema: None,
            nodes: vec![NodeEntry {
                name: root_name.to_string(),
                rule: None,
                parent: None,
                node_slots: vec![Vec::new()],
                leaf_slots: vec![Vec::new()],
            }],
            leaves: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Creates a tree whose root is bound to the named schema type.
    ///
    /// The root node takes the type's name. Fails with
    /// [`TreeError::UnknownType`] when the schema declares no such type.
    pub fn with_schema(schema: Arc<Schema>, root_type: &str) -> Result<Tree, TreeError> {
        let rule = schema.lookup(root_type).ok_or_else(|| TreeError::UnknownType {
            name: root_type.to_string(),
        })?;
        let ty = schema.ty(rule);
        let root = NodeEntry {
            name: root_type.to_string(),
            rule: Some(rule),
            parent: None,
            node_slots: vec![Vec::new(); ty.node_slots().len()],
            leaf_slots: vec![Vec::new(); ty.leaf_slots().len()],
        };
        Ok(Tree {
            schema: Some(schema),
            nodes: vec![root],
            leaves: Vec::new(),
            root: NodeId(0),
        })
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The schema this tree validates against, if any.
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Adds a child node.
    ///
    /// With a bound rule the name must match a declared node slot, and a
    /// `Once`/`Optional` slot must be empty; the child inherits the slot's
    /// type as its own rule. Without a rule the child is appended to the
    /// catch-all slot and is itself unconstrained. On error the tree is
    /// unchanged.
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        let (slot, child_rule) = match (self.schema.as_ref(), self.nodes[parent.0].rule) {
            (Some(schema), Some(tid)) => {
                let ty = schema.ty(tid);
                let Some((idx, decl)) = ty.node_slot(name) else {
                    return Err(TreeError::UnknownChild {
                        parent: ty.name().to_string(),
                        child: name.to_string(),
                    });
                };
                if decl.cardinality.single_instance() && !self.nodes[parent.0].node_slots[idx].is_empty() {
                    return Err(TreeError::SlotOccupied {
                        name: name.to_string(),
                    });
                }
                (idx, decl.child)
            }
            _ => (0, None),
        };

        let (node_slots, leaf_slots) = match (self.schema.as_ref(), child_rule) {
            (Some(schema), Some(tid)) => {
                let ty = schema.ty(tid);
                (ty.node_slots().len(), ty.leaf_slots().len())
            }
            _ => (1, 1),
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            name: name.to_string(),
            rule: child_rule,
            parent: Some(parent),
            node_slots: vec![Vec::new(); node_slots],
            leaf_slots: vec![Vec::new(); leaf_slots],
        });
        self.nodes[parent.0].node_slots[slot].push(id);
        Ok(id)
    }

    /// Returns the first child node with the given name, adding one if absent.
    pub fn get_or_add_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        if let Some(id) = self.find_node(parent, name) {
            return Ok(id);
        }
        self.add_node(parent, name)
    }

    /// Adds a child leaf carrying `value`.
    ///
    /// Slot matching and cardinality follow [`Tree::add_node`]; a bound slot
    /// additionally fixes the value type and (for strings) the maximum
    /// length.
    pub fn add_leaf(&mut self, parent: NodeId, name: &str, value: Value) -> Result<LeafId, TreeError> {
        self.insert_leaf(parent, name, value, None)
    }

    pub fn add_byte(&mut self, parent: NodeId, name: &str, v: u8) -> Result<LeafId, TreeError> {
        self.add_leaf(parent, name, Value::Byte(v))
    }

    pub fn add_int32(&mut self, parent: NodeId, name: &str, v: i32) -> Result<LeafId, TreeError> {
        self.add_leaf(parent, name, Value::Int32(v))
    }

    pub fn add_single(&mut self, parent: NodeId, name: &str, v: f32) -> Result<LeafId, TreeError> {
        self.add_leaf(parent, name, Value::Single(v))
    }

    pub fn add_string(&mut self, parent: NodeId, name: &str, s: &str) -> Result<LeafId, TreeError> {
        self.add_leaf(parent, name, Value::String(s.to_string()))
    }

    /// Adds a string leaf with an explicit maximum length.
    ///
    /// The cap is checked now and on every later `set_string`. A bound slot
    /// that declares its own maximum takes precedence.
    pub fn add_string_with_max(
        &mut self,
        parent: NodeId,
        name: &str,
        s: &str,
        max: usize,
    ) -> Result<LeafId, TreeError> {
        self.insert_leaf(parent, name, Value::String(s.to_string()), Some(max))
    }

    /// Adds a marker leaf carrying no value.
    pub fn add_void(&mut self, parent: NodeId, name: &str) -> Result<LeafId, TreeError> {
        self.add_leaf(parent, name, Value::Void)
    }

    fn insert_leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        value: Value,
        explicit_max: Option<usize>,
    ) -> Result<LeafId, TreeError> {
        let (slot, max_len) = match (self.schema.as_ref(), self.nodes[parent.0].rule) {
            (Some(schema), Some(tid)) => {
                let ty = schema.ty(tid);
                let Some((idx, decl)) = ty.leaf_slot(name) else {
                    return Err(TreeError::UnknownChild {
                        parent: ty.name().to_string(),
                        child: name.to_string(),
                    });
                };
                if decl.value_type != value.basic_type() {
                    return Err(TreeError::TypeMismatch {
                        name: name.to_string(),
                        expected: decl.value_type,
                        found: value.basic_type(),
                    });
                }
                if decl.cardinality.single_instance() && !self.nodes[parent.0].leaf_slots[idx].is_empty() {
                    return Err(TreeError::SlotOccupied {
                        name: name.to_string(),
                    });
                }
                (idx, decl.max_len.or(explicit_max))
            }
            _ => (0, explicit_max),
        };

        if let (Value::String(s), Some(max)) = (&value, max_len) {
            if s.len() > max {
                return Err(TreeError::StringTooLong {
                    name: name.to_string(),
                    len: s.len(),
                    max,
                });
            }
        }

        let id = LeafId(self.leaves.len());
        self.leaves.push(LeafEntry {
            name: name.to_string(),
            value,
            max_len,
            parent: Some(parent),
        });
        self.nodes[parent.0].leaf_slots[slot].push(id);
        Ok(id)
    }

    /// Detaches a node (and the subtree under it) from its parent.
    ///
    /// Returns whether the node was attached. The root is never attached.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        let mut detached = false;
        for slot in self.nodes[parent.0].node_slots.iter_mut() {
            if let Some(pos) = slot.iter().position(|&c| c == id) {
                slot.remove(pos);
                detached = true;
                break;
            }
        }
        if detached {
            self.nodes[id.0].parent = None;
        }
        detached
    }

    /// Detaches a leaf from its parent. Returns whether it was attached.
    pub fn remove_leaf(&mut self, id: LeafId) -> bool {
        let Some(parent) = self.leaves[id.0].parent else {
            return false;
        };
        let mut detached = false;
        for slot in self.nodes[parent.0].leaf_slots.iter_mut() {
            if let Some(pos) = slot.iter().position(|&c| c == id) {
                slot.remove(pos);
                detached = true;
                break;
            }
        }
        if detached {
            self.leaves[id.0].parent = None;
        }
        detached
    }

    // =========================================================================
    // LOOKUP & ITERATION
    // =========================================================================

    /// First child node with the given name, searching slots in order.
    pub fn find_node(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.child_nodes(parent).find(|&id| self.nodes[id.0].name == name)
    }

    /// Like [`Tree::find_node`], but absence is an error.
    pub fn get_node(&self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.find_node(parent, name).ok_or_else(|| TreeError::NodeNotFound {
            name: name.to_string(),
        })
    }

    /// First child leaf with the given name, searching slots in order.
    pub fn find_leaf(&self, parent: NodeId, name: &str) -> Option<LeafId> {
        self.child_leaves(parent).find(|&id| self.leaves[id.0].name == name)
    }

    /// Like [`Tree::find_leaf`], but absence is an error.
    pub fn get_leaf(&self, parent: NodeId, name: &str) -> Result<LeafId, TreeError> {
        self.find_leaf(parent, name).ok_or_else(|| TreeError::LeafNotFound {
            name: name.to_string(),
        })
    }

    /// Child nodes in canonical order: slot order, insertion order within a
    /// slot. This is the order the codecs serialize in.
    pub fn child_nodes(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[parent.0].node_slots.iter().flatten().copied()
    }

    /// Child leaves in canonical order.
    pub fn child_leaves(&self, parent: NodeId) -> impl Iterator<Item = LeafId> + '_ {
        self.nodes[parent.0].leaf_slots.iter().flatten().copied()
    }

    /// Total child-node count across all slots.
    pub fn node_count(&self, node: NodeId) -> usize {
        self.nodes[node.0].node_slots.iter().map(Vec::len).sum()
    }

    /// Total child-leaf count across all slots.
    pub fn leaf_count(&self, node: NodeId) -> usize {
        self.nodes[node.0].leaf_slots.iter().map(Vec::len).sum()
    }

    /// Instance count of one named node slot. Requires a bound rule.
    pub fn node_count_of(&self, node: NodeId, name: &str) -> Result<usize, TreeError> {
        match (self.schema.as_ref(), self.nodes[node.0].rule) {
            (Some(schema), Some(tid)) => {
                let ty = schema.ty(tid);
                let (idx, _) = ty.node_slot(name).ok_or_else(|| TreeError::UnknownChild {
                    parent: ty.name().to_string(),
                    child: name.to_string(),
                })?;
                Ok(self.nodes[node.0].node_slots[idx].len())
            }
            _ => Err(TreeError::UnboundRule {
                node: self.nodes[node.0].name.clone(),
            }),
        }
    }

    /// Instance count of one named leaf slot. Requires a bound rule.
    pub fn leaf_count_of(&self, node: NodeId, name: &str) -> Result<usize, TreeError> {
        match (self.schema.as_ref(), self.nodes[node.0].rule) {
            (Some(schema), Some(tid)) => {
                let ty = schema.ty(tid);
                let (idx, _) = ty.leaf_slot(name).ok_or_else(|| TreeError::UnknownChild {
                    parent: ty.name().to_string(),
                    child: name.to_string(),
                })?;
                Ok(self.nodes[node.0].leaf_slots[idx].len())
            }
            _ => Err(TreeError::UnboundRule {
                node: self.nodes[node.0].name.clone(),
            }),
        }
    }

    /// Depth-first traversal: the node itself, its leaves in slot order,
    /// then each child node recursively in slot order.
    pub fn walk<N, L>(&self, start: NodeId, visit_node: &mut N, visit_leaf: &mut L)
    where
        N: FnMut(&Tree, NodeId),
        L: FnMut(&Tree, LeafId),
    {
        visit_node(self, start);
        for leaf in self.child_leaves(start) {
            visit_leaf(self, leaf);
        }
        for child in self.child_nodes(start) {
            self.walk(child, visit_node, visit_leaf);
        }
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn leaf_name(&self, id: LeafId) -> &str {
        &self.leaves[id.0].name
    }

    /// The leaf's current value.
    pub fn value(&self, id: LeafId) -> &Value {
        &self.leaves[id.0].value
    }

    /// The parent a node is attached to, `None` for the root and for
    /// detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn leaf_parent(&self, id: LeafId) -> Option<NodeId> {
        self.leaves[id.0].parent
    }

    pub fn set_byte(&mut self, id: LeafId, v: u8) -> Result<(), TreeError> {
        self.set_value(id, Value::Byte(v))
    }

    pub fn set_int32(&mut self, id: LeafId, v: i32) -> Result<(), TreeError> {
        self.set_value(id, Value::Int32(v))
    }

    pub fn set_single(&mut self, id: LeafId, v: f32) -> Result<(), TreeError> {
        self.set_value(id, Value::Single(v))
    }

    pub fn set_string(&mut self, id: LeafId, s: &str) -> Result<(), TreeError> {
        self.set_value(id, Value::String(s.to_string()))
    }

    /// Replaces a leaf's value in place. The new value must keep the leaf's
    /// declared type, and string leaves keep honoring their maximum length.
    pub fn set_value(&mut self, id: LeafId, value: Value) -> Result<(), TreeError> {
        let entry = &mut self.leaves[id.0];
        let declared = entry.value.basic_type();
        if declared != value.basic_type() {
            return Err(TreeError::TypeMismatch {
                name: entry.name.clone(),
                expected: declared,
                found: value.basic_type(),
            });
        }
        if let (Value::String(s), Some(max)) = (&value, entry.max_len) {
            if s.len() > max {
                return Err(TreeError::StringTooLong {
                    name: entry.name.clone(),
                    len: s.len(),
                    max,
                });
            }
        }
        entry.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Schema;

    fn object_schema() -> Arc<Schema> {
        Arc::new(
            Schema::parse(
                "
                type Object
                  leaf Type int32 once
                  leaf X single optional
                  leaf Y single optional
                  leaf Z single optional
                type Objects
                  node Object any
                ",
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_schema_enforcement_on_leaves() {
        let mut tree = Tree::with_schema(object_schema(), "Object").unwrap();
        let root = tree.root();

        tree.add_int32(root, "Type", 50).unwrap();
        tree.add_single(root, "X", 1.5).unwrap();

        // Second Type violates the Once slot; the first stays intact.
        assert!(matches!(
            tree.add_int32(root, "Type", 51),
            Err(TreeError::SlotOccupied { .. })
        ));
        assert!(matches!(
            tree.add_int32(root, "Nonexistent", 1),
            Err(TreeError::UnknownChild { .. })
        ));

        let ty = tree.get_leaf(root, "Type").unwrap();
        assert_eq!(tree.value(ty), &Value::Int32(50));
        let x = tree.get_leaf(root, "X").unwrap();
        assert_eq!(tree.value(x), &Value::Single(1.5));
        assert_eq!(tree.leaf_count(root), 2);
    }

    #[test]
    fn test_leaf_type_must_match_slot() {
        let mut tree = Tree::with_schema(object_schema(), "Object").unwrap();
        let root = tree.root();
        assert!(matches!(
            tree.add_single(root, "Type", 1.0),
            Err(TreeError::TypeMismatch { .. })
        ));
        assert_eq!(tree.leaf_count(root), 0);
    }

    #[test]
    fn test_cardinality_counting() {
        let mut tree = Tree::with_schema(object_schema(), "Objects").unwrap();
        let root = tree.root();
        for ty in [10, 20, 30] {
            let obj = tree.add_node(root, "Object").unwrap();
            tree.add_int32(obj, "Type", ty).unwrap();
        }
        assert_eq!(tree.node_count_of(root, "Object").unwrap(), 3);
        assert_eq!(tree.node_count(root), 3);
        assert!(matches!(
            tree.node_count_of(root, "Widget"),
            Err(TreeError::UnknownChild { .. })
        ));
    }

    #[test]
    fn test_by_name_count_requires_rule() {
        let tree = Tree::new("Anything");
        assert!(matches!(
            tree.node_count_of(tree.root(), "Object"),
            Err(TreeError::UnboundRule { .. })
        ));
    }

    #[test]
    fn test_child_inherits_slot_rule() {
        let mut tree = Tree::with_schema(object_schema(), "Objects").unwrap();
        let obj = tree.add_node(tree.root(), "Object").unwrap();
        // The child is rule-bound, so its slots are enforced too.
        assert!(matches!(
            tree.add_int32(obj, "Bogus", 0),
            Err(TreeError::UnknownChild { .. })
        ));
        tree.add_int32(obj, "Type", 1).unwrap();
    }

    #[test]
    fn test_unbound_tree_accepts_anything() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        let a = tree.add_node(root, "A").unwrap();
        tree.add_node(root, "A").unwrap();
        tree.add_string(a, "Whatever", "x").unwrap();
        tree.add_void(a, "Marker").unwrap();
        assert_eq!(tree.node_count(root), 2);
        assert_eq!(tree.leaf_count(a), 2);
    }

    #[test]
    fn test_get_or_add_node() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        let first = tree.get_or_add_node(root, "Section").unwrap();
        let second = tree.get_or_add_node(root, "Section").unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.node_count(root), 1);
    }

    #[test]
    fn test_find_vs_get() {
        let tree = Tree::new("Root");
        assert!(tree.find_node(tree.root(), "Missing").is_none());
        assert!(matches!(
            tree.get_node(tree.root(), "Missing"),
            Err(TreeError::NodeNotFound { .. })
        ));
        assert!(matches!(
            tree.get_leaf(tree.root(), "Missing"),
            Err(TreeError::LeafNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_detaches_and_clears_backref() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        let child = tree.add_node(root, "Child").unwrap();
        let leaf = tree.add_int32(root, "N", 1).unwrap();

        assert_eq!(tree.parent(child), Some(root));
        assert!(tree.remove_node(child));
        assert_eq!(tree.parent(child), None);
        assert_eq!(tree.node_count(root), 0);
        // Already detached: a second remove is a no-op.
        assert!(!tree.remove_node(child));

        assert!(tree.remove_leaf(leaf));
        assert_eq!(tree.leaf_parent(leaf), None);
        assert!(!tree.remove_leaf(leaf));
    }

    #[test]
    fn test_root_is_not_removable() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        assert!(!tree.remove_node(root));
    }

    #[test]
    fn test_enumeration_follows_slot_order() {
        // Slot order comes from the schema, not insertion order.
        let schema = Arc::new(
            Schema::parse(
                "
                type Pair
                  leaf First int32 optional
                  leaf Second int32 optional
                ",
            )
            .unwrap(),
        );
        let mut tree = Tree::with_schema(schema, "Pair").unwrap();
        let root = tree.root();
        tree.add_int32(root, "Second", 2).unwrap();
        tree.add_int32(root, "First", 1).unwrap();

        let names: Vec<_> = tree
            .child_leaves(root)
            .map(|l| tree.leaf_name(l).to_string())
            .collect();
        assert_eq!(names, ["First", "Second"]);
    }

    #[test]
    fn test_walk_order() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        tree.add_int32(root, "RootLeaf", 0).unwrap();
        let a = tree.add_node(root, "A").unwrap();
        tree.add_int32(a, "ALeaf", 1).unwrap();
        let b = tree.add_node(root, "B").unwrap();
        tree.add_int32(b, "BLeaf", 2).unwrap();

        let log = std::cell::RefCell::new(Vec::new());
        tree.walk(
            root,
            &mut |t, n| log.borrow_mut().push(format!("n:{}", t.node_name(n))),
            &mut |t, l| log.borrow_mut().push(format!("l:{}", t.leaf_name(l))),
        );
        assert_eq!(
            log.into_inner(),
            ["n:Root", "l:RootLeaf", "n:A", "l:ALeaf", "n:B", "l:BLeaf"]
        );
    }

    #[test]
    fn test_set_value_checks_type_and_length() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        let n = tree.add_int32(root, "N", 1).unwrap();
        tree.set_int32(n, 2).unwrap();
        assert_eq!(tree.value(n), &Value::Int32(2));
        assert!(matches!(
            tree.set_single(n, 1.0),
            Err(TreeError::TypeMismatch { .. })
        ));

        let s = tree.add_string_with_max(root, "Name", "ok", 4).unwrap();
        tree.set_string(s, "four").unwrap();
        assert!(matches!(
            tree.set_string(s, "toolong"),
            Err(TreeError::StringTooLong { .. })
        ));
        assert_eq!(tree.value(s).as_str(), Some("four"));
    }

    #[test]
    fn test_add_string_over_max_rejected() {
        let mut tree = Tree::new("Root");
        let root = tree.root();
        assert!(matches!(
            tree.add_string_with_max(root, "Name", "excessive", 4),
            Err(TreeError::StringTooLong { .. })
        ));
        assert_eq!(tree.leaf_count(root), 0);
    }

    #[test]
    fn test_slot_max_len_applies_to_bound_leaves() {
        let schema = Arc::new(Schema::parse("type H\n  leaf Name string(3) once\n").unwrap());
        let mut tree = Tree::with_schema(schema, "H").unwrap();
        let root = tree.root();
        assert!(matches!(
            tree.add_string(root, "Name", "long"),
            Err(TreeError::StringTooLong { .. })
        ));
        tree.add_string(root, "Name", "ok").unwrap();
    }
}
