//! Neutral document tree.
//!
//! Nodes live in a flat arena owned by [`Tree`]; parent and child links are
//! [`NodeId`] indices into that arena. Children are exclusively owned by
//! their parent, the parent link is a plain back-reference.
//!
//! Derived values ([`Signature`], [`Weight`]) are memoized per node in
//! `OnceCell`s. Only the tree's own mutators (`add_child`, `remove_child`,
//! `replace_child`, `set_value`, `set_label`) clear them.
//!
//! Nodes removed from the tree stay in the arena, detached: they have no
//! parent, are not reachable from the root, and are skipped by traversals
//! started at the root. They can be re-attached with `add_child`, which
//! also moves nodes that are still attached.

mod clone;
mod compare;
mod node;

use std::cell::OnceCell;

use thiserror::Error;

use crate::signature::{Signature, Weight};

pub use compare::ShapeClass;
pub(crate) use compare::same_shared_key_order;
pub use node::{Attributes, NodeData, NodeId};

/// Error returned by structural tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not belong to this tree")]
    UnknownNode(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("position {position} out of range for {len} children")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCreateCycle { parent: NodeId, child: NodeId },
    #[error("node {0} is already attached")]
    AlreadyAttached(NodeId),
}

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) signature: OnceCell<Signature>,
    pub(crate) weight: OnceCell<Weight>,
}

impl Slot {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            signature: OnceCell::new(),
            weight: OnceCell::new(),
        }
    }
}

/// Arena-backed neutral tree.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Tree {
    /// New tree consisting of a single root node.
    pub fn new(root: NodeData) -> Self {
        Self {
            slots: vec![Slot::new(root)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena slots, detached nodes included.
    pub fn arena_len(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.slots.len()
    }

    #[inline]
    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.index()]
    }

    /// Allocate a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot::new(data));
        id
    }

    /// Create a node and append it as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not issued by this tree.
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        assert!(self.contains(parent), "unknown parent {parent}");
        let id = self.create(data);
        self.attach(parent, id, self.slot(parent).children.len());
        id
    }

    // ── Accessors ────────────────────────────────────────────────────────

    /// Node payload.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.slot(id).data
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.slots.get(id.index()).map(|s| &s.data)
    }

    #[inline]
    pub fn label(&self, id: NodeId) -> &str {
        &self.slot(id).data.label
    }

    #[inline]
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.slot(id).data.value.as_deref()
    }

    #[inline]
    pub fn attributes(&self, id: NodeId) -> &Attributes {
        &self.slot(id).data.attributes
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    // ── Shape queries ────────────────────────────────────────────────────

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.slot(id).children.is_empty()
    }

    /// Leaf carrying a value.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.is_leaf(id) && self.slot(id).data.value.is_some()
    }

    /// Has children or non-empty attributes.
    pub fn is_element(&self, id: NodeId) -> bool {
        let slot = self.slot(id);
        !slot.children.is_empty() || !slot.data.attributes.is_empty()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Reachable from the root through `children` links.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(self.root)
    }

    /// Index within the parent's children; `None` at the root or when
    /// detached.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Number of ancestors.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Length of the longest downward path; 0 for a leaf.
    pub fn height(&self, id: NodeId) -> usize {
        self.children(id)
            .iter()
            .map(|&c| self.height(c) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in the subtree, including `id`.
    pub fn size(&self, id: NodeId) -> usize {
        self.preorder(id).count()
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Depth-first pre-order walk of the subtree, `id` first.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Depth-first pre-order walk of the subtree, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Preorder<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Preorder { tree: self, stack }
    }

    /// Other children of the parent, in document order.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(p) => self.children(p).iter().copied().filter(|&c| c != id).collect(),
            None => Vec::new(),
        }
    }

    pub fn left_siblings(&self, id: NodeId) -> &[NodeId] {
        match (self.parent(id), self.position(id)) {
            (Some(p), Some(i)) => &self.children(p)[..i],
            _ => &[],
        }
    }

    pub fn right_siblings(&self, id: NodeId) -> &[NodeId] {
        match (self.parent(id), self.position(id)) {
            (Some(p), Some(i)) => &self.children(p)[i + 1..],
            _ => &[],
        }
    }

    /// Text carried by the subtree: the node's own value for a leaf,
    /// otherwise the values of its descendants joined by a space.
    pub fn text_content(&self, id: NodeId) -> String {
        if self.is_leaf(id) {
            return self.value(id).unwrap_or_default().to_string();
        }
        let parts: Vec<&str> = self
            .descendants(id)
            .filter_map(|d| self.value(d))
            .filter(|v| !v.is_empty())
            .collect();
        parts.join(" ")
    }

    // ── Mutators ─────────────────────────────────────────────────────────

    /// Attach `child` under `parent` at `position` (`None` appends).
    ///
    /// A child attached elsewhere is first detached from its old parent, and
    /// `position` then counts the new parent's children without it. The root
    /// cannot be attached.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: Option<usize>,
    ) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        let old_parent = self.parent(child);
        let len = self.slot(parent).children.len() - usize::from(old_parent == Some(parent));
        let position = position.unwrap_or(len);
        if position > len {
            return Err(TreeError::PositionOutOfRange { position, len });
        }
        if let (Some(old), Some(index)) = (old_parent, self.position(child)) {
            self.detach(old, index);
        }
        self.attach(parent, child, position);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns the removed node, or `None` if
    /// it is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        if !self.contains(parent) || !self.contains(child) {
            return None;
        }
        let index = self.slot(parent).children.iter().position(|&c| c == child)?;
        Some(self.detach(parent, index))
    }

    /// Put the detached node `new` where `old` was. Returns `old`, now
    /// detached.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<NodeId, TreeError> {
        self.check_attachable(parent, new)?;
        if self.parent(new).is_some() {
            return Err(TreeError::AlreadyAttached(new));
        }
        if !self.contains(old) {
            return Err(TreeError::UnknownNode(old));
        }
        let index = self
            .slot(parent)
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or(TreeError::NotAChild { parent, child: old })?;
        self.slots[parent.index()].children[index] = new;
        self.slots[old.index()].parent = None;
        self.slots[new.index()].parent = Some(parent);
        self.invalidate_weights(parent);
        self.invalidate_signatures(old);
        self.invalidate_signatures(new);
        Ok(old)
    }

    /// Replace the node's value.
    pub fn set_value(&mut self, id: NodeId, value: Option<String>) {
        self.slots[id.index()].data.value = value;
        self.invalidate_weights(id);
        self.invalidate_signatures(id);
    }

    /// Replace the node's label.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        self.slots[id.index()].data.label = label.into();
        self.invalidate_signatures(id);
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        if !self.contains(child) {
            return Err(TreeError::UnknownNode(child));
        }
        if child == self.root {
            return Err(TreeError::AlreadyAttached(child));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::WouldCreateCycle { parent, child });
        }
        Ok(())
    }

    fn detach(&mut self, parent: NodeId, index: usize) -> NodeId {
        let child = self.slots[parent.index()].children.remove(index);
        self.slots[child.index()].parent = None;
        self.invalidate_weights(parent);
        self.invalidate_own_signature(parent);
        self.invalidate_signatures(child);
        child
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: usize) {
        self.slots[parent.index()].children.insert(position, child);
        self.slots[child.index()].parent = Some(parent);
        self.invalidate_weights(parent);
        self.invalidate_own_signature(parent);
        self.invalidate_signatures(child);
    }

    /// Weight depends on the subtree: clear it on `from` and every ancestor.
    fn invalidate_weights(&mut self, from: NodeId) {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let slot = &mut self.slots[id.index()];
            slot.weight.take();
            cursor = slot.parent;
        }
    }

    /// Signature depends on the ancestor path: clear it on the whole subtree.
    fn invalidate_signatures(&mut self, subtree: NodeId) {
        let mut stack = vec![subtree];
        while let Some(id) = stack.pop() {
            let slot = &mut self.slots[id.index()];
            slot.signature.take();
            stack.extend(slot.children.iter().copied());
        }
    }

    /// A parent gaining or losing children may flip between text leaf and
    /// branch, which changes its own signature segment.
    fn invalidate_own_signature(&mut self, id: NodeId) {
        self.slots[id.index()].signature.take();
    }
}

// ── Iterators ──────────────────────────────────────────────────────────────

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}

/// Depth-first pre-order iterator.
pub struct Preorder<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Push children in reverse so the first child is popped first
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
