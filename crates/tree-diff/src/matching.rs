//! Validated node correspondence between two trees.
//!
//! [`Matching`] is the only place pairs are recorded. Every addition is
//! checked against two invariants:
//!
//! - **one-to-one**: a node appears in at most one pair;
//! - **prefix closure**: when both nodes of a pair have matched parents,
//!   those parents are paired with each other.
//!
//! A violating addition is rejected with `false`; it is ordinary control
//! flow for the matcher phases, not an error.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;

use crate::tree::{NodeId, Tree};

pub struct Matching<'t> {
    tree1: &'t Tree,
    tree2: &'t Tree,
    /// tree1 → tree2, in insertion order.
    forward: IndexMap<NodeId, NodeId>,
    /// tree2 → tree1.
    backward: HashMap<NodeId, NodeId>,
}

impl<'t> Matching<'t> {
    pub fn new(tree1: &'t Tree, tree2: &'t Tree) -> Self {
        Self {
            tree1,
            tree2,
            forward: IndexMap::new(),
            backward: HashMap::new(),
        }
    }

    pub fn tree1(&self) -> &'t Tree {
        self.tree1
    }

    pub fn tree2(&self) -> &'t Tree {
        self.tree2
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Pairs in the order they were added.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.forward.iter().map(|(&a, &b)| (a, b))
    }

    pub fn partner1(&self, a: NodeId) -> Option<NodeId> {
        self.forward.get(&a).copied()
    }

    pub fn partner2(&self, b: NodeId) -> Option<NodeId> {
        self.backward.get(&b).copied()
    }

    pub fn is_matched1(&self, a: NodeId) -> bool {
        self.forward.contains_key(&a)
    }

    pub fn is_matched2(&self, b: NodeId) -> bool {
        self.backward.contains_key(&b)
    }

    pub fn contains(&self, a: NodeId, b: NodeId) -> bool {
        self.partner1(a) == Some(b)
    }

    /// Record `a ↔ b` if doing so keeps both invariants. Returns whether the
    /// pair was added.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.tree1.contains(a) || !self.tree2.contains(b) {
            trace!("reject {a}<->{b}: unknown node");
            return false;
        }
        if self.is_matched1(a) || self.is_matched2(b) {
            trace!("reject {a}<->{b}: already matched");
            return false;
        }
        if !self.parents_consistent(a, b) {
            trace!("reject {a}<->{b}: parents paired elsewhere");
            return false;
        }
        if !self.children_consistent(a, b) {
            trace!("reject {a}<->{b}: matched children disagree");
            return false;
        }
        self.forward.insert(a, b);
        self.backward.insert(b, a);
        true
    }

    /// Remove the pair `a ↔ b`. Returns whether it existed.
    pub fn remove_pair(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.contains(a, b) {
            return false;
        }
        self.forward.shift_remove(&a);
        self.backward.remove(&b);
        true
    }

    /// Keep only the nodes of tree1 not yet matched.
    pub fn unmatched1<I: IntoIterator<Item = NodeId>>(&self, nodes: I) -> Vec<NodeId> {
        nodes.into_iter().filter(|&a| !self.is_matched1(a)).collect()
    }

    /// Keep only the nodes of tree2 not yet matched.
    pub fn unmatched2<I: IntoIterator<Item = NodeId>>(&self, nodes: I) -> Vec<NodeId> {
        nodes.into_iter().filter(|&b| !self.is_matched2(b)).collect()
    }

    // ── Invariant checks ─────────────────────────────────────────────────

    /// The new pair's own parents, if both matched, must be paired together.
    fn parents_consistent(&self, a: NodeId, b: NodeId) -> bool {
        match (self.tree1.parent(a), self.tree2.parent(b)) {
            (Some(pa), Some(pb)) => match (self.partner1(pa), self.partner2(pb)) {
                (Some(_), Some(_)) => self.contains(pa, pb),
                _ => true,
            },
            _ => true,
        }
    }

    /// Once `a ↔ b` exists, every matched child of `a` whose partner has a
    /// matched parent must have `b` as that parent, and symmetrically.
    fn children_consistent(&self, a: NodeId, b: NodeId) -> bool {
        let left_ok = self.tree1.children(a).iter().all(|&c| {
            let Some(partner) = self.partner1(c) else { return true };
            match self.tree2.parent(partner) {
                Some(q) if q != b => !self.is_matched2(q),
                _ => true,
            }
        });
        left_ok
            && self.tree2.children(b).iter().all(|&c| {
                let Some(partner) = self.partner2(c) else { return true };
                match self.tree1.parent(partner) {
                    Some(q) if q != a => !self.is_matched1(q),
                    _ => true,
                }
            })
    }

    /// Re-derive the one-to-one invariant from scratch.
    pub fn is_one_to_one(&self) -> bool {
        self.forward.len() == self.backward.len()
            && self
                .forward
                .iter()
                .all(|(a, b)| self.backward.get(b) == Some(a))
    }

    /// Re-derive the prefix-closure invariant from scratch.
    pub fn is_prefix_closed(&self) -> bool {
        self.pairs().all(|(a, b)| {
            match (self.tree1.parent(a), self.tree2.parent(b)) {
                (Some(pa), Some(pb)) if self.is_matched1(pa) && self.is_matched2(pb) => {
                    self.contains(pa, pb)
                }
                _ => true,
            }
        })
    }

    pub fn is_valid(&self) -> bool {
        self.is_one_to_one() && self.is_prefix_closed()
    }
}

impl std::fmt::Debug for Matching<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.forward.iter()).finish()
    }
}
