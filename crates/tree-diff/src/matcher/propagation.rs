//! Phase 3: context-driven extension of the matching.
//!
//! When a matched pair has exactly one unmatched child on each side and
//! those children have compatible labels, the surrounding context implies
//! they are the same node, whatever their similarity. Newly added pairs are
//! queued so their own children are examined too, until a fixed point.

use std::collections::VecDeque;

use crate::matching::Matching;
use crate::tree::{NodeId, Tree};

use super::MatchPhase;

#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralPropagator;

impl StructuralPropagator {
    /// Equal labels, or both value-bearing leaves.
    fn compatible(tree1: &Tree, a: NodeId, tree2: &Tree, b: NodeId) -> bool {
        tree1.label(a) == tree2.label(b) || (tree1.is_text(a) && tree2.is_text(b))
    }

    fn sole_unmatched(matching: &Matching<'_>, a: NodeId, b: NodeId) -> Option<(NodeId, NodeId)> {
        let tree1 = matching.tree1();
        let tree2 = matching.tree2();
        let left = matching.unmatched1(tree1.children(a).iter().copied());
        let right = matching.unmatched2(tree2.children(b).iter().copied());
        match (left.as_slice(), right.as_slice()) {
            ([x], [y]) if Self::compatible(tree1, *x, tree2, *y) => Some((*x, *y)),
            _ => None,
        }
    }
}

impl MatchPhase for StructuralPropagator {
    fn name(&self) -> &'static str {
        "propagation"
    }

    fn apply(&self, matching: &mut Matching<'_>) -> usize {
        let mut queue: VecDeque<(NodeId, NodeId)> = matching.pairs().collect();
        let mut added = 0;
        while let Some((a, b)) = queue.pop_front() {
            let Some((x, y)) = Self::sole_unmatched(matching, a, b) else { continue };
            if matching.add(x, y) {
                added += 1;
                queue.push_back((x, y));
            }
        }
        added
    }
}
