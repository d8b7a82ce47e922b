//! Phase 2: threshold-based fuzzy pairing.
//!
//! Candidate pairs are unmatched nodes sharing a label, or value-bearing
//! leaves sharing a [`ShapeClass`]. Every candidate at or above the
//! threshold is scored once; pairs are then accepted greedily from the best
//! down. Scores do not depend on the matching, so this is the same as
//! repeatedly taking the best remaining pair over a shrinking frontier.
//!
//! Ordering: similarity (desc), semantic distance (asc), combined subtree
//! size (asc), combined weight (asc), then node ids for determinism.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::AttributeOrder;
use crate::matching::Matching;
use crate::signature::Weight;
use crate::tree::{NodeId, ShapeClass, Tree};

use super::MatchPhase;

#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
    pub threshold: f64,
    pub attribute_order: AttributeOrder,
}

struct Candidate {
    a: NodeId,
    b: NodeId,
    similarity: f64,
    distance: f64,
    size: usize,
    weight: f64,
}

impl Candidate {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.distance.total_cmp(&other.distance))
            .then_with(|| self.size.cmp(&other.size))
            .then_with(|| self.weight.total_cmp(&other.weight))
            .then_with(|| self.a.cmp(&other.a))
            .then_with(|| self.b.cmp(&other.b))
    }
}

impl SimilarityMatcher {
    pub fn new(threshold: f64, attribute_order: AttributeOrder) -> Self {
        Self { threshold, attribute_order }
    }

    fn candidates(&self, matching: &Matching<'_>) -> Vec<Candidate> {
        let tree1 = matching.tree1();
        let tree2 = matching.tree2();
        let frontier1 = matching.unmatched1(tree1.preorder(tree1.root()));
        let frontier2 = matching.unmatched2(tree2.preorder(tree2.root()));
        if frontier1.is_empty() || frontier2.is_empty() {
            return Vec::new();
        }

        let mut by_label: HashMap<&str, Vec<NodeId>> = HashMap::new();
        let mut by_shape: HashMap<ShapeClass, Vec<NodeId>> = HashMap::new();
        for &b in &frontier2 {
            by_label.entry(tree2.label(b)).or_default().push(b);
            if let Some(shape) = tree2.shape_class(b) {
                by_shape.entry(shape).or_default().push(b);
            }
        }

        let sizes1 = subtree_sizes(tree1);
        let sizes2 = subtree_sizes(tree2);

        let mut out = Vec::new();
        let mut pool: Vec<NodeId> = Vec::new();
        for &a in &frontier1 {
            pool.clear();
            if let Some(same_label) = by_label.get(tree1.label(a)) {
                pool.extend_from_slice(same_label);
            }
            if let Some(same_shape) = tree1.shape_class(a).and_then(|s| by_shape.get(&s)) {
                pool.extend_from_slice(same_shape);
            }
            pool.sort_unstable();
            pool.dedup();

            for &b in &pool {
                let similarity = tree1.similarity_to(a, tree2, b, self.attribute_order);
                if similarity < self.threshold {
                    continue;
                }
                out.push(Candidate {
                    a,
                    b,
                    similarity,
                    distance: tree1.semantic_distance_to(a, tree2, b, self.attribute_order),
                    size: sizes1[a.index()] + sizes2[b.index()],
                    weight: Weight::of(tree1, a).value() + Weight::of(tree2, b).value(),
                });
            }
        }
        out
    }
}

impl MatchPhase for SimilarityMatcher {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn apply(&self, matching: &mut Matching<'_>) -> usize {
        let mut candidates = self.candidates(matching);
        candidates.sort_by(Candidate::rank);

        let mut added = 0;
        for c in candidates {
            if matching.is_matched1(c.a) || matching.is_matched2(c.b) {
                continue;
            }
            if matching.add(c.a, c.b) {
                added += 1;
            }
        }
        added
    }
}

/// Subtree size of every attached node, indexed by arena slot.
fn subtree_sizes(tree: &Tree) -> Vec<usize> {
    let mut sizes = vec![0usize; tree.arena_len()];
    let order: Vec<NodeId> = tree.preorder(tree.root()).collect();
    for &id in order.iter().rev() {
        sizes[id.index()] = 1 + tree.children(id).iter().map(|c| sizes[c.index()]).sum::<usize>();
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;

    fn matcher(threshold: f64) -> SimilarityMatcher {
        SimilarityMatcher::new(threshold, AttributeOrder::Ignore)
    }

    #[test]
    fn subtree_sizes_bottom_up() {
        let mut t = Tree::new(NodeData::new("root"));
        let a = t.append(t.root(), NodeData::new("a"));
        t.append(a, NodeData::new("b"));
        let sizes = subtree_sizes(&t);
        assert_eq!(sizes, vec![3, 2, 1]);
    }

    #[test]
    fn pairs_roots_with_same_shallow_payload() {
        let mut t1 = Tree::new(NodeData::new("root"));
        t1.append(t1.root(), NodeData::text("p", "one"));
        let mut t2 = Tree::new(NodeData::new("root"));
        t2.append(t2.root(), NodeData::text("p", "one"));
        t2.append(t2.root(), NodeData::text("p", "two"));

        let mut m = Matching::new(&t1, &t2);
        let added = matcher(0.95).apply(&mut m);
        assert!(m.contains(t1.root(), t2.root()));
        assert_eq!(added, 2);
        assert!(m.contains(NodeId(1), NodeId(1)));
    }

    #[test]
    fn threshold_blocks_weak_pairs() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::text("p", "alpha beta"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let b = t2.append(t2.root(), NodeData::text("p", "alpha gamma"));

        let mut m = Matching::new(&t1, &t2);
        matcher(0.95).apply(&mut m);
        assert!(!m.is_matched1(a));

        let mut m = Matching::new(&t1, &t2);
        // 0.3 + 0.4 * 0.5 + 0.3 = 0.8
        matcher(0.75).apply(&mut m);
        assert!(m.contains(a, b));
    }

    #[test]
    fn best_pair_wins() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::text("p", "a b c d"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let weak = t2.append(t2.root(), NodeData::text("p", "a b x y"));
        let strong = t2.append(t2.root(), NodeData::text("p", "a b c y"));

        let mut m = Matching::new(&t1, &t2);
        matcher(0.5).apply(&mut m);
        assert!(m.contains(a, strong));
        assert!(!m.is_matched2(weak));
    }

    #[test]
    fn shape_class_pairs_across_labels() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::text("price", "10"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let b = t2.append(t2.root(), NodeData::text("cost", "10"));

        let mut m = Matching::new(&t1, &t2);
        // label mismatch caps the score at 0.7
        matcher(0.65).apply(&mut m);
        assert!(m.contains(a, b));
    }

    #[test]
    fn equal_scores_prefer_same_depth() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::text("p", "x"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let wrap = t2.append(t2.root(), NodeData::new("div"));
        let deep = t2.append(wrap, NodeData::text("p", "x"));
        let shallow = t2.append(t2.root(), NodeData::text("p", "x"));

        let mut m = Matching::new(&t1, &t2);
        assert!(m.add(t1.root(), t2.root()));
        matcher(0.95).apply(&mut m);
        assert!(m.contains(a, shallow));
        assert!(!m.is_matched2(deep));
    }
}
