//! Phase 1: exact-signature pairing.
//!
//! Unmatched tree2 nodes are bucketed by `(signature, shallow hash)` in
//! pre-order. Tree1 is walked in pre-order and every unmatched node is
//! paired with the first bucket entry that is still free, shallowly equal
//! and accepted by the [`Matching`]. Entries whose whole subtree is
//! identical are tried before the rest, so reordered look-alike siblings
//! keep their own content. Structurally unmoved nodes are recovered without
//! any scoring.

use std::collections::HashMap;

use crate::hash::{shallow_hash, subtree_hashes};
use crate::matching::Matching;
use crate::signature::Signature;
use crate::tree::NodeId;

use super::MatchPhase;

#[derive(Debug, Clone, Copy, Default)]
pub struct HashMatcher;

struct Bucket {
    nodes: Vec<NodeId>,
    /// Entries before `cursor` are known to be matched.
    cursor: usize,
}

impl MatchPhase for HashMatcher {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn apply(&self, matching: &mut Matching<'_>) -> usize {
        let tree1 = matching.tree1();
        let tree2 = matching.tree2();

        let mut index: HashMap<(&Signature, u32), Bucket> = HashMap::new();
        for b in matching.unmatched2(tree2.preorder(tree2.root())) {
            let key = (Signature::of(tree2, b), shallow_hash(tree2, b));
            index
                .entry(key)
                .or_insert_with(|| Bucket { nodes: Vec::new(), cursor: 0 })
                .nodes
                .push(b);
        }

        let deep1 = subtree_hashes(tree1);
        let deep2 = subtree_hashes(tree2);

        let mut added = 0;
        for a in tree1.preorder(tree1.root()) {
            if matching.is_matched1(a) {
                continue;
            }
            let key = (Signature::of(tree1, a), shallow_hash(tree1, a));
            let Some(bucket) = index.get_mut(&key) else { continue };

            while bucket.cursor < bucket.nodes.len()
                && matching.is_matched2(bucket.nodes[bucket.cursor])
            {
                bucket.cursor += 1;
            }
            let free = &bucket.nodes[bucket.cursor..];
            let identical = free.iter().filter(|&&b| deep2[b.index()] == deep1[a.index()]);
            let rest = free.iter().filter(|&&b| deep2[b.index()] != deep1[a.index()]);
            for &b in identical.chain(rest) {
                if matching.is_matched2(b) || !tree1.matches(a, tree2, b) {
                    continue;
                }
                if matching.add(a, b) {
                    added += 1;
                    break;
                }
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeData, Tree};

    #[test]
    fn identical_trees_fully_match() {
        let mut t = Tree::new(NodeData::new("root"));
        let a = t.append(t.root(), NodeData::new("div"));
        t.append(a, NodeData::text("text", "same"));
        t.append(a, NodeData::text("text", "same"));
        t.append(t.root(), NodeData::text("p", "tail"));
        let copy = t.deep_clone(t.root());

        let mut m = Matching::new(&t, &copy);
        assert_eq!(HashMatcher.apply(&mut m), 5);
        assert!(m.is_valid());
        for id in t.preorder(t.root()) {
            assert_eq!(m.partner1(id), Some(id));
        }
    }

    #[test]
    fn differing_values_are_left_for_later_phases() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::text("child", "A"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let b = t2.append(t2.root(), NodeData::text("child", "B"));

        let mut m = Matching::new(&t1, &t2);
        assert_eq!(HashMatcher.apply(&mut m), 1);
        assert!(m.contains(t1.root(), t2.root()));
        assert!(!m.is_matched1(a));
        assert!(!m.is_matched2(b));
    }

    #[test]
    fn swapped_leaves_pair_by_content() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a1 = t1.append(t1.root(), NodeData::text("child1", "A"));
        let b1 = t1.append(t1.root(), NodeData::text("child2", "B"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let b2 = t2.append(t2.root(), NodeData::text("child2", "B"));
        let a2 = t2.append(t2.root(), NodeData::text("child1", "A"));

        let mut m = Matching::new(&t1, &t2);
        HashMatcher.apply(&mut m);
        assert!(m.contains(a1, a2));
        assert!(m.contains(b1, b2));
        // child label order differs, so the roots are not shallowly equal
        assert!(!m.is_matched1(t1.root()));
    }

    #[test]
    fn existing_pairs_are_respected() {
        let mut t = Tree::new(NodeData::new("root"));
        let x = t.append(t.root(), NodeData::text("p", "x"));
        let y = t.append(t.root(), NodeData::text("p", "x"));
        let copy = t.deep_clone(t.root());

        let mut m = Matching::new(&t, &copy);
        assert!(m.add(x, y));
        HashMatcher.apply(&mut m);
        assert!(m.contains(y, x));
        assert!(m.contains(t.root(), copy.root()));
    }

    #[test]
    fn reordered_look_alikes_keep_their_content() {
        let mut t1 = Tree::new(NodeData::new("ul"));
        let li1 = t1.append(t1.root(), NodeData::new("li"));
        let one1 = t1.append(li1, NodeData::text("text", "one"));
        let li2 = t1.append(t1.root(), NodeData::new("li"));
        t1.append(li2, NodeData::text("text", "two"));
        let mut t2 = Tree::new(NodeData::new("ul"));
        let li_two = t2.append(t2.root(), NodeData::new("li"));
        t2.append(li_two, NodeData::text("text", "two"));
        let li_one = t2.append(t2.root(), NodeData::new("li"));
        let one2 = t2.append(li_one, NodeData::text("text", "one"));

        let mut m = Matching::new(&t1, &t2);
        assert_eq!(HashMatcher.apply(&mut m), 5);
        assert!(m.contains(li1, li_one));
        assert!(m.contains(one1, one2));
        assert!(m.contains(li2, li_two));
    }
}
