//! Structural fingerprints of tree nodes.
//!
//! - [`Signature`]: the root-to-node label path, with value-bearing leaves
//!   collapsed to a constant marker. Equal signatures mean "same shape at
//!   the same structural path".
//! - [`Weight`]: approximate subtree mass. Text leaves grow
//!   logarithmically with their length so long text does not dominate.
//!
//! Both are memoized on the node (`of`) and can be recomputed from scratch
//! (`compute`). The memoized path reuses the parent's cached signature and
//! the children's cached weights, so filling a whole tree is linear.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::tree::{NodeId, Tree};

/// Segment used in place of `"/" + label` for value-bearing leaves.
pub const TEXT_MARKER: &str = "/#text";

// ── Signature ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    /// Memoized signature of `id`.
    pub fn of(tree: &Tree, id: NodeId) -> &Signature {
        tree.slot(id).signature.get_or_init(|| {
            let prefix = match tree.parent(id) {
                Some(parent) => Signature::of(tree, parent).as_str(),
                None => "",
            };
            Signature(format!("{prefix}{}", segment(tree, id)))
        })
    }

    /// Signature of `id` computed without reading or filling any cache.
    pub fn compute(tree: &Tree, id: NodeId) -> Signature {
        let mut path: Vec<NodeId> = tree.ancestors(id).collect();
        path.reverse();
        let mut out = String::new();
        for ancestor in path {
            out.push_str(&segment(tree, ancestor));
        }
        out.push_str(&segment(tree, id));
        Signature(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn segment(tree: &Tree, id: NodeId) -> String {
    if tree.is_text(id) {
        TEXT_MARKER.to_string()
    } else {
        format!("/{}", tree.label(id))
    }
}

// ── Weight ────────────────────────────────────────────────────────────────

/// Subtree mass. Always finite and at least 1.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Weight(f64);

impl Weight {
    /// Memoized weight of `id`.
    pub fn of(tree: &Tree, id: NodeId) -> Weight {
        *tree.slot(id).weight.get_or_init(|| {
            if tree.is_leaf(id) {
                leaf_weight(tree, id)
            } else {
                let sum: f64 = tree.children(id).iter().map(|&c| Weight::of(tree, c).0).sum();
                Weight(1.0 + sum)
            }
        })
    }

    /// Weight of `id` computed without reading or filling any cache.
    pub fn compute(tree: &Tree, id: NodeId) -> Weight {
        if tree.is_leaf(id) {
            return leaf_weight(tree, id);
        }
        let sum: f64 = tree.children(id).iter().map(|&c| Weight::compute(tree, c).0).sum();
        Weight(1.0 + sum)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

fn leaf_weight(tree: &Tree, id: NodeId) -> Weight {
    match tree.value(id) {
        Some(text) => Weight(1.0 + ((text.chars().count() + 1) as f64).ln()),
        None => Weight(1.0),
    }
}

impl Eq for Weight {}

impl Hash for Weight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;
    use std::collections::HashMap;

    fn doc() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new(NodeData::new("html"));
        let body = tree.append(tree.root(), NodeData::new("body"));
        let p = tree.append(body, NodeData::new("p"));
        let text = tree.append(p, NodeData::text("text", "hello"));
        (tree, body, p, text)
    }

    #[test]
    fn signature_is_label_path() {
        let (tree, body, p, text) = doc();
        assert_eq!(Signature::of(&tree, tree.root()).as_str(), "/html");
        assert_eq!(Signature::of(&tree, body).as_str(), "/html/body");
        assert_eq!(Signature::of(&tree, p).as_str(), "/html/body/p");
        assert_eq!(Signature::of(&tree, text).as_str(), "/html/body/p/#text");
    }

    #[test]
    fn memoized_equals_computed() {
        let (tree, _, _, text) = doc();
        assert_eq!(Signature::of(&tree, text), &Signature::compute(&tree, text));
        assert_eq!(Weight::of(&tree, tree.root()), Weight::compute(&tree, tree.root()));
    }

    #[test]
    fn value_leaf_label_is_replaced_by_marker() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::text("child1", "A"));
        let b = t1.append(t1.root(), NodeData::text("child2", "B"));
        let c = t1.append(t1.root(), NodeData::new("child3"));
        assert_eq!(Signature::of(&t1, a), Signature::of(&t1, b));
        assert_eq!(Signature::of(&t1, c).as_str(), "/root/child3");
    }

    #[test]
    fn moving_subtree_changes_signatures() {
        let (mut tree, body, p, text) = doc();
        let before_p = Signature::of(&tree, p).clone();
        let before_text = Signature::of(&tree, text).clone();
        let section = tree.append(body, NodeData::new("section"));
        tree.remove_child(body, p);
        tree.add_child(section, p, None).unwrap();
        assert_ne!(Signature::of(&tree, p), &before_p);
        assert_ne!(Signature::of(&tree, text), &before_text);
        assert_eq!(Signature::of(&tree, text).as_str(), "/html/body/section/p/#text");
    }

    #[test]
    fn signature_usable_as_map_key() {
        let (tree, body, _, _) = doc();
        let mut map = HashMap::new();
        map.insert(Signature::of(&tree, body).clone(), body);
        assert_eq!(map.get(&Signature::compute(&tree, body)), Some(&body));
    }

    #[test]
    fn weight_laws() {
        let (tree, body, p, text) = doc();
        let text_w = Weight::of(&tree, text).value();
        assert!((text_w - (1.0 + 6f64.ln())).abs() < 1e-12);
        assert_eq!(Weight::of(&tree, p).value(), 1.0 + text_w);
        assert!((Weight::of(&tree, body).value() - (2.0 + text_w)).abs() < 1e-12);
    }

    #[test]
    fn empty_leaf_weighs_one() {
        let mut tree = Tree::new(NodeData::new("root"));
        let br = tree.append(tree.root(), NodeData::new("br"));
        assert_eq!(Weight::of(&tree, br).value(), 1.0);
        assert_eq!(Weight::of(&tree, tree.root()).value(), 2.0);
    }

    #[test]
    fn text_weight_is_sublinear() {
        let mut tree = Tree::new(NodeData::new("root"));
        let short = tree.append(tree.root(), NodeData::text("t", "x".repeat(10)));
        let long = tree.append(tree.root(), NodeData::text("t", "x".repeat(20)));
        let ws = Weight::of(&tree, short).value();
        let wl = Weight::of(&tree, long).value();
        assert!(wl > ws);
        assert!(wl < 2.0 * ws);
    }

    #[test]
    fn mutation_invalidates_weight_up_the_chain() {
        let (mut tree, body, p, text) = doc();
        let before = Weight::of(&tree, tree.root());
        tree.append(p, NodeData::new("br"));
        assert!((Weight::of(&tree, tree.root()).value() - (before.value() + 1.0)).abs() < 1e-12);
        tree.set_value(text, Some("a much longer greeting".into()));
        assert_eq!(Weight::of(&tree, body), Weight::compute(&tree, body));
    }

    #[test]
    fn leaf_gaining_child_loses_text_marker() {
        let mut tree = Tree::new(NodeData::new("root"));
        let p = tree.append(tree.root(), NodeData::text("p", "x"));
        assert_eq!(Signature::of(&tree, p).as_str(), "/root/#text");
        tree.append(p, NodeData::new("b"));
        assert_eq!(Signature::of(&tree, p).as_str(), "/root/p");
    }
}
