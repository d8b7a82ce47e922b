//! Cross-tree node comparison: shallow equality, similarity scoring and
//! semantic distance.

use tree_diff_util::strings::overlap;

use super::{NodeId, Tree};
use crate::config::AttributeOrder;

const LABEL_WEIGHT: f64 = 0.3;
const VALUE_WEIGHT: f64 = 0.4;
const ATTRIBUTE_WEIGHT: f64 = 0.3;

/// Contribution of one level of depth difference to the semantic distance.
const DEPTH_FACTOR: f64 = 0.1;

/// Coarse classification of a node's payload, used to pair nodes whose
/// labels differ but whose values look alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeClass {
    Empty,
    Boolean,
    Numeric,
    Text,
}

impl ShapeClass {
    pub fn of_value(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            ShapeClass::Empty
        } else if trimmed == "true" || trimmed == "false" {
            ShapeClass::Boolean
        } else if trimmed.parse::<f64>().is_ok() {
            ShapeClass::Numeric
        } else {
            ShapeClass::Text
        }
    }
}

impl Tree {
    /// Payload class of a value-bearing leaf; `None` for structural nodes.
    pub fn shape_class(&self, id: NodeId) -> Option<ShapeClass> {
        if self.is_text(id) {
            self.value(id).map(ShapeClass::of_value)
        } else {
            None
        }
    }

    /// Shallow structural equality against a node of `other`: label, value,
    /// attributes, child count and child labels. Subtrees are not compared.
    pub fn matches(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let a = self.slot(id);
        let b = other.slot(other_id);
        a.data.label == b.data.label
            && a.data.value == b.data.value
            && a.data.attributes == b.data.attributes
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .zip(&b.children)
                .all(|(&x, &y)| self.label(x) == other.label(y))
    }

    /// Weighted blend of label, value and attribute agreement, in `[0, 1]`.
    pub fn similarity_to(
        &self,
        id: NodeId,
        other: &Tree,
        other_id: NodeId,
        attribute_order: AttributeOrder,
    ) -> f64 {
        let label = if self.label(id) == other.label(other_id) { 1.0 } else { 0.0 };
        let value = value_similarity(self.value(id), other.value(other_id));
        let attributes = self.attribute_similarity(id, other, other_id, attribute_order);
        LABEL_WEIGHT * label + VALUE_WEIGHT * value + ATTRIBUTE_WEIGHT * attributes
    }

    /// Tie-breaking distance: depth difference plus dissimilarity.
    pub fn semantic_distance_to(
        &self,
        id: NodeId,
        other: &Tree,
        other_id: NodeId,
        attribute_order: AttributeOrder,
    ) -> f64 {
        let depth_delta = self.depth(id).abs_diff(other.depth(other_id)) as f64;
        DEPTH_FACTOR * depth_delta + (1.0 - self.similarity_to(id, other, other_id, attribute_order))
    }

    fn attribute_similarity(
        &self,
        id: NodeId,
        other: &Tree,
        other_id: NodeId,
        attribute_order: AttributeOrder,
    ) -> f64 {
        let a = self.attributes(id);
        let b = other.attributes(other_id);
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        let shared = a.iter().filter(|(k, v)| b.get(*k) == Some(*v)).count();
        let union = a.len() + b.len() - shared;
        let mut score = shared as f64 / union as f64;
        if attribute_order == AttributeOrder::Strict && !same_shared_key_order(a, b) {
            score *= 0.5;
        }
        score
    }
}

fn value_similarity(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a, b) {
        (None, None) => 1.0,
        (Some(x), Some(y)) if x == y => 1.0,
        (Some(x), Some(y)) => overlap(x, y),
        _ => 0.0,
    }
}

/// Whether the keys present in both maps appear in the same relative order.
pub(crate) fn same_shared_key_order(a: &super::Attributes, b: &super::Attributes) -> bool {
    let left = a.keys().filter(|k| b.contains_key(*k));
    let right = b.keys().filter(|k| a.contains_key(*k));
    left.eq(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;

    fn single(data: NodeData) -> (Tree, NodeId) {
        let mut tree = Tree::new(NodeData::new("root"));
        let id = tree.append(tree.root(), data);
        (tree, id)
    }

    #[test]
    fn shape_classes() {
        assert_eq!(ShapeClass::of_value(" "), ShapeClass::Empty);
        assert_eq!(ShapeClass::of_value("true"), ShapeClass::Boolean);
        assert_eq!(ShapeClass::of_value("-1.5e3"), ShapeClass::Numeric);
        assert_eq!(ShapeClass::of_value("hello"), ShapeClass::Text);
    }

    #[test]
    fn shape_class_only_for_value_leaves() {
        let (tree, id) = single(NodeData::text("p", "42"));
        assert_eq!(tree.shape_class(id), Some(ShapeClass::Numeric));
        assert_eq!(tree.shape_class(tree.root()), None);
    }

    #[test]
    fn matches_is_shallow() {
        let mut t1 = Tree::new(NodeData::new("root"));
        let a = t1.append(t1.root(), NodeData::new("div"));
        t1.append(a, NodeData::text("p", "one"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let b = t2.append(t2.root(), NodeData::new("div"));
        t2.append(b, NodeData::text("p", "two"));
        assert!(t1.matches(a, &t2, b));
        assert!(t1.matches(t1.root(), &t2, t2.root()));
    }

    #[test]
    fn matches_checks_child_labels_in_order() {
        let mut t1 = Tree::new(NodeData::new("root"));
        t1.append(t1.root(), NodeData::new("a"));
        t1.append(t1.root(), NodeData::new("b"));
        let mut t2 = Tree::new(NodeData::new("root"));
        t2.append(t2.root(), NodeData::new("b"));
        t2.append(t2.root(), NodeData::new("a"));
        assert!(!t1.matches(t1.root(), &t2, t2.root()));
    }

    #[test]
    fn matches_checks_value_and_attributes() {
        let (t1, a) = single(NodeData::text("p", "x").with_attribute("k", "1"));
        let (t2, b) = single(NodeData::text("p", "x").with_attribute("k", "2"));
        let (t3, c) = single(NodeData::text("p", "y").with_attribute("k", "1"));
        assert!(!t1.matches(a, &t2, b));
        assert!(!t1.matches(a, &t3, c));
        assert!(t1.matches(a, &t1, a));
    }

    #[test]
    fn similarity_identical_is_one() {
        let (t1, a) = single(NodeData::text("p", "hello world").with_attribute("k", "v"));
        let t2 = t1.clone();
        assert_eq!(t1.similarity_to(a, &t2, a, AttributeOrder::Ignore), 1.0);
    }

    #[test]
    fn similarity_blends_components() {
        let (t1, a) = single(NodeData::text("p", "A"));
        let (t2, b) = single(NodeData::text("p", "B"));
        let s = t1.similarity_to(a, &t2, b, AttributeOrder::Ignore);
        assert!((s - 0.6).abs() < 1e-9);

        let (t3, c) = single(NodeData::text("q", "A"));
        let s = t1.similarity_to(a, &t3, c, AttributeOrder::Ignore);
        assert!((s - 0.7).abs() < 1e-9);
    }

    #[test]
    fn similarity_partial_attributes() {
        let (t1, a) = single(NodeData::new("a").with_attributes([("x", "1"), ("y", "2")]));
        let (t2, b) = single(NodeData::new("a").with_attributes([("x", "1"), ("y", "3")]));
        // shared 1 of union 3
        let s = t1.similarity_to(a, &t2, b, AttributeOrder::Ignore);
        assert!((s - (0.3 + 0.4 + 0.3 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn strict_attribute_order_penalizes_reordering() {
        let (t1, a) = single(NodeData::new("a").with_attributes([("x", "1"), ("y", "2")]));
        let (t2, b) = single(NodeData::new("a").with_attributes([("y", "2"), ("x", "1")]));
        assert_eq!(t1.similarity_to(a, &t2, b, AttributeOrder::Ignore), 1.0);
        let strict = t1.similarity_to(a, &t2, b, AttributeOrder::Strict);
        assert!((strict - 0.85).abs() < 1e-9);
    }

    #[test]
    fn semantic_distance_adds_depth() {
        let (t1, a) = single(NodeData::text("p", "x"));
        let mut t2 = Tree::new(NodeData::new("root"));
        let wrap = t2.append(t2.root(), NodeData::new("div"));
        let b = t2.append(wrap, NodeData::text("p", "x"));
        let d = t1.semantic_distance_to(a, &t2, b, AttributeOrder::Ignore);
        assert!((d - 0.1).abs() < 1e-9);
        assert_eq!(t1.semantic_distance_to(a, &t1, a, AttributeOrder::Ignore), 0.0);
    }
}
