#![allow(dead_code)]

use proptest::prelude::*;
use tree_diff::{NodeData, NodeId, Tree};

/// `root[label="value", ...]`
pub fn flat(root: &str, children: &[(&str, &str)]) -> Tree {
    let mut tree = Tree::new(NodeData::new(root));
    for (label, value) in children {
        tree.append(tree.root(), NodeData::text(*label, *value));
    }
    tree
}

pub fn child(tree: &Tree, index: usize) -> NodeId {
    tree.children(tree.root())[index]
}

const LABELS: &[&str] = &["div", "p", "span", "li"];
const VALUES: &[&str] = &["", "alpha", "beta", "alpha beta", "gamma delta", "10", "true"];

/// One generated node: which earlier node is its parent, its label, and
/// its value if any.
type NodeSpec = (usize, usize, Option<usize>);

fn build(specs: Vec<NodeSpec>) -> Tree {
    let mut tree = Tree::new(NodeData::new("root"));
    let mut ids = vec![tree.root()];
    for (parent, label, value) in specs {
        let mut data = NodeData::new(LABELS[label]);
        if let Some(v) = value {
            data = data.with_value(VALUES[v]);
        }
        let id = tree.append(ids[parent % ids.len()], data);
        ids.push(id);
    }
    tree
}

/// Random trees of up to `max_nodes + 1` nodes over a small vocabulary, so
/// that independent trees share labels and values.
pub fn arb_tree(max_nodes: usize) -> impl Strategy<Value = Tree> {
    prop::collection::vec(
        (any::<usize>(), 0..LABELS.len(), prop::option::of(0..VALUES.len())),
        0..max_nodes,
    )
    .prop_map(build)
}
