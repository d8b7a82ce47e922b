//! Basic pass: updates, moves, deletes and inserts.

use std::collections::HashMap;

use crate::matching::Matching;
use crate::tree::{same_shared_key_order, NodeId, Tree};

use super::{FieldChange, Location, Operation};

pub(super) fn basic_operations(matching: &Matching<'_>) -> Vec<Operation> {
    let tree1 = matching.tree1();
    let tree2 = matching.tree2();
    let ranks = SiblingRanks::new(matching);
    let mut ops = Vec::new();

    for a in tree1.preorder(tree1.root()) {
        let Some(b) = matching.partner1(a) else {
            ops.push(Operation::Delete { node: a });
            continue;
        };
        let changes = field_changes(tree1, a, tree2, b);
        if !changes.is_empty() {
            ops.push(Operation::Update { node1: a, node2: b, changes });
        }
        if is_moved(matching, &ranks, a, b) {
            ops.push(Operation::Move {
                node1: a,
                node2: b,
                from: location(tree1, a),
                to: location(tree2, b),
            });
        }
    }

    for b in tree2.preorder(tree2.root()) {
        if !matching.is_matched2(b) {
            ops.push(Operation::Insert { node: b });
        }
    }
    ops
}

fn location(tree: &Tree, id: NodeId) -> Location {
    Location { parent: tree.parent(id), position: tree.position(id) }
}

/// Changed fields in reporting order: value (or content), attributes,
/// attribute order, label.
pub(super) fn field_changes(tree1: &Tree, a: NodeId, tree2: &Tree, b: NodeId) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if tree1.is_text(a) != tree2.is_text(b) {
        changes.push(FieldChange::Content {
            old: tree1.text_content(a),
            new: tree2.text_content(b),
        });
    } else if tree1.value(a) != tree2.value(b) {
        changes.push(FieldChange::Value {
            old: tree1.value(a).map(str::to_owned),
            new: tree2.value(b).map(str::to_owned),
        });
    }

    let attrs1 = tree1.attributes(a);
    let attrs2 = tree2.attributes(b);
    if attrs1 != attrs2 {
        changes.push(FieldChange::Attributes { old: attrs1.clone(), new: attrs2.clone() });
    }
    if !same_shared_key_order(attrs1, attrs2) {
        changes.push(FieldChange::AttributeOrder {
            old: attrs1.keys().filter(|k| attrs2.contains_key(*k)).cloned().collect(),
            new: attrs2.keys().filter(|k| attrs1.contains_key(*k)).cloned().collect(),
        });
    }

    if tree1.label(a) != tree2.label(b) {
        changes.push(FieldChange::Label {
            old: tree1.label(a).to_owned(),
            new: tree2.label(b).to_owned(),
        });
    }
    changes
}

/// A pair moved if it changed parent, or if its order relative to the
/// siblings that stayed with it changed.
fn is_moved(matching: &Matching<'_>, ranks: &SiblingRanks, a: NodeId, b: NodeId) -> bool {
    match (matching.tree1().parent(a), matching.tree2().parent(b)) {
        (None, None) => false,
        (Some(pa), Some(pb)) if matching.contains(pa, pb) => ranks.left.get(&a) != ranks.right.get(&b),
        _ => true,
    }
}

/// Rank of each matched child among the children of its parent whose
/// partners sit under the parent's partner.
struct SiblingRanks {
    left: HashMap<NodeId, usize>,
    right: HashMap<NodeId, usize>,
}

impl SiblingRanks {
    fn new(matching: &Matching<'_>) -> Self {
        let tree1 = matching.tree1();
        let tree2 = matching.tree2();
        let mut left = HashMap::new();
        let mut right = HashMap::new();

        for (pa, pb) in matching.pairs() {
            let kept1 = tree1.children(pa).iter().filter(|&&c| {
                matching.partner1(c).is_some_and(|p| tree2.parent(p) == Some(pb))
            });
            for (rank, &c) in kept1.enumerate() {
                left.insert(c, rank);
            }
            let kept2 = tree2.children(pb).iter().filter(|&&c| {
                matching.partner2(c).is_some_and(|p| tree1.parent(p) == Some(pa))
            });
            for (rank, &c) in kept2.enumerate() {
                right.insert(c, rank);
            }
        }
        Self { left, right }
    }
}
