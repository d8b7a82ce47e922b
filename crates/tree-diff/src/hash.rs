//! Shallow content hash of tree nodes.
//!
//! djb2-style mixing with 32-bit wrapping arithmetic and per-kind
//! discriminators. The hash covers exactly what [`Tree::matches`] compares
//! (label, value, attributes, ordered child labels), so equal shallow nodes
//! always hash equal and the phase-1 index can bucket on it.
//!
//! [`subtree_hashes`] folds the shallow hashes of whole subtrees, letting
//! phase 1 prefer candidates that are identical all the way down.

use crate::tree::{NodeId, Tree};

// ── Discriminators ────────────────────────────────────────────────────────

pub const START_STATE: i32 = 5381;

pub const LABEL_CONST: i32 = 982451653_u32 as i32;
pub const VALUE_CONST: i32 = 982453601_u32 as i32;
pub const NO_VALUE_CONST: i32 = 982452847_u32 as i32;
pub const ATTRIBUTES_CONST: i32 = 982454533_u32 as i32;
pub const CHILDREN_CONST: i32 = 982452259_u32 as i32;
pub const SUBTREE_CONST: i32 = 982451929_u32 as i32;

// ── Mixing ────────────────────────────────────────────────────────────────

/// Mix a single integer into the hash state.
///
/// `state = (state << 5) + state + num` with 32-bit wrapping semantics.
pub fn update_num(state: i32, num: i32) -> i32 {
    state.wrapping_shl(5).wrapping_add(state).wrapping_add(num)
}

/// Mix a string into the hash state: length first, then every byte.
pub fn update_str(mut state: i32, s: &str) -> i32 {
    state = update_num(state, s.len() as i32);
    for &b in s.as_bytes() {
        state = update_num(state, b as i32);
    }
    state
}

/// Shallow hash of a node. Attribute keys are mixed in sorted order because
/// attribute equality ignores order.
pub fn shallow_hash(tree: &Tree, id: NodeId) -> u32 {
    let mut state = update_num(START_STATE, LABEL_CONST);
    state = update_str(state, tree.label(id));

    state = match tree.value(id) {
        Some(value) => update_str(update_num(state, VALUE_CONST), value),
        None => update_num(state, NO_VALUE_CONST),
    };

    let attributes = tree.attributes(id);
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();
    state = update_num(state, ATTRIBUTES_CONST);
    for key in keys {
        state = update_str(state, key);
        state = update_str(state, &attributes[key]);
    }

    state = update_num(state, CHILDREN_CONST);
    for &child in tree.children(id) {
        state = update_str(state, tree.label(child));
    }
    state as u32
}

/// Deep hash of every attached node, indexed by arena slot. Detached slots
/// hold 0.
pub fn subtree_hashes(tree: &Tree) -> Vec<u32> {
    let mut hashes = vec![0u32; tree.arena_len()];
    let order: Vec<NodeId> = tree.preorder(tree.root()).collect();
    for &id in order.iter().rev() {
        let mut state = update_num(START_STATE, SUBTREE_CONST);
        state = update_num(state, shallow_hash(tree, id) as i32);
        for &child in tree.children(id) {
            state = update_num(state, hashes[child.index()] as i32);
        }
        hashes[id.index()] = state as u32;
    }
    hashes
}
