#![allow(dead_code)]

pub mod trees;

use tree_diff::{Matching, Operation};

pub fn kinds(ops: &[Operation]) -> Vec<&'static str> {
    ops.iter().map(Operation::kind).collect()
}

pub fn assert_valid(matching: &Matching<'_>) {
    assert!(matching.is_one_to_one(), "matching is not one-to-one: {matching:?}");
    assert!(matching.is_prefix_closed(), "matching is not prefix-closed: {matching:?}");
}
