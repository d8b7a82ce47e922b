mod common;

use proptest::prelude::*;
use tree_diff::{diff, DetectOptions, DiffOptions, Operation, OperationDetector, Signature, UniversalMatcher, Weight};

use common::trees::arb_tree;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matchings_are_always_valid(t1 in arb_tree(24), t2 in arb_tree(24)) {
        let mut matcher = UniversalMatcher::default();
        let matching = matcher.match_trees(&t1, &t2);
        prop_assert!(matching.is_one_to_one());
        prop_assert!(matching.is_prefix_closed());
        prop_assert!(matcher.statistics().match_ratio_tree1 <= 1.0);
    }

    #[test]
    fn self_diff_is_empty(t in arb_tree(32)) {
        let copy = t.deep_clone(t.root());
        let outcome = diff(&t, &copy, &DiffOptions::default()).unwrap();
        prop_assert!(outcome.operations.is_empty());
        prop_assert_eq!(outcome.statistics.total_matches, t.size(t.root()));
    }

    #[test]
    fn diffing_is_deterministic(t1 in arb_tree(24), t2 in arb_tree(24)) {
        let a = diff(&t1, &t2, &DiffOptions::default()).unwrap();
        let b = diff(&t1, &t2, &DiffOptions::default()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn basic_pass_accounts_for_every_unmatched_node(t1 in arb_tree(24), t2 in arb_tree(24)) {
        let mut matcher = UniversalMatcher::default();
        let matching = matcher.match_trees(&t1, &t2);
        let mut options = DetectOptions::default();
        options.semantic_operations = false;
        let ops = OperationDetector::new(&matching).with_options(options).detect();

        let deletes = ops.iter().filter(|op| matches!(op, Operation::Delete { .. })).count();
        let inserts = ops.iter().filter(|op| matches!(op, Operation::Insert { .. })).count();
        prop_assert_eq!(deletes, t1.size(t1.root()) - matching.len());
        prop_assert_eq!(inserts, t2.size(t2.root()) - matching.len());
    }

    #[test]
    fn branch_weight_is_one_plus_children(t in arb_tree(32)) {
        for id in t.preorder(t.root()) {
            let children = t.children(id);
            if children.is_empty() {
                continue;
            }
            let sum: f64 = children.iter().map(|&c| Weight::of(&t, c).value()).sum();
            prop_assert!((Weight::of(&t, id).value() - (1.0 + sum)).abs() < 1e-9);
        }
    }

    #[test]
    fn signatures_follow_label_paths(t in arb_tree(32)) {
        let copy = t.deep_clone(t.root());
        // ids differ: the copy's arena is allocated in pre-order
        for (a, b) in t.preorder(t.root()).zip(copy.preorder(copy.root())) {
            prop_assert_eq!(Signature::of(&t, a), Signature::of(&copy, b));
        }
    }
}
