//! Three-phase node matching.
//!
//! Each phase only ever adds pairs through [`Matching::add`], so the
//! invariants hold after every phase regardless of which phases run:
//!
//! 1. [`HashMatcher`] pairs nodes with identical signature and shallow
//!    content.
//! 2. [`SimilarityMatcher`] pairs remaining nodes whose similarity reaches
//!    the configured threshold.
//! 3. [`StructuralPropagator`] pairs lone unmatched children under already
//!    matched parents.

pub mod hash;
pub mod propagation;
pub mod similarity;

use log::debug;
use serde::Serialize;

use crate::config::MatchOptions;
use crate::matching::Matching;
use crate::tree::Tree;

pub use hash::HashMatcher;
pub use propagation::StructuralPropagator;
pub use similarity::SimilarityMatcher;

/// One step of the matching pipeline.
pub trait MatchPhase {
    fn name(&self) -> &'static str;

    /// Extend `matching` in place; returns the number of pairs added.
    fn apply(&self, matching: &mut Matching<'_>) -> usize;
}

/// Counters of the last [`UniversalMatcher::match_trees`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchStatistics {
    pub total_matches: usize,
    pub hash_matches: usize,
    pub similarity_matches: usize,
    pub propagated_matches: usize,
    pub tree1_nodes: usize,
    pub tree2_nodes: usize,
    pub match_ratio_tree1: f64,
    pub match_ratio_tree2: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UniversalMatcher {
    options: MatchOptions,
    statistics: MatchStatistics,
}

impl UniversalMatcher {
    pub fn new(options: MatchOptions) -> Self {
        Self { options, statistics: MatchStatistics::default() }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn statistics(&self) -> &MatchStatistics {
        &self.statistics
    }

    /// Run the enabled phases in order and return the resulting matching.
    /// Statistics are reset at the start of every run.
    pub fn match_trees<'t>(&mut self, tree1: &'t Tree, tree2: &'t Tree) -> Matching<'t> {
        let mut matching = Matching::new(tree1, tree2);
        let mut stats = MatchStatistics {
            tree1_nodes: tree1.size(tree1.root()),
            tree2_nodes: tree2.size(tree2.root()),
            ..MatchStatistics::default()
        };

        if self.options.hash_matching {
            stats.hash_matches = run_phase(&HashMatcher, &mut matching);
        }
        if self.options.similarity_matching {
            let phase = SimilarityMatcher::new(
                self.options.similarity_threshold,
                self.options.attribute_order,
            );
            stats.similarity_matches = run_phase(&phase, &mut matching);
        }
        if self.options.propagation {
            stats.propagated_matches = run_phase(&StructuralPropagator, &mut matching);
        }

        stats.total_matches = matching.len();
        stats.match_ratio_tree1 = ratio(stats.total_matches, stats.tree1_nodes);
        stats.match_ratio_tree2 = ratio(stats.total_matches, stats.tree2_nodes);
        debug!(
            "matched {} pairs ({:.1}% of tree1, {:.1}% of tree2)",
            stats.total_matches,
            stats.match_ratio_tree1 * 100.0,
            stats.match_ratio_tree2 * 100.0
        );
        self.statistics = stats;
        matching
    }
}

fn run_phase(phase: &dyn MatchPhase, matching: &mut Matching<'_>) -> usize {
    let added = phase.apply(matching);
    debug!("{} phase added {} pairs", phase.name(), added);
    added
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
