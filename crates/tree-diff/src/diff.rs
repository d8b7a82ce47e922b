//! One-call pipeline: size guard → matching → operation detection.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::adapter::{self, AdapterOptions, Source};
use crate::config::{DetectOptions, MatchOptions};
use crate::error::DiffError;
use crate::guard::SizeGuard;
use crate::matcher::{MatchStatistics, UniversalMatcher};
use crate::operation::{Operation, OperationDetector};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub matching: MatchOptions,
    pub detection: DetectOptions,
    /// Combined node limit; `None` disables the guard.
    pub max_nodes: Option<usize>,
}

impl DiffOptions {
    pub fn validate(&self) -> Result<(), DiffError> {
        self.matching.validate()?;
        self.detection.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffOutcome {
    pub operations: Vec<Operation>,
    pub statistics: MatchStatistics,
    /// Matched `(tree1, tree2)` pairs in the order they were found.
    pub pairs: Vec<(NodeId, NodeId)>,
}

impl DiffOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Diff two trees.
pub fn diff(tree1: &Tree, tree2: &Tree, options: &DiffOptions) -> Result<DiffOutcome, DiffError> {
    options.validate()?;
    if let Some(limit) = options.max_nodes {
        SizeGuard::new(limit).check(tree1, tree2)?;
    }

    let mut matcher = UniversalMatcher::new(options.matching.clone());
    let matching = matcher.match_trees(tree1, tree2);
    let operations = OperationDetector::new(&matching)
        .with_options(options.detection.clone())
        .detect();
    debug!("diff produced {} operations", operations.len());

    Ok(DiffOutcome {
        operations,
        statistics: matcher.statistics().clone(),
        pairs: matching.pairs().collect(),
    })
}

/// Convert both sources with the adapters, then [`diff`] them. Returns the
/// trees so node ids in the outcome can be resolved.
pub fn diff_sources(
    source1: Source<'_>,
    source2: Source<'_>,
    adapter_options: &AdapterOptions,
    options: &DiffOptions,
) -> Result<(Tree, Tree, DiffOutcome), DiffError> {
    let tree1 = adapter::to_tree(source1, adapter_options)?;
    let tree2 = adapter::to_tree(source2, adapter_options)?;
    let outcome = diff(&tree1, &tree2, options)?;
    Ok((tree1, tree2, outcome))
}
