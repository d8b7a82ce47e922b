//! Fail-fast size check, run before matching.
//!
//! Similarity matching is O(n·m) in the worst case; callers bound the cost
//! by refusing oversized inputs up front.

use log::debug;

use crate::error::DiffError;
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGuard {
    /// Maximum combined node count of both trees.
    pub limit: usize,
}

impl SizeGuard {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Combined count of nodes reachable from each root.
    pub fn combined_size(tree1: &Tree, tree2: &Tree) -> usize {
        tree1.size(tree1.root()) + tree2.size(tree2.root())
    }

    pub fn check(&self, tree1: &Tree, tree2: &Tree) -> Result<(), DiffError> {
        let count = Self::combined_size(tree1, tree2);
        if count > self.limit {
            debug!("refusing to diff {} nodes (limit {})", count, self.limit);
            return Err(DiffError::SizeLimitExceeded { count, limit: self.limit });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;

    fn chain(n: usize) -> Tree {
        let mut t = Tree::new(NodeData::new("root"));
        let mut at = t.root();
        for _ in 1..n {
            at = t.append(at, NodeData::new("n"));
        }
        t
    }

    #[test]
    fn limit_is_inclusive() {
        let (a, b) = (chain(3), chain(2));
        assert!(SizeGuard::new(5).check(&a, &b).is_ok());
        assert_eq!(
            SizeGuard::new(4).check(&a, &b),
            Err(DiffError::SizeLimitExceeded { count: 5, limit: 4 })
        );
    }

    #[test]
    fn detached_nodes_do_not_count() {
        let mut a = chain(2);
        a.create(NodeData::new("loose"));
        assert_eq!(SizeGuard::combined_size(&a, &chain(1)), 3);
    }
}
