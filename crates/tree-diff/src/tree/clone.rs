use super::{NodeId, Tree};

impl Tree {
    /// Independent structural copy of the subtree rooted at `id`.
    ///
    /// The copy's root has no parent and the new arena holds only the
    /// subtree, in pre-order. Cached derived values are not carried over.
    pub fn deep_clone(&self, id: NodeId) -> Tree {
        let mut copy = Tree::new(self.node(id).clone());
        // (source node, parent in the copy); popped in pre-order
        let mut stack: Vec<(NodeId, NodeId)> =
            self.children(id).iter().rev().map(|&c| (c, copy.root())).collect();
        while let Some((src, parent)) = stack.pop() {
            let dst = copy.append(parent, self.node(src).clone());
            stack.extend(self.children(src).iter().rev().map(|&c| (c, dst)));
        }
        copy
    }
}
