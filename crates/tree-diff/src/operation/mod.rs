//! Edit operations derived from a [`Matching`].
//!
//! Detection runs in two passes. The basic pass ([`detector`]) turns every
//! matched, unmatched and repositioned node into insert/delete/update/move
//! records. The semantic pass ([`semantic`]) then recognizes merge, split,
//! upgrade and downgrade patterns and removes the basic records they
//! explain.
//!
//! Node ids in `node1`/`sources`/`source` fields refer to tree1, those in
//! `node2`/`result`/`results` fields and in `Insert` refer to tree2.

mod detector;
mod semantic;

use log::debug;
use serde::Serialize;

use crate::config::DetectOptions;
use crate::matching::Matching;
use crate::tree::{Attributes, NodeId};

/// Where a node sits in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub parent: Option<NodeId>,
    pub position: Option<usize>,
}

/// One changed field of a matched pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldChange {
    Value { old: Option<String>, new: Option<String> },
    Attributes { old: Attributes, new: Attributes },
    /// Keys present on both sides, in their respective order.
    AttributeOrder { old: Vec<String>, new: Vec<String> },
    Label { old: String, new: String },
    /// A value-bearing leaf became a structural node or vice versa. Carries
    /// the text of each side.
    Content { old: String, new: String },
}

impl FieldChange {
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Value { .. } => "value",
            FieldChange::Attributes { .. } => "attributes",
            FieldChange::AttributeOrder { .. } => "attribute_order",
            FieldChange::Label { .. } => "label",
            FieldChange::Content { .. } => "content",
        }
    }

    /// Whether the change concerns the node's text.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldChange::Value { .. } | FieldChange::Content { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Insert {
        node: NodeId,
    },
    Delete {
        node: NodeId,
    },
    Update {
        node1: NodeId,
        node2: NodeId,
        changes: Vec<FieldChange>,
    },
    Move {
        node1: NodeId,
        node2: NodeId,
        from: Location,
        to: Location,
    },
    Merge {
        sources: Vec<NodeId>,
        result: NodeId,
    },
    Split {
        source: NodeId,
        results: Vec<NodeId>,
    },
    /// A matched node moved closer to the root.
    Upgrade {
        node1: NodeId,
        node2: NodeId,
        from_depth: usize,
        to_depth: usize,
    },
    /// A matched node moved away from the root.
    Downgrade {
        node1: NodeId,
        node2: NodeId,
        from_depth: usize,
        to_depth: usize,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Delete { .. } => "delete",
            Operation::Update { .. } => "update",
            Operation::Move { .. } => "move",
            Operation::Merge { .. } => "merge",
            Operation::Split { .. } => "split",
            Operation::Upgrade { .. } => "upgrade",
            Operation::Downgrade { .. } => "downgrade",
        }
    }

    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            Operation::Merge { .. }
                | Operation::Split { .. }
                | Operation::Upgrade { .. }
                | Operation::Downgrade { .. }
        )
    }
}

/// Derives the operation list for a finished matching.
pub struct OperationDetector<'m, 't> {
    matching: &'m Matching<'t>,
    options: DetectOptions,
}

impl<'m, 't> OperationDetector<'m, 't> {
    pub fn new(matching: &'m Matching<'t>) -> Self {
        Self { matching, options: DetectOptions::default() }
    }

    pub fn with_options(mut self, options: DetectOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the basic pass and, unless disabled, the semantic pass.
    ///
    /// The output is deterministic: basic operations follow tree1 pre-order
    /// (then tree2 pre-order for inserts); semantic operations take the
    /// place of the first basic operation they replace.
    pub fn detect(&self) -> Vec<Operation> {
        let basic = detector::basic_operations(self.matching);
        debug!("basic pass produced {} operations", basic.len());
        if !self.options.semantic_operations {
            return basic;
        }
        let ops = semantic::recognize(self.matching, basic, self.options.semantic_threshold);
        debug!(
            "semantic pass left {} operations ({} semantic)",
            ops.len(),
            ops.iter().filter(|op| op.is_semantic()).count()
        );
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_serialize_tagged() {
        let op = Operation::Update {
            node1: NodeId(1),
            node2: NodeId(2),
            changes: vec![FieldChange::Value { old: Some("A".into()), new: Some("B".into()) }],
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "update",
                "node1": 1,
                "node2": 2,
                "changes": [{"field": "value", "old": "A", "new": "B"}]
            })
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(Operation::Insert { node: NodeId(0) }.kind(), "insert");
        let merge = Operation::Merge { sources: vec![], result: NodeId(0) };
        assert_eq!(merge.kind(), "merge");
        assert!(merge.is_semantic());
        assert!(!Operation::Delete { node: NodeId(0) }.is_semantic());
        let change = FieldChange::AttributeOrder { old: vec![], new: vec![] };
        assert_eq!(change.field(), "attribute_order");
        assert!(!change.is_textual());
    }
}
