//! tree-diff - semantic diffing of neutral document trees
//!
//! Documents (markup, JSON object trees) are brought into a neutral
//! [`Tree`] form, matched node-to-node in three phases, and the matching is
//! turned into edit operations, including higher-level merges, splits,
//! upgrades and downgrades.
//!
//! ```
//! use tree_diff::{diff, DiffOptions, NodeData, Operation, Tree};
//!
//! let mut old = Tree::new(NodeData::new("root"));
//! old.append(old.root(), NodeData::text("child", "A"));
//! let mut new = Tree::new(NodeData::new("root"));
//! new.append(new.root(), NodeData::text("child", "A"));
//! let added = new.append(new.root(), NodeData::text("extra", "B"));
//!
//! let outcome = diff(&old, &new, &DiffOptions::default()).unwrap();
//! assert_eq!(outcome.operations, vec![Operation::Insert { node: added }]);
//! ```

pub mod adapter;
pub mod config;
pub mod diff;
pub mod error;
pub mod guard;
pub mod hash;
pub mod matcher;
pub mod matching;
pub mod operation;
pub mod signature;
pub mod tree;

// Re-exports for convenience
pub use adapter::{AdapterError, AdapterOptions, Source, SourceRef};
pub use config::{AttributeOrder, DetectOptions, MatchOptions};
pub use diff::{diff, diff_sources, DiffOptions, DiffOutcome};
pub use error::DiffError;
pub use guard::SizeGuard;
pub use matcher::{MatchPhase, MatchStatistics, UniversalMatcher};
pub use matching::Matching;
pub use operation::{FieldChange, Location, Operation, OperationDetector};
pub use signature::{Signature, Weight};
pub use tree::{Attributes, NodeData, NodeId, ShapeClass, Tree, TreeError};
