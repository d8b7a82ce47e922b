//! tree-diff-util - helper functions for tree-diff
//!
//! Text normalization and overlap scoring used by the similarity and
//! semantic-operation passes, plus a small-slice stable sort.

pub mod sort;
pub mod strings;

// Re-exports for convenience
pub use sort::insertion_sort_by_key;
pub use strings::{collapse_whitespace, dice, is_blank, is_whitespace, overlap, tokens, TokenBag};
