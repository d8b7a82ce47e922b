//! Sorting utilities.
//!
//! Stable insertion sort for the short lists produced while grouping
//! sibling nodes.

mod insertion;

pub use insertion::insertion_sort_by_key;
