//! Crate-level error type.
//!
//! Rejected matching additions are not errors (`Matching::add` returns
//! `false`); this type covers configuration, size and adapter failures.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::tree::TreeError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiffError {
    #[error("combined tree size {count} exceeds the configured limit of {limit} nodes")]
    SizeLimitExceeded { count: usize, limit: usize },
    #[error("{name} must be in (0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
