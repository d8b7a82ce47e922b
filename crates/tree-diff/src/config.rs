//! Matcher and detector configuration.
//!
//! All option structs deserialize with per-field defaults, so a partial
//! JSON document such as `{"similarity_threshold": 0.9}` is a complete
//! configuration.

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.95;
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.8;

/// How attribute order participates in similarity scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeOrder {
    Strict,
    #[default]
    Ignore,
}

/// Options of the [`UniversalMatcher`](crate::matcher::UniversalMatcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Minimum similarity for phase-2 pairing, in `(0, 1]`.
    pub similarity_threshold: f64,
    pub hash_matching: bool,
    pub similarity_matching: bool,
    pub propagation: bool,
    pub attribute_order: AttributeOrder,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            hash_matching: true,
            similarity_matching: true,
            propagation: true,
            attribute_order: AttributeOrder::Ignore,
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<(), DiffError> {
        validate_threshold("similarity_threshold", self.similarity_threshold)
    }
}

/// Options of the [`OperationDetector`](crate::operation::OperationDetector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    /// Run the merge/split/upgrade/downgrade recognition pass.
    pub semantic_operations: bool,
    /// Minimum text overlap (merge/split) or similarity (upgrade/downgrade).
    pub semantic_threshold: f64,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            semantic_operations: true,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
        }
    }
}

impl DetectOptions {
    pub fn validate(&self) -> Result<(), DiffError> {
        validate_threshold("semantic_threshold", self.semantic_threshold)
    }
}

fn validate_threshold(name: &'static str, value: f64) -> Result<(), DiffError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(DiffError::InvalidThreshold { name, value })
    }
}
