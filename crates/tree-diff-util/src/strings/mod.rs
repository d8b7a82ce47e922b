//! String utilities.
//!
//! Whitespace handling, tokenization and the normalized overlap score.

mod overlap;
mod util;

pub use overlap::{dice, overlap, tokens, TokenBag};
pub use util::{collapse_whitespace, is_blank, is_whitespace};
