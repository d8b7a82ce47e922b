//! Normalized token overlap.
//!
//! The score is the Dice coefficient over whitespace-separated token
//! multisets: `2 * |common| / (|a| + |b|)`. Token order is ignored, so
//! "First Second" and "Second First" score 1.0.

use std::collections::HashMap;

use super::util::is_whitespace;

/// Split a string into whitespace-separated tokens.
///
/// # Examples
///
/// ```
/// use tree_diff_util::strings::tokens;
///
/// assert_eq!(tokens(" a  b\nc "), vec!["a", "b", "c"]);
/// ```
pub fn tokens(s: &str) -> Vec<&str> {
    s.split(is_whitespace).filter(|t| !t.is_empty()).collect()
}

/// Normalized overlap score in `[0, 1]` between two strings.
///
/// Two strings without any tokens score 1.0 when they are equal and 0.0
/// otherwise.
///
/// # Examples
///
/// ```
/// use tree_diff_util::strings::overlap;
///
/// assert_eq!(overlap("First Second Third", "First Second Third"), 1.0);
/// assert_eq!(overlap("a b", "c d"), 0.0);
/// assert!((overlap("a b c d", "a b c e") - 0.75).abs() < 1e-9);
/// ```
pub fn overlap(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() && tb.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::with_capacity(ta.len());
    for &t in &ta {
        *counts.entry(t).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for t in &tb {
        if let Some(n) = counts.get_mut(t) {
            if *n > 0 {
                *n -= 1;
                common += 1;
            }
        }
    }
    dice(common, ta.len(), tb.len())
}

/// Dice coefficient for `common` shared tokens out of `a` and `b` tokens.
///
/// Returns 0.0 when both sides are empty.
pub fn dice(common: usize, a: usize, b: usize) -> f64 {
    if a + b == 0 {
        return 0.0;
    }
    (2 * common) as f64 / (a + b) as f64
}

/// Owned token multiset of a string.
///
/// Lets a caller tokenize each text once and then score many
/// combinations incrementally with [`dice`].
///
/// # Examples
///
/// ```
/// use tree_diff_util::strings::TokenBag;
///
/// let bag = TokenBag::new("to be or not to be");
/// assert_eq!(bag.len(), 6);
/// assert_eq!(bag.count("to"), 2);
/// assert!(TokenBag::new("be be").is_subset_of(&bag));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBag {
    counts: HashMap<String, usize>,
    len: usize,
}

impl TokenBag {
    pub fn new(s: &str) -> Self {
        let mut bag = Self::default();
        for t in tokens(s) {
            *bag.counts.entry(t.to_owned()).or_insert(0) += 1;
            bag.len += 1;
        }
        bag
    }

    /// Number of tokens, counting repeats.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Occurrences of `token`.
    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Distinct tokens with their occurrence counts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts.iter().map(|(t, &n)| (t.as_str(), n))
    }

    /// Tokens shared with `other`, counted with multiplicity.
    pub fn common(&self, other: &TokenBag) -> usize {
        self.iter().map(|(t, n)| n.min(other.count(t))).sum()
    }

    /// Every token occurs in `other` at least as often as here.
    pub fn is_subset_of(&self, other: &TokenBag) -> bool {
        self.iter().all(|(t, n)| n <= other.count(t))
    }
}
