/// Check if a character is whitespace.
///
/// # Examples
///
/// ```
/// use tree_diff_util::strings::is_whitespace;
///
/// assert!(is_whitespace(' '));
/// assert!(is_whitespace('\t'));
/// assert!(is_whitespace('\n'));
/// assert!(!is_whitespace('a'));
/// ```
pub fn is_whitespace(ch: char) -> bool {
    ch.is_whitespace()
}

/// Returns `true` when the string is empty or only whitespace.
pub fn is_blank(s: &str) -> bool {
    s.chars().all(is_whitespace)
}

/// Trim the string and collapse every whitespace run into a single space.
///
/// # Examples
///
/// ```
/// use tree_diff_util::strings::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
/// assert_eq!(collapse_whitespace(""), "");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars() {
        if is_whitespace(ch) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}
