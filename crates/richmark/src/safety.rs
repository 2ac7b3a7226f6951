//! Quick heuristic check for script injection.
//!
//! This is advisory: it flags text worth rejecting up front, but content
//! still has to go through [`crate::sanitize`] before it is stored or shown.

use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<script|javascript:|\bon\w+\s*=|<iframe|eval\(|expression\(")
        .expect("unsafe pattern is valid")
});

/// Returns `false` when `text` contains a script tag, a `javascript:` URL, an
/// inline event handler, an iframe, `eval(` or `expression(`.
///
/// Matching is case-insensitive. Empty text is safe. A handler name must
/// start a word, so `button=1` passes while `onclick=` fails.
///
/// ```rust
/// use richmark::is_safe;
///
/// assert!(is_safe("# Heading\n**bold**"));
/// assert!(!is_safe("<SCRIPT>alert(1)</SCRIPT>"));
/// assert!(is_safe(None));
/// ```
pub fn check(text: &str) -> bool {
    !UNSAFE_PATTERN.is_match(text)
}
