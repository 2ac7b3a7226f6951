//! URL policy for `href` and `src` values.
//!
//! Only `http://`, `https://`, root-relative `/path` and (for links) `#fragment`
//! references are accepted. Everything else is refused: the Markdown parser
//! leaves the source text unconverted and the sanitizer drops the attribute.

use url::Url;

/// Longest URL accepted, in bytes
pub const MAX_URL_LEN: usize = 2048;

/// Check a link target (`a[href]`, `[text](url)`)
pub fn is_safe_link(url: &str) -> bool {
    if url.starts_with('#') {
        return url.len() <= MAX_URL_LEN && is_clean(url);
    }
    is_safe_image_src(url)
}

/// Check an image source (`img[src]`, `![alt](url)`)
pub fn is_safe_image_src(url: &str) -> bool {
    if url.is_empty() || url.len() > MAX_URL_LEN || !is_clean(url) {
        return false;
    }

    if url.starts_with('/') {
        // "//host/path" is protocol-relative, not root-relative
        return !url.starts_with("//");
    }

    if !(starts_with_ignore_case(url, "http://") || starts_with_ignore_case(url, "https://")) {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

/// Reject characters that let a value escape its attribute or change meaning
/// between parsers (browsers read `\` as `/`).
fn is_clean(url: &str) -> bool {
    !url.chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"' | '\\'))
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(is_safe_link("https://example.com"));
        assert!(is_safe_link("http://example.com/a?b=c#d"));
        assert!(is_safe_link("HTTPS://EXAMPLE.COM/"));
        assert!(is_safe_image_src("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_accepts_root_relative() {
        assert!(is_safe_link("/articles/42"));
        assert!(is_safe_image_src("/uploads/a.png"));
        assert!(is_safe_link("/"));
    }

    #[test]
    fn test_fragment_only_for_links() {
        assert!(is_safe_link("#section"));
        assert!(is_safe_link("#"));
        assert!(!is_safe_image_src("#section"));
    }

    #[test]
    fn test_rejects_script_schemes() {
        assert!(!is_safe_link("javascript:alert(1)"));
        assert!(!is_safe_link("JavaScript:alert(1)"));
        assert!(!is_safe_link("vbscript:msgbox"));
        assert!(!is_safe_image_src("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_rejects_other_forms() {
        assert!(!is_safe_link(""));
        assert!(!is_safe_link("//evil.example"));
        assert!(!is_safe_link("relative/path"));
        assert!(!is_safe_link("mailto:a@example.com"));
        assert!(!is_safe_link("https://"));
        assert!(!is_safe_link(" https://example.com"));
        assert!(!is_safe_link("/\\evil.example"));
        assert!(!is_safe_link("https://example.com/\"onmouseover"));
        assert!(!is_safe_link(&format!("/{}", "a".repeat(MAX_URL_LEN))));
    }
}
