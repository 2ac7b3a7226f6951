//! Utility functions and constants for HTML and Markdown processing.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "details", "dir", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "isindex", "li", "main", "menu",
    "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("entity pattern is valid")
});

static SCRIPTABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript:|vbscript:|on\w+\s*=|eval\(|expression\(")
        .expect("scriptable pattern is valid")
});

/// Whether `s` starts with a character reference such as `&amp;` or `&#169;`
pub fn starts_with_entity(s: &str) -> bool {
    ENTITY.is_match(s)
}

/// Entity-encode the last character of every script-like sequence.
///
/// Browsers decode the reference back, so the rendered text is unchanged,
/// but the markup itself never spells `javascript:`, `onload=` and friends.
pub fn neutralize(escaped: &str) -> Cow<'_, str> {
    SCRIPTABLE.replace_all(escaped, |caps: &Captures| {
        let sequence = &caps[0];
        let (head, last) = sequence.split_at(sequence.len() - 1);
        format!("{}&#{};", head, last.as_bytes()[0])
    })
}

/// Escape text content for HTML output
pub fn escape_html_text(text: &str) -> String {
    neutralize(&htmlize::escape_text(text)).into_owned()
}

/// Escape an attribute value for double-quoted HTML output
pub fn escape_html_attr(value: &str) -> String {
    neutralize(&htmlize::escape_attribute(value)).into_owned()
}

/// Escape markdown special characters in a text node.
///
/// Inline markers are escaped everywhere; block markers only where the text
/// could begin a line.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 8);

    let content_start = text.len() - text.trim_start().len();
    let (lead, rest) = text.split_at(content_start);
    result.push_str(lead);

    // Byte offset in `rest` of an ordered-list dot ("1." at line start)
    let mut ordered_dot = None;
    match rest.as_bytes().first() {
        Some(b'#' | b'>' | b'-' | b'+' | b'=') => result.push('\\'),
        Some(b) if b.is_ascii_digit() => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let after = &rest[digits..];
            if after.starts_with('.') || after.starts_with(')') {
                ordered_dot = Some(digits);
            }
        }
        _ => {}
    }

    for (i, c) in rest.char_indices() {
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '~' | '<' => {
                result.push('\\');
                result.push(c);
            }
            '&' if starts_with_entity(&rest[i..]) => result.push_str("\\&"),
            _ if ordered_dot == Some(i) => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Remove backslash escapes in front of ASCII punctuation
pub fn unescape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    result.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        result.push(c);
    }

    result
}

/// Code fence language tags: `rust`, `c++`, `objective-c`, `c#`
pub fn is_language_tag(language: &str) -> bool {
    !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
}

/// Collapse whitespace in text
pub fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_whitespace = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result
}
