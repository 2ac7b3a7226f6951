//! Markdown to editor HTML.
//!
//! A block scanner splits the input into fenced code, headings, rules,
//! blockquotes, lists, raw HTML and paragraphs; each text block then goes
//! through the inline tokenizer. The result is run through the sanitizer
//! before it leaves this module.

mod block;
mod inline;

pub use block::MAX_BLOCK_DEPTH;

use tracing::trace;

use crate::sanitize::{sanitize, AllowListPolicy};

/// Render Markdown to HTML without the final sanitization pass
pub(crate) fn render_html(markdown: &str) -> String {
    let normalized = markdown.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().collect();
    trace!(lines = lines.len(), "parsing markdown blocks");

    let mut out = String::with_capacity(normalized.len() + normalized.len() / 2);
    block::parse_blocks(&lines, 0, false, &mut out);

    let len = out.trim_end_matches('\n').len();
    out.truncate(len);
    out
}

/// Render Markdown to sanitized HTML
pub(crate) fn markdown_to_html(markdown: &str, policy: &AllowListPolicy) -> String {
    let html = render_html(markdown);
    trace!(bytes = html.len(), "sanitizing rendered markdown");
    sanitize(&html, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_html(markdown: &str) -> String {
        markdown_to_html(markdown, &AllowListPolicy::default())
    }

    #[test]
    fn test_heading_and_emphasis() {
        let html = to_html("# Title\n**bold** and *italic*");
        assert_eq!(
            html,
            "<h1>Title</h1>\n<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn test_task_items() {
        let html = to_html("- [x] done\n- [ ] todo");
        assert!(html.contains(r#"data-checked="true""#));
        assert!(html.contains(r#"data-checked="false""#));
        assert!(html.starts_with(r#"<ul data-type="taskList">"#));
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(to_html("# A\r\n\r\ntext\rmore"), "<h1>A</h1>\n<p>text\nmore</p>");
    }

    #[test]
    fn test_raw_html_is_sanitized() {
        let html = to_html("<div onclick=\"x()\">\n<script>alert(1)</script>\n</div>\n\nok <b>b</b>");
        assert!(!html.contains("<script"));
        assert!(!html.contains("onclick"));
        assert!(!html.contains("alert"));
        assert!(html.ends_with("<p>ok b</p>"));
    }

    #[test]
    fn test_unsafe_link_stays_text() {
        let html = to_html("[x](javascript:alert(1))");
        assert!(!html.contains("<a"));
        assert!(!html.to_lowercase().contains("javascript:"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_html(""), "");
        assert_eq!(to_html("\n\n  \n"), "");
    }
}
