//! Block structure: a line scanner that recognizes one block at a time.
//!
//! Recognition order per line is fence, heading, thematic break,
//! blockquote, list, HTML block, paragraph. Fenced code is taken first so no
//! later rule ever sees the lines inside it.

use super::inline::parse_inline;
use crate::utilities::{escape_html_text, is_block, is_language_tag};

/// Nesting limit for blockquotes and lists; deeper markers stay literal text.
pub const MAX_BLOCK_DEPTH: usize = 32;

/// Render `lines` as HTML blocks, each followed by a newline.
///
/// In `tight` mode (list items without blank lines) paragraphs are written
/// without their `<p>` wrapper.
pub(crate) fn parse_blocks(lines: &[&str], depth: usize, tight: bool, out: &mut String) {
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        i = if is_blank(line) {
            i + 1
        } else if let Some(fence) = Fence::open(line) {
            fenced_code(lines, i, &fence, out)
        } else if let Some((level, content)) = atx_heading(line) {
            out.push_str(&format!("<h{level}>{}</h{level}>\n", parse_inline(content)));
            i + 1
        } else if is_thematic_break(line) {
            out.push_str("<hr>\n");
            i + 1
        } else if depth < MAX_BLOCK_DEPTH && quote_content(line).is_some() {
            blockquote(lines, i, depth, out)
        } else if depth < MAX_BLOCK_DEPTH && list_marker(line).is_some() {
            list(lines, i, depth, out)
        } else if html_block_start(line) {
            html_block(lines, i, out)
        } else {
            paragraph(lines, i, depth, tight, out)
        };
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Leading whitespace in columns (a tab counts as four)
fn indent_width(line: &str) -> usize {
    line.bytes()
        .map_while(|b| match b {
            b' ' => Some(1),
            b'\t' => Some(4),
            _ => None,
        })
        .sum()
}

/// Remove up to `columns` of leading whitespace
fn strip_indent(line: &str, columns: usize) -> &str {
    let mut width = 0;
    for (i, b) in line.bytes().enumerate() {
        if width >= columns {
            return &line[i..];
        }
        match b {
            b' ' => width += 1,
            b'\t' => width += 4,
            _ => return &line[i..],
        }
    }
    ""
}

struct Fence<'a> {
    ch: u8,
    len: usize,
    indent: usize,
    language: Option<&'a str>,
}

impl<'a> Fence<'a> {
    fn open(line: &'a str) -> Option<Self> {
        let trimmed = line.trim_start();
        let ch = *trimmed.as_bytes().first()?;
        if ch != b'`' && ch != b'~' {
            return None;
        }
        let len = trimmed.bytes().take_while(|&b| b == ch).count();
        if len < 3 {
            return None;
        }

        let info = trimmed[len..].trim();
        if ch == b'`' && info.contains('`') {
            return None;
        }

        Some(Fence {
            ch,
            len,
            indent: indent_width(line),
            language: info.split_whitespace().next().filter(|tag| is_language_tag(tag)),
        })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let len = trimmed.bytes().take_while(|&b| b == self.ch).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}

/// An unterminated fence runs to the end of input
fn fenced_code(lines: &[&str], start: usize, fence: &Fence<'_>, out: &mut String) -> usize {
    let body_start = start + 1;
    let end = lines[body_start..]
        .iter()
        .position(|line| fence.is_closed_by(line))
        .map_or(lines.len(), |offset| body_start + offset);

    let mut code = String::new();
    for line in &lines[body_start..end] {
        code.push_str(strip_indent(line, fence.indent));
        code.push('\n');
    }

    out.push_str("<pre><code");
    if let Some(language) = fence.language {
        out.push_str(" class=\"language-");
        out.push_str(language);
        out.push('"');
    }
    out.push('>');
    out.push_str(&escape_html_text(&code));
    out.push_str("</code></pre>\n");

    (end + 1).min(lines.len())
}

/// Heading level and content of an ATX heading line
fn atx_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }

    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }

    // Optional closing sequence: `## Title ##`
    let content = rest.trim();
    let without_closing = content.trim_end_matches('#');
    let content = if without_closing.is_empty() {
        ""
    } else if without_closing.ends_with([' ', '\t']) {
        without_closing.trim_end()
    } else {
        content
    };
    Some((level, content))
}

fn is_thematic_break(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(ch) = trimmed.chars().next().filter(|c| matches!(c, '-' | '*' | '_')) else {
        return false;
    };

    let mut count = 0;
    for c in trimmed.chars() {
        if c == ch {
            count += 1;
        } else if c != ' ' && c != '\t' {
            return false;
        }
    }
    count >= 3
}

fn quote_content(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('>')?;
    Some(rest.strip_prefix([' ', '\t']).unwrap_or(rest))
}

fn blockquote(lines: &[&str], start: usize, depth: usize, out: &mut String) -> usize {
    let inner: Vec<&str> = lines[start..].iter().map_while(|line| quote_content(line)).collect();

    out.push_str("<blockquote>\n");
    parse_blocks(&inner, depth + 1, false, out);
    out.push_str("</blockquote>\n");

    start + inner.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Task(bool),
    Ordered,
}

impl ListKind {
    fn same_list(self, other: ListKind) -> bool {
        matches!(
            (self, other),
            (ListKind::Bullet, ListKind::Bullet)
                | (ListKind::Task(_), ListKind::Task(_))
                | (ListKind::Ordered, ListKind::Ordered)
        )
    }
}

#[derive(Debug)]
struct ListMarker<'a> {
    indent: usize,
    kind: ListKind,
    number: u32,
    /// Column where the item's content starts; continuation lines indent to it
    content_offset: usize,
    text: &'a str,
}

fn list_marker(line: &str) -> Option<ListMarker<'_>> {
    if is_thematic_break(line) {
        return None;
    }

    let indent = indent_width(line);
    let trimmed = line.trim_start();
    let bytes = trimmed.as_bytes();

    let (kind, marker_len, number) = match *bytes.first()? {
        b'-' | b'*' | b'+' => (ListKind::Bullet, 1, 0),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 || !matches!(bytes.get(digits), Some(b'.' | b')')) {
                return None;
            }
            (ListKind::Ordered, digits + 1, trimmed[..digits].parse().ok()?)
        }
        _ => return None,
    };

    let after = &trimmed[marker_len..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let padding_len = after.len() - after.trim_start_matches([' ', '\t']).len();
    let padding = indent_width(after);
    let (padding, mut text) = if after.trim().is_empty() {
        (1, "")
    } else if padding > 4 {
        (1, &after[1..])
    } else {
        (padding, &after[padding_len..])
    };

    let mut kind = kind;
    if kind == ListKind::Bullet {
        let checked = match text.get(..3) {
            Some("[ ]") => Some(false),
            Some("[x]" | "[X]") => Some(true),
            _ => None,
        };
        let rest = text.get(3..).unwrap_or("");
        if let Some(checked) = checked.filter(|_| rest.is_empty() || rest.starts_with([' ', '\t'])) {
            kind = ListKind::Task(checked);
            text = rest.trim_start();
        }
    }

    Some(ListMarker {
        indent,
        kind,
        number,
        content_offset: indent + marker_len + padding,
        text,
    })
}

fn skip_blank(lines: &[&str], mut i: usize) -> usize {
    while i < lines.len() && is_blank(lines[i]) {
        i += 1;
    }
    i
}

fn list(lines: &[&str], start: usize, depth: usize, out: &mut String) -> usize {
    let Some(mut marker) = list_marker(lines[start]) else {
        return start + 1;
    };
    let kind = marker.kind;

    let mut items: Vec<(ListKind, Vec<&str>)> = Vec::new();
    let mut loose = false;
    let mut i = start;

    loop {
        let (body, next) = list_item_lines(lines, i, &marker);
        loose |= body[1..].iter().any(|line| is_blank(line));
        items.push((marker.kind, body));
        i = next;

        let j = skip_blank(lines, i);
        match lines.get(j).and_then(|line| list_marker(line)) {
            Some(sibling)
                if sibling.kind.same_list(kind) && sibling.indent < marker.content_offset =>
            {
                loose |= j > i;
                marker = sibling;
                i = j;
            }
            _ => break,
        }
    }

    let (open, close) = match kind {
        ListKind::Bullet => ("<ul>\n", "</ul>\n"),
        ListKind::Task(_) => ("<ul data-type=\"taskList\">\n", "</ul>\n"),
        ListKind::Ordered => ("<ol>\n", "</ol>\n"),
    };

    out.push_str(open);
    for (item_kind, body) in items {
        match item_kind {
            ListKind::Task(checked) => out.push_str(&format!(
                "<li data-type=\"taskItem\" data-checked=\"{checked}\">"
            )),
            _ => out.push_str("<li>"),
        }
        let mut inner = String::new();
        parse_blocks(&body, depth + 1, !loose, &mut inner);
        out.push_str(inner.trim_end_matches('\n'));
        out.push_str("</li>\n");
    }
    out.push_str(close);

    i
}

/// Collect the (dedented) lines of one list item. Returns them with the
/// index of the first line after the item; trailing blank lines are not
/// part of the item.
fn list_item_lines<'a>(
    lines: &[&'a str],
    start: usize,
    marker: &ListMarker<'a>,
) -> (Vec<&'a str>, usize) {
    let mut body = vec![marker.text];
    let mut i = start + 1;

    while i < lines.len() {
        let line = lines[i];

        if is_blank(line) {
            let j = skip_blank(lines, i);
            if j < lines.len() && indent_width(lines[j]) >= marker.content_offset {
                body.extend(std::iter::repeat("").take(j - i));
                i = j;
                continue;
            }
            break;
        }

        if indent_width(line) >= marker.content_offset {
            body.push(strip_indent(line, marker.content_offset));
        } else if body.last().is_some_and(|last| !is_blank(last)) && is_lazy_continuation(line) {
            body.push(line.trim_start());
        } else {
            break;
        }
        i += 1;
    }

    (body, i)
}

/// An unindented line that continues the paragraph of the item above it
fn is_lazy_continuation(line: &str) -> bool {
    list_marker(line).is_none() && !starts_block(line, 0)
}

/// Whether `line` starts a block that ends a running paragraph
fn starts_block(line: &str, depth: usize) -> bool {
    let nested = depth < MAX_BLOCK_DEPTH;

    Fence::open(line).is_some()
        || atx_heading(line).is_some()
        || is_thematic_break(line)
        || (nested && quote_content(line).is_some())
        || html_block_start(line)
        || (nested
            && list_marker(line).is_some_and(|marker| {
                !marker.text.trim().is_empty()
                    && (marker.kind != ListKind::Ordered || marker.number == 1)
            }))
}

/// A line opening (or closing) a block-level HTML element, or a comment
fn html_block_start(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("<!--") {
        return true;
    }
    let Some(rest) = trimmed.strip_prefix('<') else {
        return false;
    };
    let rest = rest.strip_prefix('/').unwrap_or(rest);

    let name_len = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if name_len == 0 || !rest.as_bytes()[0].is_ascii_alphabetic() {
        return false;
    }
    let after = &rest[name_len..];
    is_block(&rest[..name_len]) && (after.is_empty() || after.starts_with([' ', '\t', '>', '/']))
}

/// HTML blocks run to the next blank line and are copied verbatim
fn html_block(lines: &[&str], start: usize, out: &mut String) -> usize {
    let mut i = start;
    while i < lines.len() && !is_blank(lines[i]) {
        out.push_str(lines[i]);
        out.push('\n');
        i += 1;
    }
    i
}

fn paragraph(lines: &[&str], start: usize, depth: usize, tight: bool, out: &mut String) -> usize {
    let mut text = String::new();
    let mut i = start;

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) || (i > start && starts_block(line, depth)) {
            break;
        }
        if i > start {
            text.push('\n');
        }
        text.push_str(line.trim_start());
        i += 1;
    }

    let html = parse_inline(text.trim_end());
    if tight {
        out.push_str(&html);
        out.push('\n');
    } else {
        out.push_str("<p>");
        out.push_str(&html);
        out.push_str("</p>\n");
    }
    i
}

#[cfg(test)]
mod tests {
    use super::super::render_html;
    use super::*;

    #[test]
    fn test_headings() {
        assert_eq!(render_html("# One\n###### Six"), "<h1>One</h1>\n<h6>Six</h6>");
        assert_eq!(render_html("## Closed ##"), "<h2>Closed</h2>");
        assert_eq!(render_html("# C#"), "<h1>C#</h1>");
        assert_eq!(render_html("####### seven"), "<p>####### seven</p>");
        assert_eq!(render_html("#tag"), "<p>#tag</p>");
    }

    #[test]
    fn test_fenced_code() {
        assert_eq!(
            render_html("```rust\nlet x = 1 < 2;\n```"),
            "<pre><code class=\"language-rust\">let x = 1 &lt; 2;\n</code></pre>"
        );
        assert_eq!(
            render_html("```\n**not bold**\n# not a heading\n\n- nor a list\n```"),
            "<pre><code>**not bold**\n# not a heading\n\n- nor a list\n</code></pre>"
        );
    }

    #[test]
    fn test_fence_variants() {
        assert_eq!(render_html("```\nopen"), "<pre><code>open\n</code></pre>");
        assert_eq!(
            render_html("~~~~\n```\ninner\n```\n~~~~"),
            "<pre><code>```\ninner\n```\n</code></pre>"
        );
        assert_eq!(
            render_html("```bad\"lang\ncode\n```"),
            "<pre><code>code\n</code></pre>"
        );
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(render_html("a\n\n---\n\nb"), "<p>a</p>\n<hr>\n<p>b</p>");
        assert_eq!(render_html("* * *"), "<hr>");
        assert_eq!(render_html("--"), "<p>--</p>");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render_html("> quote\n> more"),
            "<blockquote>\n<p>quote\nmore</p>\n</blockquote>"
        );
        assert_eq!(
            render_html("> > deep"),
            "<blockquote>\n<blockquote>\n<p>deep</p>\n</blockquote>\n</blockquote>"
        );
    }

    #[test]
    fn test_blockquote_depth_is_capped() {
        let html = render_html(&format!("{} deep", ">".repeat(MAX_BLOCK_DEPTH + 8)));
        assert_eq!(html.matches("<blockquote>").count(), MAX_BLOCK_DEPTH);
        assert!(html.contains("&gt;"));
    }

    #[test]
    fn test_lists() {
        assert_eq!(render_html("- a\n- b"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>");
        assert_eq!(render_html("* a\n+ b"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>");
        assert_eq!(render_html("1. one\n2) two"), "<ol>\n<li>one</li>\n<li>two</li>\n</ol>");
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            render_html("- [x] done\n- [ ] todo\n- [X]"),
            "<ul data-type=\"taskList\">\n\
             <li data-type=\"taskItem\" data-checked=\"true\">done</li>\n\
             <li data-type=\"taskItem\" data-checked=\"false\">todo</li>\n\
             <li data-type=\"taskItem\" data-checked=\"true\"></li>\n</ul>"
        );
        assert_eq!(render_html("- [x]not"), "<ul>\n<li>[x]not</li>\n</ul>");
    }

    #[test]
    fn test_list_kind_change_starts_new_list() {
        assert_eq!(
            render_html("- a\n1. b\n- [ ] c"),
            "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>\n\
             <ul data-type=\"taskList\">\n<li data-type=\"taskItem\" data-checked=\"false\">c</li>\n</ul>"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            render_html("1. parent\n   - child\n2. next"),
            "<ol>\n<li>parent\n<ul>\n<li>child</li>\n</ul></li>\n<li>next</li>\n</ol>"
        );
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(
            render_html("- one\n\n  two\n- three"),
            "<ul>\n<li><p>one</p>\n<p>two</p></li>\n<li><p>three</p></li>\n</ul>"
        );
        assert_eq!(
            render_html("- a\n\n- b"),
            "<ul>\n<li><p>a</p></li>\n<li><p>b</p></li>\n</ul>"
        );
    }

    #[test]
    fn test_lazy_continuation() {
        assert_eq!(render_html("- a\nb"), "<ul>\n<li>a\nb</li>\n</ul>");
        assert_eq!(render_html("- a\n\nb"), "<ul>\n<li>a</li>\n</ul>\n<p>b</p>");
    }

    #[test]
    fn test_paragraph_interruption() {
        assert_eq!(
            render_html("text\n- item"),
            "<p>text</p>\n<ul>\n<li>item</li>\n</ul>"
        );
        assert_eq!(render_html("text\n2. not a list"), "<p>text\n2. not a list</p>");
        assert_eq!(render_html("text\n# Heading"), "<p>text</p>\n<h1>Heading</h1>");
    }

    #[test]
    fn test_html_block() {
        assert_eq!(
            render_html("<div>\n*raw*\n</div>\n\npara"),
            "<div>\n*raw*\n</div>\n<p>para</p>"
        );
        assert_eq!(render_html("<span>inline</span>"), "<p><span>inline</span></p>");
    }

    #[test]
    fn test_list_marker() {
        let marker = list_marker("  - [ ] task").expect("marker");
        assert_eq!(marker.indent, 2);
        assert_eq!(marker.kind, ListKind::Task(false));
        assert_eq!(marker.content_offset, 4);
        assert_eq!(marker.text, "task");

        let marker = list_marker("10. ten").expect("marker");
        assert_eq!(marker.number, 10);
        assert_eq!(marker.content_offset, 4);

        assert!(list_marker("-not").is_none());
        assert!(list_marker("- - -").is_none());
        assert!(list_marker("1234567890. big").is_none());
    }

    #[test]
    fn test_indent_helpers() {
        assert_eq!(indent_width("\t  x"), 6);
        assert_eq!(strip_indent("    x", 2), "  x");
        assert_eq!(strip_indent(" x", 4), "x");
    }
}
