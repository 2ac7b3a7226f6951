//! Markdown AST serialization
//!
//! Converts Markdown AST nodes into canonical Markdown text.

use crate::ast::{Block, Inline, ListItem};
use crate::options::Options;

/// Serialize a block to Markdown string
pub fn serialize(block: &Block, options: &Options) -> String {
    let mut output = String::with_capacity(1024);
    serialize_block(block, options, &mut output);

    trim_newlines(&mut output);
    output
}

fn serialize_block(block: &Block, options: &Options, out: &mut String) {
    match block {
        Block::Document(blocks) => serialize_blocks(blocks, options, out),

        Block::Heading { level, content } => serialize_heading(*level, content, options, out),

        Block::Paragraph(inlines) => {
            let text = inline_string(inlines, options, false);
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }

        Block::BlockQuote(blocks) => {
            let mut inner = String::new();
            serialize_blocks(blocks, options, &mut inner);

            let content = inner.trim_end();
            if content.is_empty() {
                return;
            }
            for (i, line) in content.lines().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push('>');
                if !line.is_empty() {
                    out.push(' ');
                    out.push_str(line);
                }
            }
            out.push_str("\n\n");
        }

        Block::List { ordered, items } => {
            let list = list_string(*ordered, items, options);
            if !list.is_empty() {
                out.push_str(&list);
                out.push_str("\n\n");
            }
        }

        Block::CodeBlock { language, code } => {
            serialize_code_block(language.as_deref(), code, options, out)
        }

        Block::ThematicBreak => {
            out.push_str(&options.hr);
            out.push_str("\n\n");
        }

        Block::HtmlBlock(html) => {
            out.push_str(html.trim());
            out.push_str("\n\n");
        }
    }
}

fn serialize_blocks(blocks: &[Block], options: &Options, out: &mut String) {
    for block in blocks {
        if !block.is_blank() {
            serialize_block(block, options, out);
        }
    }
}

fn serialize_heading(level: u8, content: &[Inline], options: &Options, out: &mut String) {
    let text = inline_string(content, options, true);
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    for _ in 0..level.clamp(1, 6) {
        out.push('#');
    }
    out.push(' ');

    // A `#` run after a space would be read back as a closing sequence
    let body = text.trim_end_matches('#');
    if body.len() < text.len() && body.ends_with([' ', '\t']) {
        out.push_str(body);
        out.push('\\');
        out.push_str(&text[body.len()..]);
    } else {
        out.push_str(text);
    }
    out.push_str("\n\n");
}

/// Render a list without its trailing blank line.
fn list_string(ordered: bool, items: &[ListItem], options: &Options) -> String {
    let mut out = String::new();
    let mut number = 0;

    for item in items {
        if item.is_blank() {
            continue;
        }

        // Checkboxes only exist on bullet items
        let mut marker = if ordered && item.checked.is_none() {
            number += 1;
            format!("{}. ", number)
        } else {
            format!("{} ", options.bullet_list_marker)
        };
        let continuation = " ".repeat(marker.len());

        match item.checked {
            Some(true) => marker.push_str("[x] "),
            Some(false) => marker.push_str("[ ] "),
            None => {}
        }

        let body = list_item_string(item, options);
        if body.is_empty() {
            out.push_str(marker.trim_end());
            out.push('\n');
            continue;
        }

        out.push_str(&marker);
        for (i, line) in body.lines().enumerate() {
            if i > 0 {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&continuation);
                }
            }
            out.push_str(line);
        }
        out.push('\n');
    }

    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out
}

/// Render the content of a list item, unindented.
///
/// Consecutive paragraphs are separated by a blank line; everything else
/// (nested lists, code) follows on the next line.
fn list_item_string(item: &ListItem, options: &Options) -> String {
    let mut out = String::new();
    let mut previous_was_paragraph = false;

    for block in &item.content {
        if block.is_blank() {
            continue;
        }
        let (part, is_paragraph) = match block {
            Block::Paragraph(inlines) => {
                (inline_string(inlines, options, false).trim().to_string(), true)
            }
            Block::List { ordered, items } => (list_string(*ordered, items, options), false),
            other => {
                let mut s = String::new();
                serialize_block(other, options, &mut s);
                (s.trim_end_matches('\n').to_string(), false)
            }
        };
        if part.is_empty() {
            continue;
        }

        if !out.is_empty() {
            if previous_was_paragraph && is_paragraph {
                out.push_str("\n\n");
            } else {
                out.push('\n');
            }
        }
        out.push_str(&part);
        previous_was_paragraph = is_paragraph;
    }

    out
}

fn serialize_code_block(language: Option<&str>, code: &str, options: &Options, out: &mut String) {
    let fence = code_fence(code, &options.fence);
    let code = code.trim_end_matches('\n');

    out.push_str(&fence);
    out.push_str(language.unwrap_or(""));
    out.push('\n');
    if !code.is_empty() {
        out.push_str(code);
        out.push('\n');
    }
    out.push_str(&fence);
    out.push_str("\n\n");
}

/// Grow the configured fence past the longest run of its character in `code`.
fn code_fence(code: &str, fence: &str) -> String {
    let Some(fence_char) = fence.chars().next() else {
        return "```".to_string();
    };
    let longest = longest_run(code, fence_char);
    let len = fence.chars().count().max(longest + 1).max(3);
    std::iter::repeat(fence_char).take(len).collect()
}

fn longest_run(text: &str, ch: char) -> usize {
    text.chars()
        .fold((0, 0), |(max, current), c| {
            if c == ch {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0
}

fn inline_string(inlines: &[Inline], options: &Options, in_heading: bool) -> String {
    let mut out = String::new();
    serialize_inlines(inlines, options, in_heading, &mut out);
    out
}

fn serialize_inlines(inlines: &[Inline], options: &Options, in_heading: bool, out: &mut String) {
    for (i, inline) in inlines.iter().enumerate() {
        serialize_inline(inline, inlines.get(i + 1), options, in_heading, out);
    }
}

fn serialize_inline(
    inline: &Inline,
    next: Option<&Inline>,
    options: &Options,
    in_heading: bool,
    out: &mut String,
) {
    match inline {
        Inline::Text(text) => out.push_str(text),

        Inline::Strong(content) => {
            let inner = inline_string(content, options, in_heading);
            wrap_delimited(&inner, &options.strong_delimiter, out);
        }

        Inline::Emphasis(content) => {
            let inner = inline_string(content, options, in_heading);
            let em = em_delimiter(options.em_delimiter, out.chars().next_back(), next);
            let mut delimiter = [0u8; 4];
            wrap_delimited(&inner, em.encode_utf8(&mut delimiter), out);
        }

        Inline::Strikethrough(content) => {
            let inner = inline_string(content, options, in_heading);
            wrap_delimited(&inner, &options.strike_delimiter, out);
        }

        Inline::Code(code) => {
            if code.is_empty() {
                return;
            }
            let backticks = "`".repeat(longest_run(code, '`') + 1);
            let all_spaces = code.chars().all(|c| c == ' ');
            let needs_space = code.starts_with('`')
                || code.ends_with('`')
                || (code.starts_with(' ') && code.ends_with(' ') && !all_spaces);
            let space = if needs_space { " " } else { "" };

            out.push_str(&backticks);
            out.push_str(space);
            out.push_str(code);
            out.push_str(space);
            out.push_str(&backticks);
        }

        Inline::Link { content, url } => {
            out.push('[');
            serialize_inlines(content, options, in_heading, out);
            out.push_str("](");
            out.push_str(url);
            out.push(')');
        }

        Inline::Image { alt, url } => {
            out.push_str("![");
            out.push_str(alt);
            out.push_str("](");
            out.push_str(url);
            out.push(')');
        }

        Inline::LineBreak => {
            if in_heading {
                out.push(' ');
            } else {
                out.push_str("  \n");
            }
        }

        Inline::HtmlInline(html) => out.push_str(html),
    }
}

/// `_` neither opens nor closes inside a word, and `_a__b_` is a single span,
/// so an underscore emphasis touching a word or another emphasis uses `*`.
fn em_delimiter(preferred: char, before: Option<char>, next: Option<&Inline>) -> char {
    if preferred != '_' {
        return preferred;
    }
    let after_word = before.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let before_word = match next {
        Some(Inline::Text(text)) => text.chars().next().is_some_and(char::is_alphanumeric),
        Some(Inline::Emphasis(_)) => true,
        _ => false,
    };
    if after_word || before_word {
        '*'
    } else {
        '_'
    }
}

/// Wrap `inner` in `delimiter`, keeping surrounding whitespace outside the markers
/// so the closing run is never preceded by a space.
fn wrap_delimited(inner: &str, delimiter: &str, out: &mut String) {
    let core = inner.trim();
    if core.is_empty() {
        return;
    }
    let leading = &inner[..inner.len() - inner.trim_start().len()];
    let trailing = &inner[inner.trim_end().len()..];

    out.push_str(leading);
    out.push_str(delimiter);
    out.push_str(core);
    out.push_str(delimiter);
    out.push_str(trailing);
}

/// Strip leading and trailing newlines in place
fn trim_newlines(s: &mut String) {
    let end = s.trim_end_matches('\n').len();
    s.truncate(end);
    let start = s.len() - s.trim_start_matches('\n').len();
    s.drain(..start);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_options() -> Options {
        Options::default()
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_paragraph() {
        let block = Block::Paragraph(vec![text("Hello World")]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "Hello World");
    }

    #[test]
    fn test_heading_levels() {
        let block = Block::Document(vec![
            Block::Heading {
                level: 1,
                content: vec![text("Title")],
            },
            Block::Heading {
                level: 6,
                content: vec![text("Deep")],
            },
        ]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "# Title\n\n###### Deep");
    }

    #[test]
    fn test_heading_trailing_hashes_escaped() {
        let heading = |s: &str| Block::Heading {
            level: 1,
            content: vec![text(s)],
        };
        let options = default_options();
        assert_eq!(serialize(&heading("C #"), &options), "# C \\#");
        assert_eq!(serialize(&heading("Issue ##"), &options), "# Issue \\##");
        assert_eq!(serialize(&heading("C#"), &options), "# C#");
    }

    #[test]
    fn test_heading_line_break_becomes_space() {
        let block = Block::Heading {
            level: 2,
            content: vec![text("a"), Inline::LineBreak, text("b")],
        };
        assert_eq!(serialize(&block, &default_options()), "## a b");
    }

    #[test]
    fn test_strong() {
        let block = Block::Paragraph(vec![Inline::Strong(vec![text("bold")])]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "**bold**");
    }

    #[test]
    fn test_emphasis() {
        let block = Block::Paragraph(vec![Inline::Emphasis(vec![text("italic")])]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "_italic_");
    }

    #[test]
    fn test_intraword_emphasis_uses_asterisk() {
        let block = Block::Paragraph(vec![Inline::Emphasis(vec![text("foo")]), text("bar")]);
        assert_eq!(serialize(&block, &default_options()), "*foo*bar");

        let block = Block::Paragraph(vec![text("bar"), Inline::Emphasis(vec![text("foo")])]);
        assert_eq!(serialize(&block, &default_options()), "bar*foo*");

        let block = Block::Paragraph(vec![
            text("a "),
            Inline::Emphasis(vec![text("b")]),
            text(", c"),
        ]);
        assert_eq!(serialize(&block, &default_options()), "a _b_, c");
    }

    #[test]
    fn test_adjacent_emphasis_alternates_delimiters() {
        let block = Block::Paragraph(vec![
            Inline::Emphasis(vec![text("a")]),
            Inline::Emphasis(vec![text("b")]),
        ]);
        assert_eq!(serialize(&block, &default_options()), "*a*_b_");
    }

    #[test]
    fn test_nested_strong_emphasis() {
        let block = Block::Paragraph(vec![Inline::Strong(vec![Inline::Emphasis(vec![text(
            "text",
        )])])]);
        assert_eq!(serialize(&block, &default_options()), "**_text_**");
    }

    #[test]
    fn test_strikethrough() {
        let block = Block::Paragraph(vec![Inline::Strikethrough(vec![text("gone")])]);
        assert_eq!(serialize(&block, &default_options()), "~~gone~~");
    }

    #[test]
    fn test_whitespace_moves_outside_delimiters() {
        let block = Block::Paragraph(vec![
            text("a"),
            Inline::Strong(vec![text(" bold ")]),
            text("b"),
        ]);
        assert_eq!(serialize(&block, &default_options()), "a **bold** b");
    }

    #[test]
    fn test_blank_strong_is_dropped() {
        let block = Block::Paragraph(vec![text("a"), Inline::Strong(vec![text(" ")])]);
        assert_eq!(serialize(&block, &default_options()), "a");
    }

    #[test]
    fn test_inline_code() {
        let block = Block::Paragraph(vec![Inline::Code("code".to_string())]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "`code`");
    }

    #[test]
    fn test_inline_code_with_backticks() {
        let block = Block::Paragraph(vec![Inline::Code("a `b` c".to_string())]);
        assert_eq!(serialize(&block, &default_options()), "``a `b` c``");

        let block = Block::Paragraph(vec![Inline::Code("`tick".to_string())]);
        assert_eq!(serialize(&block, &default_options()), "`` `tick ``");
    }

    #[test]
    fn test_link() {
        let block = Block::Paragraph(vec![Inline::Link {
            content: vec![text("Example")],
            url: "https://example.com".to_string(),
        }]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "[Example](https://example.com)");
    }

    #[test]
    fn test_image() {
        let block = Block::Paragraph(vec![Inline::Image {
            alt: "Alt text".to_string(),
            url: "/image.png".to_string(),
        }]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "![Alt text](/image.png)");
    }

    #[test]
    fn test_line_break() {
        let block = Block::Paragraph(vec![text("one"), Inline::LineBreak, text("two")]);
        assert_eq!(serialize(&block, &default_options()), "one  \ntwo");
    }

    #[test]
    fn test_code_block_fenced() {
        let block = Block::CodeBlock {
            language: Some("rust".to_string()),
            code: "let x = 1;\n".to_string(),
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "```rust\nlet x = 1;\n```");
    }

    #[test]
    fn test_code_block_fence_grows() {
        let block = Block::CodeBlock {
            language: None,
            code: "```\ninner\n```".to_string(),
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "````\n```\ninner\n```\n````");
    }

    #[test]
    fn test_code_block_keeps_blank_lines() {
        let block = Block::CodeBlock {
            language: None,
            code: "a\n\n\n\nb".to_string(),
        };
        assert_eq!(serialize(&block, &default_options()), "```\na\n\n\n\nb\n```");
    }

    #[test]
    fn test_blockquote() {
        let block = Block::BlockQuote(vec![
            Block::Paragraph(vec![text("Quote")]),
            Block::Paragraph(vec![text("More")]),
        ]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "> Quote\n>\n> More");
    }

    #[test]
    fn test_unordered_list() {
        let block = Block::List {
            ordered: false,
            items: vec![
                ListItem::from_inlines(vec![text("One")]),
                ListItem::from_inlines(vec![text("Two")]),
            ],
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "- One\n- Two");
    }

    #[test]
    fn test_ordered_list_numbers_sequentially() {
        let block = Block::List {
            ordered: true,
            items: vec![
                ListItem::from_inlines(vec![text("First")]),
                ListItem::from_inlines(vec![text("Second")]),
                ListItem::from_inlines(vec![text("Third")]),
            ],
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "1. First\n2. Second\n3. Third");
    }

    #[test]
    fn test_task_list() {
        let block = Block::List {
            ordered: false,
            items: vec![
                ListItem::task(true, vec![Block::Paragraph(vec![text("done")])]),
                ListItem::task(false, vec![Block::Paragraph(vec![text("todo")])]),
                ListItem::task(false, vec![]),
            ],
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "- [x] done\n- [ ] todo\n- [ ]");
    }

    #[test]
    fn test_task_item_in_ordered_list_keeps_checkbox() {
        let block = Block::List {
            ordered: true,
            items: vec![
                ListItem::from_inlines(vec![text("one")]),
                ListItem::task(true, vec![Block::Paragraph(vec![text("done")])]),
                ListItem::from_inlines(vec![text("two")]),
            ],
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "1. one\n- [x] done\n2. two");
    }

    #[test]
    fn test_nested_list_is_indented() {
        let nested = Block::List {
            ordered: false,
            items: vec![ListItem::from_inlines(vec![text("child")])],
        };
        let block = Block::List {
            ordered: true,
            items: vec![ListItem::new(vec![
                Block::Paragraph(vec![text("parent")]),
                nested,
            ])],
        };
        let result = serialize(&block, &default_options());
        assert_eq!(result, "1. parent\n   - child");
    }

    #[test]
    fn test_list_item_paragraphs() {
        let block = Block::List {
            ordered: false,
            items: vec![ListItem::new(vec![
                Block::Paragraph(vec![text("one")]),
                Block::Paragraph(vec![text("two")]),
            ])],
        };
        assert_eq!(serialize(&block, &default_options()), "- one\n\n  two");
    }

    #[test]
    fn test_thematic_break() {
        let block = Block::ThematicBreak;
        let result = serialize(&block, &default_options());
        assert_eq!(result, "---");
    }

    #[test]
    fn test_html_block() {
        let block = Block::Document(vec![
            Block::Paragraph(vec![text("before")]),
            Block::HtmlBlock("<table><tr><td>1</td></tr></table>".to_string()),
        ]);
        assert_eq!(
            serialize(&block, &default_options()),
            "before\n\n<table><tr><td>1</td></tr></table>"
        );
    }

    #[test]
    fn test_custom_options() {
        let options = Options {
            bullet_list_marker: '*',
            em_delimiter: '*',
            ..Options::default()
        };
        let block = Block::List {
            ordered: false,
            items: vec![ListItem::from_inlines(vec![Inline::Emphasis(vec![text("x")])])],
        };
        assert_eq!(serialize(&block, &options), "* *x*");
    }
}
