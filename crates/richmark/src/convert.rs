//! Lower a sanitized tree to the Markdown AST
//!
//! This module transforms [`SafeNode`]s into the Markdown AST defined in
//! richmark-core. Only allowed tags can reach it, so every element has a
//! fixed mapping and nothing needs to be skipped.

use richmark_core::{Block, Inline, ListItem};

use crate::sanitize::{to_html, Attr, SafeElement, SafeNode, Tag};
use crate::utilities::{collapse_whitespace, escape_markdown, is_language_tag};

/// Convert sanitized nodes to a Markdown document
pub fn convert(nodes: &[SafeNode]) -> Block {
    Block::Document(convert_blocks(nodes))
}

/// Context for inline conversion (tracks enclosing elements)
#[derive(Default, Clone, Copy)]
struct Context {
    in_link: bool,
}

/// Convert a run of sibling nodes; inline runs between blocks become paragraphs
fn convert_blocks(nodes: &[SafeNode]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending = Vec::new();
    let ctx = Context::default();

    for node in nodes {
        match node {
            SafeNode::Element(element) if is_block(element.tag()) => {
                flush_paragraph(&mut pending, &mut blocks);
                convert_block(element, &mut blocks);
            }
            other => convert_inline(other, ctx, &mut pending),
        }
    }

    flush_paragraph(&mut pending, &mut blocks);
    blocks
}

fn flush_paragraph(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    let inlines = std::mem::take(pending);
    if !richmark_core::inlines_are_blank(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}

fn is_block(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::P | Tag::Blockquote | Tag::Ul | Tag::Ol | Tag::Li | Tag::Pre | Tag::Hr
    ) || tag.heading_level().is_some()
        || tag.is_table_part()
}

fn convert_block(element: &SafeElement, blocks: &mut Vec<Block>) {
    let tag = element.tag();

    if let Some(level) = tag.heading_level() {
        blocks.push(Block::Heading {
            level,
            content: collect_inlines(element.children(), Context::default()),
        });
        return;
    }

    match tag {
        // Paragraphs may hold blocks too: the tree builder never splits them
        Tag::P => blocks.extend(convert_blocks(element.children())),

        Tag::Blockquote => blocks.push(Block::BlockQuote(convert_blocks(element.children()))),

        Tag::Ul | Tag::Ol => push_lists(tag == Tag::Ol, collect_list_items(element), blocks),

        // A list item outside of any list
        Tag::Li => blocks.push(Block::List {
            ordered: false,
            items: vec![list_item(element)],
        }),

        Tag::Pre => blocks.push(convert_pre(element)),

        Tag::Hr => blocks.push(Block::ThematicBreak),

        // Tables (and stray table parts) are passed through as HTML
        _ => blocks.push(Block::HtmlBlock(table_html(element))),
    }
}

/// Collect list items from ul/ol
fn collect_list_items(list: &SafeElement) -> Vec<ListItem> {
    let mut items: Vec<ListItem> = Vec::new();

    for child in list.children() {
        match child {
            SafeNode::Element(li) if li.tag() == Tag::Li => items.push(list_item(li)),
            SafeNode::Text(text) if text.trim().is_empty() => {}
            // Anything else (typically a nested list) belongs to the item before it
            other => {
                let blocks = convert_blocks(std::slice::from_ref(other));
                match items.last_mut() {
                    Some(item) => item.content.extend(blocks),
                    None => items.push(ListItem::new(blocks)),
                }
            }
        }
    }

    items
}

/// Markdown has no numbered checkbox and a list cannot mix task items with
/// plain ones: every run of one or the other becomes its own list, and task
/// runs are bullet lists.
fn push_lists(ordered: bool, items: Vec<ListItem>, blocks: &mut Vec<Block>) {
    let mut run: Vec<ListItem> = Vec::new();
    for item in items {
        if run.last().is_some_and(|last| last.is_task() != item.is_task()) {
            flush_list(ordered, &mut run, blocks);
        }
        run.push(item);
    }
    flush_list(ordered, &mut run, blocks);
}

fn flush_list(ordered: bool, run: &mut Vec<ListItem>, blocks: &mut Vec<Block>) {
    let items = std::mem::take(run);
    let Some(first) = items.first() else {
        return;
    };
    blocks.push(Block::List {
        ordered: ordered && !first.is_task(),
        items,
    });
}

fn list_item(li: &SafeElement) -> ListItem {
    let content = convert_blocks(li.children());
    match li.attr(Attr::DataType) {
        Some("taskItem") => ListItem::task(li.attr(Attr::DataChecked) == Some("true"), content),
        _ => ListItem::new(content),
    }
}

fn convert_pre(pre: &SafeElement) -> Block {
    let code_element = pre.children().iter().find_map(|child| match child {
        SafeNode::Element(element) if element.tag() == Tag::Code => Some(element),
        _ => None,
    });

    let language = code_element
        .and_then(|code| code.attr(Attr::Class))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|name| name.strip_prefix("language-"))
        })
        .filter(|language| is_language_tag(language))
        .map(str::to_string);

    let code: String = pre.children().iter().map(SafeNode::text_content).collect();
    Block::CodeBlock { language, code }
}

/// Sanitized HTML for a table, kept free of blank lines so it stays one HTML block
fn table_html(element: &SafeElement) -> String {
    let html = to_html(std::slice::from_ref(&SafeNode::Element(element.clone())));
    html.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collect inline content from a list of nodes
fn collect_inlines(nodes: &[SafeNode], ctx: Context) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for node in nodes {
        convert_inline(node, ctx, &mut inlines);
    }
    inlines
}

fn convert_inline(node: &SafeNode, ctx: Context, out: &mut Vec<Inline>) {
    let element = match node {
        SafeNode::Text(text) => {
            let collapsed = collapse_whitespace(text);
            if !collapsed.is_empty() {
                out.push(Inline::Text(escape_markdown(&collapsed)));
            }
            return;
        }
        SafeNode::Element(element) => element,
    };

    match element.tag() {
        Tag::Strong => push_merged(out, Inline::Strong(collect_inlines(element.children(), ctx))),

        Tag::Em => push_merged(out, Inline::Emphasis(collect_inlines(element.children(), ctx))),

        Tag::Del | Tag::S | Tag::Strike => {
            push_merged(out, Inline::Strikethrough(collect_inlines(element.children(), ctx)))
        }

        // No Markdown syntax for underline; keep the (allowed) tag inline
        Tag::U => {
            out.push(Inline::HtmlInline("<u>".to_string()));
            out.extend(collect_inlines(element.children(), ctx));
            out.push(Inline::HtmlInline("</u>".to_string()));
        }

        Tag::Code | Tag::Pre => {
            let code: String = element.children().iter().map(SafeNode::text_content).collect();
            let code = code.replace('\n', " ");
            if !code.is_empty() {
                push_merged(out, Inline::Code(code));
            }
        }

        Tag::A => match element.attr(Attr::Href) {
            Some(href) if !ctx.in_link => {
                escape_image_bang(out);
                let content = collect_inlines(element.children(), Context { in_link: true });
                out.push(Inline::Link {
                    content,
                    url: escape_destination(href),
                });
            }
            _ => out.extend(collect_inlines(element.children(), ctx)),
        },

        Tag::Img => {
            if let Some(src) = element.attr(Attr::Src) {
                escape_image_bang(out);
                let alt = collapse_whitespace(element.attr(Attr::Alt).unwrap_or(""));
                out.push(Inline::Image {
                    alt: escape_markdown(alt.trim()),
                    url: escape_destination(src),
                });
            }
        }

        Tag::Br => out.push(Inline::LineBreak),

        Tag::Hr => {}

        // Blocks nested in inline content keep only their inline content
        _ => out.extend(collect_inlines(element.children(), ctx)),
    }
}

/// Push an inline, joining it with a directly preceding span of the same
/// kind: `<em>a</em><em>b</em>` has no Markdown spelling as two spans.
fn push_merged(out: &mut Vec<Inline>, inline: Inline) {
    let unmerged = match (out.last_mut(), inline) {
        (Some(Inline::Strong(previous)), Inline::Strong(content))
        | (Some(Inline::Emphasis(previous)), Inline::Emphasis(content))
        | (Some(Inline::Strikethrough(previous)), Inline::Strikethrough(content)) => {
            previous.extend(content);
            None
        }
        (Some(Inline::Code(previous)), Inline::Code(code)) => {
            previous.push_str(&code);
            None
        }
        (_, inline) => Some(inline),
    };
    if let Some(inline) = unmerged {
        out.push(inline);
    }
}

/// A `!` right before a link or image would turn `[..](..)` into image syntax
fn escape_image_bang(out: &mut [Inline]) {
    if let Some(Inline::Text(text)) = out.last_mut() {
        if text.ends_with('!') && !text.ends_with("\\!") {
            text.pop();
            text.push_str("\\!");
        }
    }
}

/// Escape parentheses in a link destination unless they are balanced
fn escape_destination(url: &str) -> String {
    let mut depth: i32 = 0;
    for c in url.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 {
        url.to_string()
    } else {
        url.replace('(', "\\(").replace(')', "\\)")
    }
}
