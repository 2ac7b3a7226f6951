//! HTML parsing support.
//!
//! Tokenizing is done by `html5ever`; on top of its token stream sits a
//! small tree builder that keeps to a strict stack discipline: an end tag
//! closes the nearest open element with the same name, stray end tags are
//! ignored and nothing is ever reparented. Because well-formed output parses
//! back to exactly the same tree, sanitizing twice gives the same result as
//! sanitizing once.

use std::cell::RefCell;

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::tendril::StrTendril;

use crate::node::{Element, Node};
use crate::utilities::is_void;

/// Open elements beyond this depth are ignored (their content is kept).
pub const MAX_DEPTH: usize = 256;

/// Parse an HTML fragment into a list of top-level nodes.
///
/// # Example
///
/// ```rust
/// use richmark::{parse_html, Node};
///
/// let nodes = parse_html("<p>Hello <em>World</em>");
/// assert_eq!(nodes.len(), 1);
/// assert_eq!(nodes[0].tag_name(), "p");
/// assert_eq!(nodes[0].text_content(), "Hello World");
/// ```
pub fn parse_html(html: &str) -> Vec<Node> {
    let sink = Sink::default();
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());

    let queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(html));
    let _ = tokenizer.feed(&queue);
    tokenizer.end();

    tokenizer.sink.builder.take().root
}

#[derive(Default)]
struct Sink {
    builder: RefCell<TreeBuilder>,
}

impl TokenSink for Sink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut builder = self.builder.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return builder.start_tag(tag),
                TagKind::EndTag => builder.end_tag(&tag.name),
            },
            Token::CharacterTokens(text) => builder.append(Node::Text(text.to_string())),
            Token::EOFToken => builder.close_to(0),
            // Comments, doctypes, NUL characters and parse errors leave no trace
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn start_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let mut element = Element::new(&tag.name);
        for attr in &tag.attrs {
            element.set_attr(&attr.name.local, &attr.value);
        }

        if is_void(&element.name) {
            self.append(Node::Element(element));
            return TokenSinkResult::Continue;
        }

        // Raw text elements hold no markup, so they are opened even past
        // the depth limit and their content never leaks into the parent.
        let raw = raw_text_kind(&element.name);
        if raw.is_none() && self.stack.len() >= MAX_DEPTH {
            return TokenSinkResult::Continue;
        }
        self.stack.push(element);
        raw.unwrap_or(TokenSinkResult::Continue)
    }

    fn end_tag(&mut self, name: &str) {
        if let Some(index) = self.stack.iter().rposition(|e| e.name == name) {
            self.close_to(index);
        }
    }

    /// Close open elements until only `depth` remain
    fn close_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            if let Some(element) = self.stack.pop() {
                self.append(Node::Element(element));
            }
        }
    }

    /// Append to the innermost open element, merging adjacent text
    fn append(&mut self, node: Node) {
        let children = match self.stack.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        };

        if let Node::Text(text) = &node {
            if text.is_empty() {
                return;
            }
            if let Some(Node::Text(previous)) = children.last_mut() {
                previous.push_str(text);
                return;
            }
        }
        children.push(node);
    }
}

/// Tokenizer state for elements whose content is not markup
fn raw_text_kind(name: &str) -> Option<TokenSinkResult<()>> {
    let kind = match name {
        "script" => RawKind::ScriptData,
        "textarea" | "title" => RawKind::Rcdata,
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => RawKind::Rawtext,
        "plaintext" => return Some(TokenSinkResult::Plaintext),
        _ => return None,
    };
    Some(TokenSinkResult::RawData(kind))
}
