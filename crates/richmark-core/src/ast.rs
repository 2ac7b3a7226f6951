//! Markdown Abstract Syntax Tree
//!
//! This module defines the AST nodes for representing Markdown documents.
//! The HTML side of richmark lowers sanitized editor content into this tree
//! before it is written out as Markdown text.

/// A block-level Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Root document container
    Document(Vec<Block>),

    /// Heading with level (1-6) and inline content
    Heading {
        level: u8,
        content: Vec<Inline>,
    },

    /// Paragraph containing inline content
    Paragraph(Vec<Inline>),

    /// Block quote containing nested blocks
    BlockQuote(Vec<Block>),

    /// List (ordered, bullet or task list)
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },

    /// Fenced code block
    CodeBlock {
        language: Option<String>,
        code: String,
    },

    /// Thematic break (horizontal rule)
    ThematicBreak,

    /// Raw, already sanitized HTML block (tables are passed through this way)
    HtmlBlock(String),
}

/// A list item containing blocks.
///
/// `checked` is `Some` only for task items.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub checked: Option<bool>,
    pub content: Vec<Block>,
}

impl ListItem {
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            checked: None,
            content,
        }
    }

    pub fn task(checked: bool, content: Vec<Block>) -> Self {
        Self {
            checked: Some(checked),
            content,
        }
    }

    pub fn from_inlines(inlines: Vec<Inline>) -> Self {
        Self::new(vec![Block::Paragraph(inlines)])
    }

    /// Whether this item is a task item
    pub fn is_task(&self) -> bool {
        self.checked.is_some()
    }
}

/// An inline Markdown node
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Plain text, already escaped for Markdown
    Text(String),

    /// Strong emphasis (bold)
    Strong(Vec<Inline>),

    /// Emphasis (italic)
    Emphasis(Vec<Inline>),

    /// Strikethrough
    Strikethrough(Vec<Inline>),

    /// Inline code
    Code(String),

    /// Link with text and URL
    Link { content: Vec<Inline>, url: String },

    /// Image with alt text and URL
    Image { alt: String, url: String },

    /// Hard line break
    LineBreak,

    /// Raw HTML inline (underline markers)
    HtmlInline(String),
}

impl Block {
    /// Check if this block is empty/blank
    pub fn is_blank(&self) -> bool {
        match self {
            Block::Document(blocks) => blocks.iter().all(|b| b.is_blank()),
            Block::Paragraph(inlines) => inlines_are_blank(inlines),
            Block::Heading { content, .. } => inlines_are_blank(content),
            Block::BlockQuote(blocks) => blocks.iter().all(|b| b.is_blank()),
            Block::List { items, .. } => items.iter().all(|i| i.is_blank()),
            Block::CodeBlock { code, .. } => code.trim().is_empty(),
            Block::ThematicBreak => false,
            Block::HtmlBlock(html) => html.trim().is_empty(),
        }
    }
}

impl ListItem {
    /// Task items are meaningful even without text
    pub fn is_blank(&self) -> bool {
        !self.is_task() && self.content.iter().all(|b| b.is_blank())
    }
}

impl Inline {
    /// Check if this inline is empty/blank
    pub fn is_blank(&self) -> bool {
        match self {
            Inline::Text(text) => text.trim().is_empty(),
            Inline::Strong(inlines)
            | Inline::Emphasis(inlines)
            | Inline::Strikethrough(inlines) => inlines_are_blank(inlines),
            Inline::Code(code) => code.is_empty(),
            Inline::Link { content, .. } => inlines_are_blank(content),
            Inline::Image { .. } => false,
            Inline::LineBreak => false,
            Inline::HtmlInline(html) => html.trim().is_empty(),
        }
    }
}

/// Check if a run of inlines is all blank
pub fn inlines_are_blank(inlines: &[Inline]) -> bool {
    inlines.iter().all(|i| i.is_blank())
}
