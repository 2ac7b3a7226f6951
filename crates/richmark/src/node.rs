//! DOM-like node structure for parsed, not yet sanitized HTML.
//!
//! The tree builder in [`crate::html`] produces these nodes from arbitrary
//! input. Nothing here is trusted: the sanitizer walks this tree and only
//! rebuilds what its allow-list permits as [`crate::SafeNode`]s.

use indexmap::IndexMap;

/// A parsed HTML node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Decoded text content
    Text(String),
    /// Element with lowercase tag name, attributes and children
    Element(Element),
}

/// An element as it appeared in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    /// Attributes in source order, lowercase names, decoded values.
    /// The first occurrence of a duplicated attribute wins.
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    /// Get the tag name (lowercase), empty for text
    pub fn tag_name(&self) -> &str {
        match self {
            Node::Element(element) => &element.name,
            Node::Text(_) => "",
        }
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        let children: &[Node] = match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        };
        children.iter()
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(_) => self.children().map(|child| child.text_content()).collect(),
        }
    }
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Self {
            name: tag_name.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute unless it is already present
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
    }
}
