//! The sanitized tree and its HTML writer.

use super::policy::{Attr, Tag};
use crate::utilities::{escape_html_attr, escape_html_text};

/// A node that survived sanitization.
///
/// Elements can only carry an allowed [`Tag`] and allowed [`Attr`]s, so any
/// code holding a `SafeNode` cannot emit markup outside the allow-list.
#[derive(Debug, Clone, PartialEq)]
pub enum SafeNode {
    Text(String),
    Element(SafeElement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafeElement {
    pub(crate) tag: Tag,
    pub(crate) attrs: Vec<(Attr, String)>,
    pub(crate) children: Vec<SafeNode>,
}

impl SafeElement {
    pub(crate) fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn attr(&self, attr: Attr) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| *name == attr)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> &[(Attr, String)] {
        &self.attrs
    }

    pub fn children(&self) -> &[SafeNode] {
        &self.children
    }
}

impl SafeNode {
    pub fn tag(&self) -> Option<Tag> {
        match self {
            SafeNode::Element(element) => Some(element.tag),
            SafeNode::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &SafeNode, out: &mut String) {
    match node {
        SafeNode::Text(text) => out.push_str(text),
        SafeNode::Element(element) => {
            for child in &element.children {
                collect_text(child, out);
            }
        }
    }
}

/// Serialize sanitized nodes back to HTML
pub fn to_html(nodes: &[SafeNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

pub(crate) fn write_node(node: &SafeNode, out: &mut String) {
    match node {
        SafeNode::Text(text) => out.push_str(&escape_html_text(text)),
        SafeNode::Element(element) => {
            let name = element.tag.name();
            out.push('<');
            out.push_str(name);
            for (attr, value) in &element.attrs {
                out.push(' ');
                out.push_str(attr.name());
                out.push_str("=\"");
                out.push_str(&escape_html_attr(value));
                out.push('"');
            }
            out.push('>');

            if element.tag.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}
