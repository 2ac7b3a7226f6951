//! Allow-list HTML sanitizer.
//!
//! Input is parsed into a [`Node`] tree by [`crate::html`], then rebuilt
//! node by node into [`SafeNode`]s: only tags and attributes the
//! [`AllowListPolicy`] names survive. Disallowed elements are unwrapped, except
//! for the script-like ones in [`DROP_CONTENT`], which vanish with their content.

mod policy;
mod tree;

pub use policy::{AllowListPolicy, Attr, Tag};
pub use tree::{to_html, SafeElement, SafeNode};

use tracing::debug;

use crate::html::parse_html;
use crate::node::{Element, Node};
use crate::url_policy::{is_safe_image_src, is_safe_link};

/// Elements removed together with everything inside them
pub const DROP_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "applet", "noscript", "noembed",
    "noframes", "template", "textarea", "title", "xmp", "svg", "math", "select", "head",
    "frameset", "plaintext",
];

/// Sanitize an HTML fragment, returning HTML that only uses `policy`'s tags
/// and attributes.
///
/// Never fails: malformed markup is recovered by the tree builder, and the
/// result is a fixed point (`sanitize(sanitize(x)) == sanitize(x)`).
///
/// ```rust
/// use richmark::{sanitize, AllowListPolicy};
///
/// let html = sanitize(
///     r#"<p onclick="x()">Hi <script>alert(1)</script><b>there</b></p>"#,
///     &AllowListPolicy::default(),
/// );
/// assert_eq!(html, "<p>Hi there</p>");
/// ```
pub fn sanitize(html: &str, policy: &AllowListPolicy) -> String {
    to_html(&sanitize_tree(html, policy))
}

/// Sanitize an HTML fragment into a typed tree
pub fn sanitize_tree(html: &str, policy: &AllowListPolicy) -> Vec<SafeNode> {
    let nodes = parse_html(html);
    let mut out = Vec::with_capacity(nodes.len());
    filter_nodes(nodes, policy, false, &mut out);
    out
}

fn filter_nodes(
    nodes: Vec<Node>,
    policy: &AllowListPolicy,
    in_link: bool,
    out: &mut Vec<SafeNode>,
) {
    for node in nodes {
        match node {
            Node::Text(text) => push_text(out, text),
            Node::Element(element) => filter_element(element, policy, in_link, out),
        }
    }
}

fn filter_element(
    element: Element,
    policy: &AllowListPolicy,
    in_link: bool,
    out: &mut Vec<SafeNode>,
) {
    if DROP_CONTENT.contains(&element.name.as_str()) {
        debug!(tag = %element.name, "dropped element with its content");
        return;
    }

    let Some(tag) = Tag::from_name(&element.name).filter(|&tag| policy.allows_tag(tag)) else {
        debug!(tag = %element.name, "unwrapped disallowed element");
        filter_nodes(element.children, policy, in_link, out);
        return;
    };

    // Anchors do not nest
    if tag == Tag::A && in_link {
        debug!("unwrapped nested link");
        filter_nodes(element.children, policy, in_link, out);
        return;
    }

    let mut safe = SafeElement::new(tag);
    for (name, value) in element.attrs {
        match filter_attr(&name, value, policy) {
            Some(attr) => safe.attrs.push(attr),
            None => debug!(tag = tag.name(), attr = %name, "dropped attribute"),
        }
    }

    if tag == Tag::Img && safe.attr(Attr::Src).is_none() {
        debug!("dropped image without a safe src");
        return;
    }

    filter_nodes(element.children, policy, in_link || tag == Tag::A, &mut safe.children);
    out.push(SafeNode::Element(safe));
}

fn filter_attr(name: &str, value: String, policy: &AllowListPolicy) -> Option<(Attr, String)> {
    if name.starts_with("on") {
        return None;
    }
    let attr = Attr::from_name(name).filter(|&attr| policy.allows_attr(attr))?;

    let allowed = match attr {
        Attr::Href => is_safe_link(&value),
        Attr::Src => is_safe_image_src(&value),
        _ => true,
    };
    allowed.then_some((attr, value))
}

/// Append text, merging with a preceding text node
fn push_text(out: &mut Vec<SafeNode>, text: String) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(SafeNode::Text(previous)) => previous.push_str(&text),
        _ => out.push(SafeNode::Text(text)),
    }
}
