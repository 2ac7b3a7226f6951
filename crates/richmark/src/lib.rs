//! # richmark
//!
//! Convert between Markdown and the HTML a rich-text editor produces.
//!
//! Both directions go through an allow-list sanitizer, so the only markup
//! that can come out of this crate is the fixed editor vocabulary: paragraphs,
//! headings, emphasis, lists (including task lists), quotes, code, links,
//! images, rules and tables.
//!
//! ## Design
//!
//! HTML is parsed by a small tolerant tree builder into [`Node`]s and then
//! rebuilt as [`SafeNode`]s, whose tags and attributes are closed enums. The
//! Markdown side is produced by lowering that tree to the `richmark-core`
//! AST, so nothing the sanitizer removed can reach the serializer.
//!
//! Markdown is parsed by a line-based block scanner and a single-pass inline
//! tokenizer, both linear in the input, and the resulting HTML is sanitized
//! once more before it is returned.
//!
//! ## Example
//!
//! ```rust
//! use richmark::{is_safe, parse_from_markdown, render_to_markdown};
//!
//! let html = parse_from_markdown("# Title\n**bold** and *italic*");
//! assert_eq!(html, "<h1>Title</h1>\n<p><strong>bold</strong> and <em>italic</em></p>");
//!
//! let markdown = render_to_markdown("<p><strong>bold text</strong></p>");
//! assert_eq!(markdown, "**bold text**");
//!
//! assert!(!is_safe("<SCRIPT>alert(1)</SCRIPT>"));
//! ```
//!
//! ## Example (custom options)
//!
//! ```rust
//! use richmark::{Converter, ConverterOptions, Tag};
//!
//! let mut options = ConverterOptions::default();
//! options.policy = options.policy.deny_tag(Tag::Img);
//! options.markdown.bullet_list_marker = '*';
//!
//! let converter = Converter::with_options(options);
//! let markdown = converter.render_to_markdown(r#"<ul><li>a <img src="/x.png"></li></ul>"#);
//! assert_eq!(markdown, "* a");
//! ```

mod convert;
pub mod html;
mod markdown;
pub mod node;
mod safety;
pub mod sanitize;
mod service;
mod url_policy;
mod utilities;

use once_cell::sync::Lazy;

pub use convert::convert;
pub use html::parse_html;
pub use markdown::MAX_BLOCK_DEPTH;
pub use node::{Element, Node};
pub use richmark_core::Options;
pub use sanitize::{sanitize, sanitize_tree, to_html, AllowListPolicy, Attr, SafeElement, SafeNode, Tag};
pub use service::{Converter, ConverterOptions, DEFAULT_MAX_INPUT_LEN};
pub use url_policy::{is_safe_image_src, is_safe_link, MAX_URL_LEN};

/// Error type for richmark operations
#[derive(Debug, thiserror::Error)]
pub enum RichmarkError {
    #[error("input of {len} bytes exceeds the {limit} byte limit")]
    InputTooLarge { len: usize, limit: usize },

    #[error("Conversion error: {0}")]
    ConversionError(String),
}

pub type Result<T> = std::result::Result<T, RichmarkError>;

static DEFAULT_CONVERTER: Lazy<Converter> = Lazy::new(Converter::new);

/// Convert Markdown to sanitized editor HTML.
///
/// Never fails: empty or `None` input and internal failures give `""`.
pub fn parse_from_markdown<'a>(markdown: impl Into<Option<&'a str>>) -> String {
    match markdown.into() {
        Some(markdown) if !markdown.is_empty() => DEFAULT_CONVERTER.parse_from_markdown(markdown),
        _ => String::new(),
    }
}

/// Convert editor HTML to Markdown.
///
/// Never fails: empty or `None` input gives `""`, and on an internal failure
/// the input is returned unchanged.
pub fn render_to_markdown<'a>(html: impl Into<Option<&'a str>>) -> String {
    match html.into() {
        Some(html) if !html.is_empty() => DEFAULT_CONVERTER.render_to_markdown(html),
        _ => String::new(),
    }
}

/// Advisory check for script injection patterns; `None` and `""` are safe.
///
/// Use [`sanitize`] to clean content; this only helps decide whether to
/// reject it up front.
pub fn is_safe<'a>(text: impl Into<Option<&'a str>>) -> bool {
    text.into().map_or(true, safety::check)
}
