//! Converter - the main entry point for Markdown and HTML conversion.

use std::panic::{self, AssertUnwindSafe};

use richmark_core::{serialize, Options};
use tracing::{trace, warn};

use crate::convert::convert;
use crate::markdown::markdown_to_html;
use crate::sanitize::{sanitize_tree, to_html, AllowListPolicy};
use crate::{Result, RichmarkError};

/// Default input limit: 4 MiB
pub const DEFAULT_MAX_INPUT_LEN: usize = 4 * 1024 * 1024;

/// Options for [`Converter`]
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Markdown output style
    pub markdown: Options,

    /// Tags and attributes allowed in HTML, both read and produced
    pub policy: AllowListPolicy,

    /// The `try_*` methods reject inputs longer than this many bytes
    pub max_input_len: usize,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            markdown: Options::default(),
            policy: AllowListPolicy::default(),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

/// Converts between Markdown and sanitized editor HTML.
///
/// The `try_*` methods enforce [`ConverterOptions::max_input_len`] and report
/// failures. The others take input of any size, never fail, and only when a
/// pass panics degrade the way a save or load path needs: an empty string
/// when parsing, the original input when rendering.
///
/// ```rust
/// use richmark::Converter;
///
/// let converter = Converter::new();
/// let html = converter.parse_from_markdown("*hi*");
/// assert_eq!(html, "<p><em>hi</em></p>");
/// assert_eq!(converter.render_to_markdown(&html), "_hi_");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
}

impl Converter {
    /// Create a Converter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Converter with custom options
    pub fn with_options(options: ConverterOptions) -> Self {
        Self { options }
    }

    /// Get the current options
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ConverterOptions {
        &mut self.options
    }

    /// Sanitize HTML with this converter's policy
    pub fn sanitize(&self, html: &str) -> String {
        to_html(&sanitize_tree(html, &self.options.policy))
    }

    /// Convert Markdown to sanitized HTML
    pub fn try_parse_from_markdown(&self, markdown: &str) -> Result<String> {
        self.check_len(markdown)?;
        self.parse_pass(markdown)
    }

    /// Convert Markdown to sanitized HTML, returning `""` on failure
    pub fn parse_from_markdown(&self, markdown: &str) -> String {
        self.parse_pass(markdown).unwrap_or_else(|err| {
            warn!(error = %err, "markdown parsing failed, returning empty html");
            String::new()
        })
    }

    /// Convert HTML to Markdown; the HTML is sanitized first
    pub fn try_render_to_markdown(&self, html: &str) -> Result<String> {
        self.check_len(html)?;
        self.render_pass(html)
    }

    /// Convert HTML to Markdown, returning the input unchanged on failure
    pub fn render_to_markdown(&self, html: &str) -> String {
        self.render_pass(html).unwrap_or_else(|err| {
            warn!(error = %err, "markdown rendering failed, returning input unchanged");
            html.to_string()
        })
    }

    fn parse_pass(&self, markdown: &str) -> Result<String> {
        guarded(|| markdown_to_html(markdown, &self.options.policy))
    }

    fn render_pass(&self, html: &str) -> Result<String> {
        guarded(|| {
            let nodes = sanitize_tree(html, &self.options.policy);
            trace!(nodes = nodes.len(), "lowering sanitized html");
            serialize(&convert(&nodes), &self.options.markdown)
        })
    }

    fn check_len(&self, input: &str) -> Result<()> {
        let limit = self.options.max_input_len;
        if input.len() > limit {
            return Err(RichmarkError::InputTooLarge {
                len: input.len(),
                limit,
            });
        }
        Ok(())
    }
}

/// Run a conversion pass, turning a panic into a [`RichmarkError`]
fn guarded<F>(pass: F) -> Result<String>
where
    F: FnOnce() -> String,
{
    panic::catch_unwind(AssertUnwindSafe(pass)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        RichmarkError::ConversionError(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::Tag;

    #[test]
    fn test_simple_paragraph() {
        let converter = Converter::new();
        assert_eq!(converter.render_to_markdown("<p>Hello World</p>"), "Hello World");
    }

    #[test]
    fn test_heading() {
        let converter = Converter::new();
        assert_eq!(converter.render_to_markdown("<h1>Title</h1>"), "# Title");
        assert_eq!(converter.parse_from_markdown("### Title"), "<h3>Title</h3>");
    }

    #[test]
    fn test_emphasis_and_strong() {
        let converter = Converter::new();
        assert_eq!(converter.render_to_markdown("<em>emphasized</em>"), "_emphasized_");
        assert_eq!(converter.render_to_markdown("<strong>bold</strong>"), "**bold**");
        assert_eq!(
            converter.render_to_markdown("<strong><em>both</em></strong>"),
            "**_both_**"
        );
    }

    #[test]
    fn test_inline_link() {
        let converter = Converter::new();
        let result = converter.render_to_markdown(r#"<a href="https://example.com">Link</a>"#);
        assert_eq!(result, "[Link](https://example.com)");
    }

    #[test]
    fn test_image() {
        let converter = Converter::new();
        let result = converter.render_to_markdown(r#"<img src="/test.png" alt="Alt">"#);
        assert_eq!(result, "![Alt](/test.png)");
    }

    #[test]
    fn test_fenced_code_block() {
        let converter = Converter::new();
        let result = converter
            .render_to_markdown(r#"<pre><code class="language-js">function() {}</code></pre>"#);
        assert_eq!(result, "```js\nfunction() {}\n```");
    }

    #[test]
    fn test_ordered_list() {
        let converter = Converter::new();
        let result = converter.render_to_markdown("<ol><li>One</li><li>Two</li></ol>");
        assert_eq!(result, "1. One\n2. Two");
    }

    #[test]
    fn test_custom_markdown_options() {
        let mut converter = Converter::new();
        converter.options_mut().markdown.bullet_list_marker = '*';
        converter.options_mut().markdown.em_delimiter = '*';
        let result = converter.render_to_markdown("<ul><li><em>a</em></li></ul>");
        assert_eq!(result, "* *a*");
    }

    #[test]
    fn test_policy_applies_both_ways() {
        let options = ConverterOptions {
            policy: AllowListPolicy::default().deny_tag(Tag::Strong),
            ..Default::default()
        };
        let converter = Converter::with_options(options);
        assert_eq!(converter.parse_from_markdown("**x**"), "<p>x</p>");
        assert_eq!(converter.render_to_markdown("<strong>x</strong>"), "x");
        assert_eq!(converter.sanitize("<p><strong>x</strong></p>"), "<p>x</p>");
    }

    #[test]
    fn test_input_too_large() {
        let options = ConverterOptions {
            max_input_len: 4,
            ..Default::default()
        };
        let converter = Converter::with_options(options);

        let err = converter.try_render_to_markdown("<p>long</p>").unwrap_err();
        assert!(matches!(err, RichmarkError::InputTooLarge { len: 11, limit: 4 }));
        assert_eq!(
            err.to_string(),
            "input of 11 bytes exceeds the 4 byte limit"
        );

        assert!(converter.try_parse_from_markdown("# long").is_err());
        assert_eq!(converter.try_parse_from_markdown("ok").unwrap(), "<p>ok</p>");
    }

    #[test]
    fn test_infallible_methods_ignore_input_limit() {
        let options = ConverterOptions {
            max_input_len: 4,
            ..Default::default()
        };
        let converter = Converter::with_options(options);

        let html = r#"<p>long</p><script>alert(1)</script><img src=x onerror=alert(2)>"#;
        assert_eq!(converter.render_to_markdown(html), "long");
        assert_eq!(converter.parse_from_markdown("# long"), "<h1>long</h1>");
    }

    #[test]
    fn test_inputs_beyond_default_limit_are_converted() {
        let converter = Converter::new();

        let html = "<p>x</p>".repeat(DEFAULT_MAX_INPUT_LEN / 8 + 1)
            + "<script>alert(1)</script><img src=x onerror=alert(2)>";
        let markdown = converter.render_to_markdown(&html);
        assert!(markdown.starts_with("x\n\nx"));
        assert!(!markdown.contains("<script"));
        assert!(!markdown.contains("onerror"));

        let markdown = "word ".repeat(DEFAULT_MAX_INPUT_LEN / 5 + 1);
        let html = converter.parse_from_markdown(&markdown);
        assert!(html.starts_with("<p>word word"));
    }

    #[test]
    fn test_guarded_maps_panics() {
        let err = guarded(|| panic!("boom")).unwrap_err();
        assert_eq!(err.to_string(), "Conversion error: boom");
        assert_eq!(guarded(|| "fine".to_string()).unwrap(), "fine");
    }
}
