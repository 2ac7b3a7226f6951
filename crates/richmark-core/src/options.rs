//! Configuration options for Markdown serialization

/// Options for Markdown serialization.
///
/// The defaults produce the canonical dialect that `richmark`'s Markdown
/// parser reads back: ATX headings, `-` bullets, `_` emphasis and fenced code.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Horizontal rule string
    pub hr: String,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Fence string for fenced code blocks (grown when the code contains it)
    pub fence: String,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Strikethrough delimiter
    pub strike_delimiter: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hr: "---".to_string(),
            bullet_list_marker: '-',
            fence: "```".to_string(),
            em_delimiter: '_',
            strong_delimiter: "**".to_string(),
            strike_delimiter: "~~".to_string(),
        }
    }
}
