//! The fixed allow-list and the policies that narrow it.

use indexmap::IndexSet;

/// Every element the sanitizer can ever emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    P,
    Br,
    Strong,
    Em,
    U,
    Del,
    S,
    Strike,
    Code,
    Pre,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Blockquote,
    A,
    Img,
    Hr,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
}

impl Tag {
    pub const ALL: [Tag; 29] = [
        Tag::P,
        Tag::Br,
        Tag::Strong,
        Tag::Em,
        Tag::U,
        Tag::Del,
        Tag::S,
        Tag::Strike,
        Tag::Code,
        Tag::Pre,
        Tag::H1,
        Tag::H2,
        Tag::H3,
        Tag::H4,
        Tag::H5,
        Tag::H6,
        Tag::Ul,
        Tag::Ol,
        Tag::Li,
        Tag::Blockquote,
        Tag::A,
        Tag::Img,
        Tag::Hr,
        Tag::Table,
        Tag::Thead,
        Tag::Tbody,
        Tag::Tr,
        Tag::Th,
        Tag::Td,
    ];

    /// Look up an allowed tag by (case-insensitive) name
    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::P => "p",
            Tag::Br => "br",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::U => "u",
            Tag::Del => "del",
            Tag::S => "s",
            Tag::Strike => "strike",
            Tag::Code => "code",
            Tag::Pre => "pre",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Blockquote => "blockquote",
            Tag::A => "a",
            Tag::Img => "img",
            Tag::Hr => "hr",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Th => "th",
            Tag::Td => "td",
        }
    }

    /// Elements written without an end tag
    pub fn is_void(self) -> bool {
        matches!(self, Tag::Br | Tag::Img | Tag::Hr)
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::H4 => Some(4),
            Tag::H5 => Some(5),
            Tag::H6 => Some(6),
            _ => None,
        }
    }

    /// Table parts, passed through to Markdown as HTML
    pub fn is_table_part(self) -> bool {
        matches!(
            self,
            Tag::Table | Tag::Thead | Tag::Tbody | Tag::Tr | Tag::Th | Tag::Td
        )
    }
}

/// Every attribute the sanitizer can ever emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Href,
    Src,
    Alt,
    Class,
    DataType,
    DataChecked,
}

impl Attr {
    pub const ALL: [Attr; 6] = [
        Attr::Href,
        Attr::Src,
        Attr::Alt,
        Attr::Class,
        Attr::DataType,
        Attr::DataChecked,
    ];

    pub fn from_name(name: &str) -> Option<Attr> {
        Attr::ALL
            .iter()
            .copied()
            .find(|attr| attr.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Attr::Href => "href",
            Attr::Src => "src",
            Attr::Alt => "alt",
            Attr::Class => "class",
            Attr::DataType => "data-type",
            Attr::DataChecked => "data-checked",
        }
    }
}

/// The tags and attributes a sanitizer pass keeps.
///
/// A policy can only narrow the fixed allow-list: [`Tag`] and [`Attr`] have
/// no variant for anything outside it.
///
/// ```rust
/// use richmark::{AllowListPolicy, Tag};
///
/// let policy = AllowListPolicy::default().deny_tag(Tag::Img);
/// assert!(!policy.allows_tag(Tag::Img));
/// assert!(policy.allows_tag(Tag::P));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListPolicy {
    tags: IndexSet<Tag>,
    attrs: IndexSet<Attr>,
}

impl Default for AllowListPolicy {
    fn default() -> Self {
        Self {
            tags: Tag::ALL.into_iter().collect(),
            attrs: Attr::ALL.into_iter().collect(),
        }
    }
}

impl AllowListPolicy {
    /// A policy that keeps text only
    pub fn empty() -> Self {
        Self {
            tags: IndexSet::new(),
            attrs: IndexSet::new(),
        }
    }

    pub fn allow_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn deny_tag(mut self, tag: Tag) -> Self {
        self.tags.shift_remove(&tag);
        self
    }

    pub fn allow_attr(mut self, attr: Attr) -> Self {
        self.attrs.insert(attr);
        self
    }

    pub fn deny_attr(mut self, attr: Attr) -> Self {
        self.attrs.shift_remove(&attr);
        self
    }

    pub fn allows_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn allows_attr(&self, attr: Attr) -> bool {
        self.attrs.contains(&attr)
    }

    /// Allowed tags, in insertion order
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }
}
