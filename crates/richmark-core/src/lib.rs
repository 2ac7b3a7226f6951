//! richmark-core - Markdown AST and serialization
//!
//! This crate provides the core data structures and serialization for the
//! Markdown dialect richmark persists. It is used by `richmark` to turn
//! sanitized editor HTML into canonical Markdown.
//!
//! # Architecture
//!
//! ```text
//! Editor HTML ──sanitize──▶ SafeNode tree ──lower──▶ ┌──────────────┐
//!                                                    │ Markdown AST │ ──▶ Markdown String
//!                                                    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use richmark_core::{Block, Inline, Options, serialize};
//!
//! let ast = Block::Document(vec![
//!     Block::Heading {
//!         level: 1,
//!         content: vec![Inline::Text("Hello World".to_string())],
//!     },
//!     Block::Paragraph(vec![
//!         Inline::Text("This is ".to_string()),
//!         Inline::Strong(vec![Inline::Text("bold".to_string())]),
//!         Inline::Text(" text.".to_string()),
//!     ]),
//! ]);
//!
//! let markdown = serialize(&ast, &Options::default());
//! assert_eq!(markdown, "# Hello World\n\nThis is **bold** text.");
//! ```

mod ast;
mod options;
mod serialize;

pub use ast::{inlines_are_blank, Block, Inline, ListItem};
pub use options::Options;
pub use serialize::serialize;
