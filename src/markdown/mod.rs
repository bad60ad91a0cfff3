//! Markdown tokenizing
//!
//! This module turns raw markdown into a flat, position-tagged
//! [`TokenStream`]: block structure comes from the comrak library, inline
//! spans from a small regex scanner, and output from the native Nana parser
//! can be plugged in through [`ExternalTokenizer`].
//!
//! # Example
//! ```ignore
//! use nana_render::markdown::{MarkdownTokenizer, Tokenizer, TokenKind};
//!
//! let stream = MarkdownTokenizer::new().tokenize("# Hello\n\nSome **bold** text.");
//! assert_eq!(stream.tokens()[0].kind, TokenKind::Header);
//! assert_eq!(stream.tokens()[0].rendered, "Hello");
//! ```

mod external;
mod inline;
mod parser;
mod token;
mod tokenizer;

pub use external::{decode_tokens, ExternalTokenizer};
pub use inline::link_target;
pub use parser::MarkdownOptions;
pub use token::{rendered_header, Token, TokenKind, TokenStream};
pub use tokenizer::{normalize_tokens, MarkdownTokenizer, Tokenizer};
