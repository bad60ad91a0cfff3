//! nana-render
//!
//! Incremental markdown rendering for the Nana notes editor: a tokenizer
//! producing position-tagged markdown tokens, a token diff that confines
//! restyling to what an edit touched, and a synchronizer that keeps the
//! saved markdown (source) and the edited text with hidden header markers
//! (display) in step.

pub mod config;
pub mod editor;
pub mod error;
pub mod markdown;
pub mod string_utils;
pub mod theme;

pub use editor::{SelectionRange, SyncOutcome, Synchronizer};
pub use error::{Error, Result};
pub use markdown::{MarkdownTokenizer, Token, TokenKind, TokenStream, Tokenizer};
