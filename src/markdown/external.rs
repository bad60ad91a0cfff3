//! Adapter for the native library's markdown parser
//!
//! The native Nana library exposes `parse_markdown(text) -> json`, returning
//! a JSON array of tokens or nothing at all. [`ExternalTokenizer`] wraps any
//! function with that shape, decodes its output and normalizes it against the
//! text. Missing or malformed output is a parse failure: it is logged and
//! the text is treated as unformatted.

use super::token::{Token, TokenStream};
use super::tokenizer::{normalize_tokens, Tokenizer};
use crate::error::{Error, Result, ResultExt};

/// Decode the native library's JSON token array.
pub fn decode_tokens(json: &str) -> Result<Vec<Token>> {
    serde_json::from_str(json).map_err(|e| Error::TokenDecode {
        message: e.to_string(),
        source: Some(e),
    })
}

/// Tokenizer that delegates to an external parse function.
pub struct ExternalTokenizer<F>
where
    F: Fn(&str) -> Option<String>,
{
    parse: F,
}

impl<F> ExternalTokenizer<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(parse: F) -> Self {
        Self { parse }
    }

    fn try_tokenize(&self, text: &str) -> Result<TokenStream> {
        let json = (self.parse)(text).ok_or_else(|| Error::TokenDecode {
            message: "parser returned no output".to_string(),
            source: None,
        })?;
        let tokens = decode_tokens(&json)?;
        Ok(normalize_tokens(text, tokens))
    }
}

impl<F> Tokenizer for ExternalTokenizer<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn tokenize(&self, text: &str) -> TokenStream {
        if text.is_empty() {
            return TokenStream::empty();
        }
        self.try_tokenize(text)
            .unwrap_or_warn_default(TokenStream::empty(), "External markdown parse failed")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
