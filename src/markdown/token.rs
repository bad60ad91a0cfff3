//! Markdown token types
//!
//! A [`Token`] is one typed span of source text. Tokens are produced in
//! ascending, non-overlapping order and, once normalized, cover the whole
//! text: gaps between styled spans are explicit `Plain` tokens.
//!
//! The serde representation matches the JSON emitted by the native Nana
//! library (`tType`, `startI`, `endI`, `contents`, `degree`), so token
//! streams can be exchanged with it and dumped by the CLI.

use serde::{Deserialize, Serialize};
use std::ops::Range;

// ─────────────────────────────────────────────────────────────────────────────
// Token Kind
// ─────────────────────────────────────────────────────────────────────────────

/// The lexical/structural kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// ATX or setext header; `degree` holds the level (1-6)
    Header,
    /// Unstyled text, including the newlines between blocks
    Plain,
    /// Block quote (`>`)
    Quote,
    /// Fenced or indented code block
    BlockCode,
    /// Inline code span
    Code,
    /// `**bold**` or `__bold__`
    Bold,
    /// `*italic*` or `_italic_`
    Italic,
    /// Bold and italic at once (`***both***`)
    Emphasis,
    /// Bullet list marker; `degree` holds the nesting depth
    UnorderedList,
    /// Numbered list marker; `degree` holds the nesting depth
    OrderedList,
    /// Thematic break (`---`)
    #[serde(rename = "HORZ_RULE")]
    HorizontalRule,
    /// `[text](url)`
    Link,
}

impl TokenKind {
    /// Whether the kind spans whole lines rather than a run inside a line.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            TokenKind::Header | TokenKind::Quote | TokenKind::BlockCode | TokenKind::HorizontalRule
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// One lexical/structural span of source text.
///
/// `start` and `end` are half-open offsets in Unicode scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "tType")]
    pub kind: TokenKind,
    #[serde(rename = "startI")]
    pub start: usize,
    #[serde(rename = "endI")]
    pub end: usize,
    /// Exact source text covered, delimiters included
    pub contents: String,
    #[serde(default)]
    pub degree: u8,
    /// Marker-stripped header text shown when the line is not being edited.
    /// Empty for every other kind.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rendered: String,
}

impl Token {
    /// Create a token; `rendered` is derived for headers.
    pub fn new(kind: TokenKind, start: usize, contents: impl Into<String>, degree: u8) -> Self {
        let contents = contents.into();
        let end = start + contents.chars().count();
        let rendered = if kind == TokenKind::Header {
            rendered_header(&contents)
        } else {
            String::new()
        };
        Self {
            kind,
            start,
            end,
            contents,
            degree,
            rendered,
        }
    }

    /// Shorthand for a plain run.
    pub fn plain(start: usize, contents: impl Into<String>) -> Self {
        Self::new(TokenKind::Plain, start, contents, 0)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Header level clamped to 1..=6, or `None` for non-header tokens.
    pub fn header_level(&self) -> Option<u8> {
        (self.kind == TokenKind::Header).then(|| self.degree.clamp(1, 6))
    }

    /// Whether this token can be shown in its rendered form.
    pub fn has_rendered_form(&self) -> bool {
        self.kind == TokenKind::Header && !self.rendered.is_empty()
    }

    /// The leading markup hidden by the rendered form (`"## "` for `"## Title"`).
    pub fn hidden_prefix(&self) -> &str {
        if !self.has_rendered_form() {
            return "";
        }
        let cut = self.contents.len().saturating_sub(self.rendered.len());
        self.contents.get(..cut).unwrap_or("")
    }

    /// Identity used by the diff engine: kind, degree and contents.
    /// Positions are compared separately.
    pub fn same_shape(&self, other: &Token) -> bool {
        self.kind == other.kind && self.degree == other.degree && self.contents == other.contents
    }
}

/// Strip leading `#` markers and the blanks after them.
///
/// The result is always a suffix of `contents`; setext headers (no leading
/// `#`) and headers with no text produce an empty string.
pub fn rendered_header(contents: &str) -> String {
    if !contents.starts_with('#') {
        return String::new();
    }
    contents
        .trim_start_matches('#')
        .trim_start_matches(&[' ', '\t'][..])
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Token Stream
// ─────────────────────────────────────────────────────────────────────────────

/// The ordered tokens produced by one parse pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// End offset of the last token, or 0 for an empty stream.
    pub fn end(&self) -> usize {
        self.tokens.last().map(|t| t.end).unwrap_or(0)
    }

    /// Whether the tokens tile `[0, len)` exactly, in order, with no gaps.
    pub fn covers(&self, len: usize) -> bool {
        let mut pos = 0;
        for token in &self.tokens {
            if token.start != pos || token.end <= token.start {
                return false;
            }
            pos = token.end;
        }
        pos == len
    }

    /// Indices of the tokens of a given kind.
    pub fn positions_of(&self, kind: TokenKind) -> Vec<usize> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn into_inner(self) -> Vec<Token> {
        self.tokens
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
