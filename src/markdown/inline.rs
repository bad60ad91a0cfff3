//! Inline span scanner
//!
//! Finds code spans, emphasis, bold, italic and links inside a paragraph.
//! Spans never cross a line break, never nest, and follow a simplified
//! flanking rule: the delimiter must not be followed (opening) or preceded
//! (closing) by whitespace, and `_` delimiters must not sit inside a word,
//! so `snake_case_name` stays plain.

use log::warn;
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

use super::token::TokenKind;

/// Alternatives are tried left to right at each position, so longer
/// delimiter runs must come before shorter ones.
const INLINE_PATTERN: &str = concat!(
    r"(?P<code>`[^`\n]+`)",
    r"|(?P<emphasis>\*\*\*[^*\n]+\*\*\*|___[^_\n]+___)",
    r"|(?P<bold>\*\*[^*\n]+\*\*|__[^_\n]+__)",
    r"|(?P<italic>\*[^*\n]+\*|_[^_\n]+_)",
    r"|(?P<link>\[[^\]\n]*\]\([^)\n]*\))",
);

static INLINE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn inline_regex() -> Option<&'static Regex> {
    INLINE_REGEX
        .get_or_init(|| {
            Regex::new(INLINE_PATTERN)
                .map_err(|e| warn!("Inline pattern failed to compile: {}", e))
                .ok()
        })
        .as_ref()
}

/// An inline span found by [`scan_inline`], in byte offsets of the full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

/// Scan `text[range]` for inline spans.
///
/// Returned ranges are byte offsets into `text`, ascending and
/// non-overlapping.
pub fn scan_inline(text: &str, range: Range<usize>) -> Vec<InlineSpan> {
    let Some(re) = inline_regex() else {
        return Vec::new();
    };
    let Some(segment) = text.get(range.clone()) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < segment.len() {
        let Some(caps) = re.captures(&segment[pos..]) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let start = pos + whole.start();
        let end = pos + whole.end();
        let kind = kind_of(&caps);

        if is_flanked(segment, start, end, kind) {
            spans.push(InlineSpan {
                kind,
                range: range.start + start..range.start + end,
            });
            pos = end;
        } else {
            // Retry one character further on
            pos = start + segment[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    spans
}

fn kind_of(caps: &Captures<'_>) -> TokenKind {
    if caps.name("code").is_some() {
        TokenKind::Code
    } else if caps.name("emphasis").is_some() {
        TokenKind::Emphasis
    } else if caps.name("bold").is_some() {
        TokenKind::Bold
    } else if caps.name("italic").is_some() {
        TokenKind::Italic
    } else {
        TokenKind::Link
    }
}

/// Delimiter width for the emphasis kinds.
fn delimiter_width(kind: TokenKind) -> usize {
    match kind {
        TokenKind::Emphasis => 3,
        TokenKind::Bold => 2,
        TokenKind::Italic => 1,
        _ => 0,
    }
}

fn is_flanked(segment: &str, start: usize, end: usize, kind: TokenKind) -> bool {
    let width = delimiter_width(kind);
    if width == 0 {
        return true;
    }
    let matched = &segment[start..end];
    let inner = &matched[width..matched.len() - width];
    if inner.starts_with(char::is_whitespace) || inner.ends_with(char::is_whitespace) {
        return false;
    }
    if matched.starts_with('_') {
        let before = segment[..start].chars().next_back();
        let after = segment[end..].chars().next();
        if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
            return false;
        }
    }
    true
}

/// Link target of a `[text](url)` token, if it has one.
pub fn link_target(contents: &str) -> Option<&str> {
    let open = contents.find("](")?;
    let target = contents[open + 2..].strip_suffix(')')?;
    let target = target.trim();
    (!target.is_empty()).then_some(target)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
