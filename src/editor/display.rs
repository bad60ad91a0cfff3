//! Source/display mapping
//!
//! The display text is the source text with the `#` markers of headers
//! removed, except on lines the selection touches. Building it yields three
//! things that always agree with each other:
//!
//! - the display text itself
//! - a token stream in display coordinates (what the painter styles)
//! - a [`DisplayMap`] with one [`Segment`] per source token, used to move
//!   offsets between the two buffers
//!
//! Line indices are the same in both buffers because only markers inside a
//! single line are ever hidden.

use log::warn;
use std::ops::Range;

use super::selection::SelectedLines;
use crate::error::Error;
use crate::markdown::{Token, TokenStream};
use crate::string_utils::{newline_count, scalar_len, scalar_slice};

// ─────────────────────────────────────────────────────────────────────────────
// Segments
// ─────────────────────────────────────────────────────────────────────────────

/// How one source token appears in the display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub source: Range<usize>,
    pub display: Range<usize>,
    /// Leading source scalars not shown (0 when the token is shown raw)
    pub hidden: usize,
}

impl Segment {
    pub fn is_rendered(&self) -> bool {
        self.hidden > 0
    }
}

/// Which side an offset on a segment boundary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Prefer the segment ending at the offset
    Left,
    /// Prefer the segment starting at the offset
    Right,
}

/// Offset translation between the source and display buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayMap {
    segments: Vec<Segment>,
    source_len: usize,
    display_len: usize,
}

impl DisplayMap {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn display_len(&self) -> usize {
        self.display_len
    }

    /// Whether source and display offsets coincide everywhere.
    pub fn is_identity(&self) -> bool {
        self.segments.iter().all(|seg| !seg.is_rendered())
    }

    /// Source offset of display offset `offset`.
    ///
    /// Inside a rendered header the hidden markers are skipped, so the
    /// offset lands after them. At the very start of a rendered header,
    /// [`Bias::Left`] lands before the markers instead.
    pub fn to_source(&self, offset: usize, bias: Bias) -> usize {
        let offset = offset.min(self.display_len);
        let segment = match bias {
            Bias::Right => self
                .segments
                .iter()
                .rev()
                .find(|seg| seg.display.start <= offset),
            Bias::Left => self.segments.iter().find(|seg| seg.display.end >= offset),
        };
        let Some(seg) = segment else {
            return offset.min(self.source_len);
        };
        if bias == Bias::Left && offset == seg.display.start {
            return seg.source.start;
        }
        (seg.source.start + seg.hidden + (offset - seg.display.start)).min(seg.source.end)
    }

    /// Display offset of source offset `offset`. Offsets inside hidden
    /// markers map to the start of the rendered text.
    pub fn to_display(&self, offset: usize) -> usize {
        let offset = offset.min(self.source_len);
        let idx = self
            .segments
            .partition_point(|seg| seg.source.end <= offset)
            .min(self.segments.len().saturating_sub(1));
        let Some(seg) = self.segments.get(idx) else {
            return offset.min(self.display_len);
        };
        let within = offset.saturating_sub(seg.source.start);
        if within < seg.hidden {
            seg.display.start
        } else {
            (seg.display.start + within - seg.hidden).min(seg.display.end)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Everything derived from one source text and its tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayBuffer {
    pub text: String,
    /// Tokens in display coordinates; contents are the displayed text
    pub tokens: TokenStream,
    pub map: DisplayMap,
}

/// Whether `token`, starting on `line`, is shown without its markers.
fn shows_rendered(token: &Token, line: usize, selected: &SelectedLines, render_headers: bool) -> bool {
    render_headers && token.has_rendered_form() && !selected.contains(line)
}

/// Build the display text for `source`.
///
/// A token stream that does not tile the source (a tokenizer bug, or the
/// empty stream of a parse failure) leaves the display equal to the source.
pub fn build_display(
    source: &str,
    tokens: &TokenStream,
    selected: &SelectedLines,
    render_headers: bool,
) -> DisplayBuffer {
    let source_len = scalar_len(source);
    if !tokens.covers(source_len) {
        if !tokens.is_empty() {
            warn!(
                "Token stream does not cover the text, showing it raw: {}",
                Error::RangeInconsistency {
                    range: 0..tokens.end(),
                    len: source_len,
                }
            );
        }
        return raw_display(source, source_len);
    }

    let mut text = String::with_capacity(source.len());
    let mut display_tokens = Vec::with_capacity(tokens.len());
    let mut segments = Vec::with_capacity(tokens.len());
    let mut line = 0;
    let mut pos = 0;

    for token in tokens {
        let (shown, hidden) = if shows_rendered(token, line, selected, render_headers) {
            (token.rendered.as_str(), token.len() - scalar_len(&token.rendered))
        } else {
            (token.contents.as_str(), 0)
        };
        let shown_len = token.len() - hidden;

        text.push_str(shown);
        display_tokens.push(Token {
            kind: token.kind,
            start: pos,
            end: pos + shown_len,
            contents: shown.to_string(),
            degree: token.degree,
            rendered: if hidden > 0 {
                String::new()
            } else {
                token.rendered.clone()
            },
        });
        segments.push(Segment {
            source: token.range(),
            display: pos..pos + shown_len,
            hidden,
        });

        pos += shown_len;
        line += newline_count(&token.contents);
    }

    DisplayBuffer {
        text,
        tokens: TokenStream::new(display_tokens),
        map: DisplayMap {
            segments,
            source_len,
            display_len: pos,
        },
    }
}

fn raw_display(source: &str, len: usize) -> DisplayBuffer {
    let segments = if len > 0 {
        vec![Segment {
            source: 0..len,
            display: 0..len,
            hidden: 0,
        }]
    } else {
        Vec::new()
    };
    DisplayBuffer {
        text: source.to_string(),
        tokens: TokenStream::empty(),
        map: DisplayMap {
            segments,
            source_len: len,
            display_len: len,
        },
    }
}

/// Splice `inserted` into `source`, replacing the scalar range `range`.
pub fn splice_text(source: &str, range: Range<usize>, inserted: &str) -> String {
    let len = scalar_len(source);
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);
    let mut out = String::with_capacity(source.len() + inserted.len());
    out.push_str(scalar_slice(source, 0..start));
    out.push_str(inserted);
    out.push_str(scalar_slice(source, end..len));
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{MarkdownTokenizer, TokenKind, Tokenizer};

    fn build(source: &str, selected: &[usize]) -> DisplayBuffer {
        let tokens = MarkdownTokenizer::new().tokenize(source);
        let selected: SelectedLines = selected.iter().copied().collect();
        build_display(source, &tokens, &selected, true)
    }

    #[test]
    fn test_header_rendered_when_not_selected() {
        assert_eq!(build("# Hello", &[]).text, "Hello");
        assert_eq!(build("# Hello", &[0]).text, "# Hello");
    }

    #[test]
    fn test_only_unselected_lines_render() {
        let source = "# One\n## Two\nbody";
        assert_eq!(build(source, &[1]).text, "One\n## Two\nbody");
        assert_eq!(build(source, &[0]).text, "# One\nTwo\nbody");
        assert_eq!(build(source, &[2]).text, "One\nTwo\nbody");
    }

    #[test]
    fn test_render_headers_off_keeps_source() {
        let source = "# One\nbody";
        let tokens = MarkdownTokenizer::new().tokenize(source);
        let buffer = build_display(source, &tokens, &SelectedLines::new(), false);
        assert_eq!(buffer.text, source);
        assert!(buffer.map.is_identity());
    }

    #[test]
    fn test_display_tokens_tile_display_text() {
        let buffer = build("# Title\n\nsome **bold** text\n## Sub", &[]);
        assert!(buffer.tokens.covers(scalar_len(&buffer.text)));
        let header = &buffer.tokens.tokens()[0];
        assert_eq!(header.kind, TokenKind::Header);
        assert_eq!(header.contents, "Title");
        assert_eq!(header.range(), 0..5);
    }

    #[test]
    fn test_setext_header_never_renders() {
        let buffer = build("Title\n=====", &[]);
        assert_eq!(buffer.text, "Title\n=====");
    }

    #[test]
    fn test_empty_source() {
        let buffer = build("", &[]);
        assert_eq!(buffer.text, "");
        assert!(buffer.tokens.is_empty());
        assert_eq!(buffer.map.to_source(0, Bias::Right), 0);
        assert_eq!(buffer.map.to_display(0), 0);
    }

    #[test]
    fn test_uncovered_tokens_show_raw() {
        let tokens = TokenStream::new(vec![Token::new(TokenKind::Header, 0, "# A", 1)]);
        let buffer = build_display("# A\nmore", &tokens, &SelectedLines::new(), true);
        assert_eq!(buffer.text, "# A\nmore");
        assert!(buffer.tokens.is_empty());
        assert_eq!(buffer.map.to_source(3, Bias::Left), 3);
    }

    #[test]
    fn test_to_source_skips_hidden_markers() {
        let map = build("a\n## Head\nz", &[]).map;
        // Display: "a\nHead\nz"
        assert_eq!(map.to_source(1, Bias::Right), 1);
        assert_eq!(map.to_source(2, Bias::Right), 5);
        assert_eq!(map.to_source(2, Bias::Left), 2);
        assert_eq!(map.to_source(4, Bias::Left), 7);
        assert_eq!(map.to_source(6, Bias::Left), 9);
        assert_eq!(map.to_source(6, Bias::Right), 9);
        assert_eq!(map.to_source(8, Bias::Right), 11);
    }

    #[test]
    fn test_to_display_collapses_markers() {
        let map = build("a\n## Head\nz", &[]).map;
        assert_eq!(map.to_display(1), 1);
        assert_eq!(map.to_display(2), 2);
        assert_eq!(map.to_display(4), 2);
        assert_eq!(map.to_display(5), 2);
        assert_eq!(map.to_display(7), 4);
        assert_eq!(map.to_display(11), 8);
        assert_eq!(map.to_display(99), 8);
    }

    #[test]
    fn test_roundtrip_outside_markers() {
        let source = "# T\ntext with **bold**\n### Deep";
        let map = build(source, &[]).map;
        for display in 0..=map.display_len() {
            let src = map.to_source(display, Bias::Right);
            assert_eq!(map.to_display(src), display);
        }
    }

    #[test]
    fn test_splice_text() {
        assert_eq!(splice_text("# Hello", 3..7, "i"), "# Hi");
        assert_eq!(splice_text("på deg", 3..3, "min "), "på min deg");
        assert_eq!(splice_text("abc", 2..99, ""), "ab");
    }
}
