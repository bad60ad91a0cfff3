//! Tokenizer adapter
//!
//! Turns raw markdown into a [`TokenStream`] that tiles the whole text.
//! [`MarkdownTokenizer`] derives tokens from comrak's block structure plus the
//! inline scanner; [`normalize_tokens`] is shared with the external adapter
//! and is the single place where untrusted token lists are checked against
//! the text they claim to describe.
//!
//! Tokenizers never fail: anything unusable degrades to fewer tokens, and
//! in the worst case to an empty stream (the text renders unstyled).

use log::{trace, warn};
use std::ops::Range;

use super::inline::scan_inline;
use super::parser::{parse_blocks, Block, BlockKind, MarkdownOptions};
use super::token::{rendered_header, Token, TokenKind, TokenStream};
use crate::error::Error;
use crate::string_utils::{
    ceil_boundary, floor_boundary, floor_char_boundary, grapheme_boundaries, line_byte_ranges,
    scalar_len, ScalarIndex,
};

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Something that can segment markdown text into tokens.
///
/// Implementations must return tokens in ascending, non-overlapping order;
/// an empty stream means "no formatting".
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> TokenStream;
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize(&self, text: &str) -> TokenStream {
        (**self).tokenize(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

/// Tokenizer backed by comrak for blocks and a regex scanner for inline spans.
#[derive(Debug, Clone, Default)]
pub struct MarkdownTokenizer {
    options: MarkdownOptions,
}

impl MarkdownTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl Tokenizer for MarkdownTokenizer {
    fn tokenize(&self, text: &str) -> TokenStream {
        if text.is_empty() {
            return TokenStream::empty();
        }

        let blocks = parse_blocks(text, &self.options);
        let lines = line_byte_ranges(text);
        let mut raw = Vec::new();
        for block in &blocks {
            block_spans(text, &lines, block, &mut raw);
        }

        let index = ScalarIndex::new(text);
        let tokens = raw
            .into_iter()
            .map(|span| {
                let start = index.scalar_of(span.bytes.start);
                Token::new(span.kind, start, &text[span.bytes], span.degree)
            })
            .collect();

        let stream = normalize_tokens(text, tokens);
        trace!("Tokenized {} blocks into {} tokens", blocks.len(), stream.len());
        stream
    }
}

/// A styled span in byte offsets, before conversion to a token.
struct RawSpan {
    kind: TokenKind,
    bytes: Range<usize>,
    degree: u8,
}

/// Byte offset of a 1-based line/column position, clamped to the line.
fn position_byte(text: &str, lines: &[Range<usize>], line: usize, column: usize) -> Option<usize> {
    let range = lines.get(line.checked_sub(1)?)?;
    let byte = (range.start + column.saturating_sub(1)).min(range.end);
    Some(floor_char_boundary(text, byte))
}

/// Byte offset of the end of a 1-based line, excluding its newline.
fn line_end_byte(lines: &[Range<usize>], line: usize) -> Option<usize> {
    let last = lines.len();
    lines.get(line.clamp(1, last) - 1).map(|r| r.end)
}

fn block_spans(text: &str, lines: &[Range<usize>], block: &Block, out: &mut Vec<RawSpan>) {
    let Some(start) = position_byte(text, lines, block.start_line, block.start_column) else {
        return;
    };
    let Some(end) = line_end_byte(lines, block.end_line) else {
        return;
    };
    if end <= start {
        return;
    }
    let end = trim_blank_tail(text, start, end);
    // Indented code keeps its indent inside the block
    let start = match block.kind {
        BlockKind::CodeBlock => indent_start(text, start),
        _ => start,
    };
    if end <= start {
        return;
    }

    let whole = |kind, degree| RawSpan {
        kind,
        bytes: start..end,
        degree,
    };

    match block.kind {
        BlockKind::Heading { level, .. } => out.push(whole(TokenKind::Header, level)),
        BlockKind::BlockQuote => out.push(whole(TokenKind::Quote, 1)),
        BlockKind::CodeBlock => out.push(whole(TokenKind::BlockCode, 0)),
        BlockKind::ThematicBreak => out.push(whole(TokenKind::HorizontalRule, 0)),
        BlockKind::ListItem { ordered, depth } => {
            let line_end = line_end_byte(lines, block.start_line).unwrap_or(start);
            let marker = list_marker_len(&text[start..line_end.max(start)]);
            if marker > 0 {
                let kind = if ordered {
                    TokenKind::OrderedList
                } else {
                    TokenKind::UnorderedList
                };
                out.push(RawSpan {
                    kind,
                    bytes: start..start + marker,
                    degree: depth,
                });
            }
        }
        BlockKind::Paragraph => {
            out.extend(scan_inline(text, start..end).into_iter().map(|span| RawSpan {
                kind: span.kind,
                bytes: span.range,
                degree: 0,
            }));
        }
    }
}

/// Pull `end` back over trailing blank lines and a final `\r`.
///
/// comrak can report a leaf block as ending on the blank line after it.
fn trim_blank_tail(text: &str, start: usize, mut end: usize) -> usize {
    while let Some(nl) = text[start..end].rfind('\n') {
        if !text[start + nl + 1..end].trim().is_empty() {
            break;
        }
        end = start + nl;
    }
    if text[start..end].ends_with('\r') {
        end -= 1;
    }
    end
}

/// Start of the line holding `start` when only blanks precede it there.
fn indent_start(text: &str, start: usize) -> usize {
    let line_start = text[..start].rfind('\n').map_or(0, |nl| nl + 1);
    if text[line_start..start].bytes().all(|b| b == b' ' || b == b'\t') {
        line_start
    } else {
        start
    }
}

/// Byte length of a list marker (`-`, `*`, `+`, `1.`, `2)`) and the blanks after it.
fn list_marker_len(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut len = match bytes.first() {
        Some(b'-' | b'*' | b'+') => 1,
        Some(b) if b.is_ascii_digit() => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            match bytes.get(digits) {
                Some(b'.' | b')') => digits + 1,
                _ => return 0,
            }
        }
        _ => return 0,
    };
    len += bytes[len..]
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    len
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Check `tokens` against `text` and produce a stream that tiles it exactly.
///
/// Tokens are sorted by start. Empty tokens, tokens reaching past the end of
/// the text, tokens overlapping an earlier one and tokens whose `contents`
/// disagree with the text are dropped and logged. Token edges inside a
/// grapheme cluster are widened to the cluster's boundaries, so a combining
/// mark stays with the character it modifies. Header `rendered` forms are
/// recomputed and every gap becomes a `Plain` token.
pub fn normalize_tokens(text: &str, mut tokens: Vec<Token>) -> TokenStream {
    let len = scalar_len(text);
    if len == 0 {
        return TokenStream::empty();
    }

    let index = ScalarIndex::new(text);
    let slice = |range: Range<usize>| &text[index.byte_of(range.start)..index.byte_of(range.end)];
    let bounds = grapheme_boundaries(text);

    tokens.sort_by_key(|t| (t.start, t.end));

    let mut out = Vec::with_capacity(tokens.len() * 2 + 1);
    let mut pos = 0;
    // End of the last kept token before widening, for overlap checks
    let mut raw_end = 0;
    for mut token in tokens {
        if token.end <= token.start {
            continue;
        }
        if token.end > len || token.start < raw_end {
            warn!(
                "Skipping {:?} token: {}",
                token.kind,
                Error::RangeInconsistency {
                    range: token.range(),
                    len
                }
            );
            continue;
        }
        if slice(token.range()) != token.contents {
            warn!(
                "Skipping {:?} token at {}..{}: contents do not match the text",
                token.kind, token.start, token.end
            );
            continue;
        }
        let start = floor_boundary(&bounds, token.start).max(pos);
        let end = ceil_boundary(&bounds, token.end);
        if end <= start {
            // Swallowed by the previous token's widened cluster
            continue;
        }
        raw_end = token.end;
        if (start, end) != (token.start, token.end) {
            trace!(
                "Widening {:?} token {}..{} to grapheme boundaries {}..{}",
                token.kind,
                token.start,
                token.end,
                start,
                end
            );
            token.start = start;
            token.end = end;
            token.contents = slice(start..end).to_string();
        }
        if token.start > pos {
            out.push(Token::plain(pos, slice(pos..token.start)));
        }
        token.rendered = if token.kind == TokenKind::Header {
            rendered_header(&token.contents)
        } else {
            String::new()
        };
        if token.kind == TokenKind::Header {
            token.degree = token.degree.clamp(1, 6);
        }
        pos = token.end;
        out.push(token);
    }
    if pos < len {
        out.push(Token::plain(pos, slice(pos..len)));
    }

    TokenStream::new(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(text: &str) -> TokenStream {
        MarkdownTokenizer::new().tokenize(text)
    }

    fn summary(stream: &TokenStream) -> Vec<(TokenKind, &str)> {
        stream
            .iter()
            .map(|t| (t.kind, t.contents.as_str()))
            .collect()
    }

    #[test]
    fn test_empty_text_has_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_header_then_paragraph() {
        let stream = tokenize("# Title\n\nplain text");
        assert_eq!(
            summary(&stream),
            vec![
                (TokenKind::Header, "# Title"),
                (TokenKind::Plain, "\n\nplain text"),
            ]
        );
        assert_eq!(stream.tokens()[0].range(), 0..7);
        assert_eq!(stream.tokens()[0].rendered, "Title");
        assert_eq!(stream.tokens()[0].degree, 1);
        assert!(stream.covers(19));
    }

    #[test]
    fn test_bold_and_italic_in_plain_context() {
        let stream = tokenize("Some **bold** and *italic* text.");
        assert_eq!(
            summary(&stream),
            vec![
                (TokenKind::Plain, "Some "),
                (TokenKind::Bold, "**bold**"),
                (TokenKind::Plain, " and "),
                (TokenKind::Italic, "*italic*"),
                (TokenKind::Plain, " text."),
            ]
        );
    }

    #[test]
    fn test_quote_and_code_block() {
        let text = "> quoted\n\n```\nlet x = 1;\n```\nafter";
        let stream = tokenize(text);
        let quote = &stream.tokens()[0];
        assert_eq!(quote.kind, TokenKind::Quote);
        assert_eq!(quote.contents, "> quoted");

        let code = stream
            .iter()
            .find(|t| t.kind == TokenKind::BlockCode)
            .unwrap();
        assert_eq!(code.contents, "```\nlet x = 1;\n```");
        assert!(stream.covers(scalar_len(text)));
    }

    #[test]
    fn test_list_markers_carry_depth() {
        let stream = tokenize("- one\n  - *two*\n1. three");
        let markers: Vec<_> = stream
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::UnorderedList | TokenKind::OrderedList))
            .map(|t| (t.kind, t.contents.as_str(), t.degree))
            .collect();
        assert_eq!(
            markers,
            vec![
                (TokenKind::UnorderedList, "- ", 1),
                (TokenKind::UnorderedList, "- ", 2),
                (TokenKind::OrderedList, "1. ", 1),
            ]
        );
        assert!(stream
            .iter()
            .any(|t| t.kind == TokenKind::Italic && t.contents == "*two*"));
    }

    #[test]
    fn test_horizontal_rule() {
        let stream = tokenize("a\n\n---\n\nb");
        assert_eq!(
            summary(&stream),
            vec![
                (TokenKind::Plain, "a\n\n"),
                (TokenKind::HorizontalRule, "---"),
                (TokenKind::Plain, "\n\nb"),
            ]
        );
    }

    #[test]
    fn test_indented_code_block_keeps_indent_and_stops_at_blank_line() {
        let stream = tokenize("    code\n\n**b**");
        assert_eq!(
            summary(&stream),
            vec![
                (TokenKind::BlockCode, "    code"),
                (TokenKind::Plain, "\n\n"),
                (TokenKind::Bold, "**b**"),
            ]
        );
    }

    #[test]
    fn test_fenced_code_block_followed_by_blank_line() {
        let stream = tokenize("```\nx\n```\n\ntext");
        assert_eq!(
            summary(&stream),
            vec![
                (TokenKind::BlockCode, "```\nx\n```"),
                (TokenKind::Plain, "\n\ntext"),
            ]
        );
    }

    #[test]
    fn test_crlf_header_excludes_line_break() {
        let stream = tokenize("# A\r\nb");
        assert_eq!(
            summary(&stream),
            vec![(TokenKind::Header, "# A"), (TokenKind::Plain, "\r\nb")]
        );
        assert_eq!(stream.tokens()[0].rendered, "A");
    }

    #[test]
    fn test_combining_mark_stays_with_its_base() {
        let stream = tokenize("*a*\u{301} x");
        assert_eq!(
            summary(&stream),
            vec![(TokenKind::Italic, "*a*\u{301}"), (TokenKind::Plain, " x")]
        );
        assert_eq!(stream.tokens()[0].range(), 0..4);
    }

    #[test]
    fn test_tables_option_controls_inline_scanning() {
        let text = "| **a** |\n|---|";
        let with_tables = tokenize(text);
        assert!(with_tables.iter().all(|t| t.kind == TokenKind::Plain));

        let without_tables = MarkdownTokenizer::with_options(MarkdownOptions {
            tables: false,
            ..MarkdownOptions::default()
        })
        .tokenize(text);
        assert!(without_tables
            .iter()
            .any(|t| t.kind == TokenKind::Bold && t.contents == "**a**"));
    }

    #[test]
    fn test_setext_header_has_no_rendered_form() {
        let stream = tokenize("Title\n=====");
        assert_eq!(stream.tokens()[0].kind, TokenKind::Header);
        assert_eq!(stream.tokens()[0].contents, "Title\n=====");
        assert!(!stream.tokens()[0].has_rendered_form());
    }

    #[test]
    fn test_offsets_are_scalars_not_bytes() {
        let stream = tokenize("på **fet**");
        let bold = &stream.tokens()[1];
        assert_eq!(bold.kind, TokenKind::Bold);
        assert_eq!(bold.range(), 3..10);
    }

    #[test]
    fn test_list_marker_len() {
        assert_eq!(list_marker_len("- item"), 2);
        assert_eq!(list_marker_len("12. item"), 4);
        assert_eq!(list_marker_len("3)\titem"), 3);
        assert_eq!(list_marker_len("-"), 1);
        assert_eq!(list_marker_len("x item"), 0);
        assert_eq!(list_marker_len("12 item"), 0);
    }

    /// Deterministic stand-in for a property test: every combination of
    /// three fragments must be tiled exactly.
    #[test]
    fn test_coverage_over_generated_inputs() {
        let fragments = [
            "# Head",
            "## Sub **b**",
            "plain words",
            "**bold**",
            "*it*",
            "`code`",
            "> quote",
            "```\nfence\n```",
            "- item",
            "1. first",
            "---",
            "[l](u)",
            "på 🎉",
            "",
            "***",
            "_x_y_",
        ];
        let separators = ["\n", "\n\n", " "];
        for a in fragments {
            for b in fragments {
                for c in fragments {
                    for sep in separators {
                        let text = format!("{a}{sep}{b}{sep}{c}");
                        let stream = tokenize(&text);
                        assert!(
                            stream.covers(scalar_len(&text)),
                            "not covered: {:?} -> {:?}",
                            text,
                            stream
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_normalize_fills_gaps() {
        let text = "ab **c**";
        let stream = normalize_tokens(text, vec![Token::new(TokenKind::Bold, 3, "**c**", 0)]);
        assert_eq!(
            summary(&stream),
            vec![(TokenKind::Plain, "ab "), (TokenKind::Bold, "**c**")]
        );
    }

    #[test]
    fn test_normalize_skips_out_of_bounds_and_overlaps() {
        let text = "abcdef";
        let tokens = vec![
            Token::new(TokenKind::Code, 4, "efgh", 0),
            Token::new(TokenKind::Bold, 0, "abc", 0),
            Token::new(TokenKind::Italic, 2, "cd", 0),
        ];
        let stream = normalize_tokens(text, tokens);
        assert_eq!(
            summary(&stream),
            vec![(TokenKind::Bold, "abc"), (TokenKind::Plain, "def")]
        );
    }

    #[test]
    fn test_normalize_skips_mismatched_contents() {
        let stream = normalize_tokens("# A", vec![Token::new(TokenKind::Header, 0, "# B", 1)]);
        assert_eq!(summary(&stream), vec![(TokenKind::Plain, "# A")]);
    }

    #[test]
    fn test_normalize_recomputes_rendered_and_clamps_level() {
        let mut token = Token::new(TokenKind::Header, 0, "# A", 9);
        token.rendered = "bogus".to_string();
        let stream = normalize_tokens("# A", vec![token]);
        assert_eq!(stream.tokens()[0].rendered, "A");
        assert_eq!(stream.tokens()[0].degree, 6);
    }

    #[test]
    fn test_normalize_widens_tokens_to_grapheme_boundaries() {
        let text = "ab\u{301}c";
        let tokens = vec![Token::new(TokenKind::Italic, 2, "\u{301}c", 0)];
        let stream = normalize_tokens(text, tokens);
        assert_eq!(
            summary(&stream),
            vec![(TokenKind::Plain, "a"), (TokenKind::Italic, "b\u{301}c")]
        );
        assert!(stream.covers(4));
    }

    #[test]
    fn test_normalize_keeps_neighbour_after_widened_token() {
        // "e" + U+0301 is one cluster; the bold token ends inside it
        let text = "e\u{301}x";
        let tokens = vec![
            Token::new(TokenKind::Bold, 0, "e", 0),
            Token::new(TokenKind::Italic, 2, "x", 0),
        ];
        let stream = normalize_tokens(text, tokens);
        assert_eq!(
            summary(&stream),
            vec![(TokenKind::Bold, "e\u{301}"), (TokenKind::Italic, "x")]
        );
    }
}
