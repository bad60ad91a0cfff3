//! Token styling rules
//!
//! [`style_for`] maps a token to the attributes it adds on top of the base
//! text attributes. The painting helpers apply those patches to a
//! [`StyledSpans`] list, either for the whole text or for the neighbourhood
//! of a changed token range.

use std::ops::Range;

use egui::Color32;

use super::spans::{AttributePatch, FontSpec, StyledSpans, TextAttributes};
use crate::config::Settings;
use crate::markdown::{link_target, Token, TokenKind, TokenStream};
use crate::theme::Palette;

/// Font size multipliers for header levels 1 through 6.
pub const HEADER_SCALES: [f32; 6] = [1.714, 1.429, 1.214, 1.143, 1.071, 1.0];

/// Font size multiplier for fenced and indented code blocks.
pub const BLOCK_CODE_SCALE: f32 = 0.857;

/// Font size multiplier for inline code spans.
pub const CODE_SCALE: f32 = 0.929;

// ─────────────────────────────────────────────────────────────────────────────
// Style Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Inputs of the attribute mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub base_font_size: f32,
    pub palette: Palette,
    pub quote_indent: f32,
    /// Blend of the code background toward black (0.0 - 1.0)
    pub code_background_darken: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), false)
    }
}

impl StyleConfig {
    /// Derive the mapper inputs from user settings.
    ///
    /// `prefers_dark` resolves the system theme.
    pub fn from_settings(settings: &Settings, prefers_dark: bool) -> Self {
        Self {
            base_font_size: settings.font_size,
            palette: Palette::from_theme(settings.theme, prefers_dark),
            quote_indent: settings.quote_indent,
            code_background_darken: settings.code_background_darken,
        }
    }

    /// Attributes of unformatted text.
    pub fn base_attributes(&self) -> TextAttributes {
        TextAttributes::plain(self.base_font_size, self.palette.foreground)
    }

    pub fn code_background(&self) -> Color32 {
        self.palette.code_background(self.code_background_darken)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attribute Mapper
// ─────────────────────────────────────────────────────────────────────────────

/// Attributes a token adds to the base text attributes.
pub fn style_for(token: &Token, style: &StyleConfig) -> AttributePatch {
    let base = style.base_font_size;
    let palette = &style.palette;

    match token.kind {
        TokenKind::Header => {
            let level = token.header_level().unwrap_or(1);
            let scale = HEADER_SCALES[usize::from(level - 1)];
            AttributePatch {
                font: Some(FontSpec {
                    bold: true,
                    ..FontSpec::regular(base * scale)
                }),
                foreground: Some(palette.heading),
                ..Default::default()
            }
        }
        TokenKind::Quote => AttributePatch {
            foreground: Some(palette.secondary),
            indent: Some(style.quote_indent),
            ..Default::default()
        },
        TokenKind::BlockCode => AttributePatch {
            font: Some(FontSpec::monospace(base * BLOCK_CODE_SCALE)),
            background: Some(style.code_background()),
            ..Default::default()
        },
        TokenKind::Code => AttributePatch {
            font: Some(FontSpec::monospace(base * CODE_SCALE)),
            background: Some(style.code_background()),
            ..Default::default()
        },
        TokenKind::Bold | TokenKind::Italic | TokenKind::Emphasis => AttributePatch {
            font: Some(FontSpec {
                bold: token.kind != TokenKind::Italic,
                italic: token.kind != TokenKind::Bold,
                ..FontSpec::regular(base)
            }),
            ..Default::default()
        },
        TokenKind::Link => AttributePatch {
            foreground: Some(palette.link),
            underline: Some(true),
            link: link_target(&token.contents).map(str::to_string),
            ..Default::default()
        },
        TokenKind::UnorderedList | TokenKind::OrderedList => AttributePatch {
            foreground: Some(palette.list_marker),
            ..Default::default()
        },
        TokenKind::HorizontalRule => AttributePatch {
            foreground: Some(palette.muted),
            ..Default::default()
        },
        TokenKind::Plain => AttributePatch::default(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Painting
// ─────────────────────────────────────────────────────────────────────────────

fn intersect(a: Range<usize>, b: &Range<usize>) -> Range<usize> {
    let start = a.start.max(b.start);
    start..a.end.min(b.end).max(start)
}

/// Paint one token, restricted to `clip`.
///
/// Code blocks shade one extra character past their end (the trailing
/// newline) when it exists; only the background extends.
pub fn paint_token(spans: &mut StyledSpans, token: &Token, style: &StyleConfig, clip: &Range<usize>) {
    let patch = style_for(token, style);
    if patch.is_empty() {
        return;
    }
    spans.merge(intersect(token.range(), clip), &patch);

    if token.kind == TokenKind::BlockCode && token.end < spans.len() {
        spans.merge(
            intersect(token.end..token.end + 1, clip),
            &patch.background_only(),
        );
    }
}

/// Style a whole text from scratch.
pub fn paint_all(text_len: usize, tokens: &TokenStream, style: &StyleConfig) -> StyledSpans {
    let mut spans = StyledSpans::new(text_len, style.base_attributes());
    let clip = 0..text_len;
    for token in tokens {
        paint_token(&mut spans, token, style, &clip);
    }
    spans
}

/// Repaint the tokens overlapping `changed` and return the token-aligned
/// range that was restyled.
///
/// The reset range reaches one character past the last token so a code
/// block's background spill is recomputed; the neighbouring tokens are
/// repainted clipped to it so their own attributes and spill come back.
pub fn repaint_range(
    spans: &mut StyledSpans,
    tokens: &TokenStream,
    changed: Range<usize>,
    style: &StyleConfig,
) -> Range<usize> {
    let len = spans.len();
    let list = tokens.tokens();
    if list.is_empty() {
        spans.reset(0..len);
        return 0..len;
    }

    let start = changed.start.min(len);
    let end = changed.end.clamp(start, len);
    let first = list
        .partition_point(|t| t.end <= start)
        .min(list.len() - 1);
    let last = list
        .partition_point(|t| t.end < end)
        .clamp(first, list.len() - 1);

    let lo = list[first].start;
    let hi = list[last].end;
    let clip = lo..(hi + 1).min(len);
    spans.reset(clip.clone());

    let from = first.saturating_sub(1);
    let to = (last + 1).min(list.len() - 1);
    for token in &list[from..=to] {
        paint_token(spans, token, style, &clip);
    }
    lo..hi
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
