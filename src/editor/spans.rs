//! Styled span list
//!
//! [`StyledSpans`] is the value the synchronizer paints into: an ordered list
//! of non-overlapping runs, each carrying a full [`TextAttributes`] set, that
//! together cover the display text. Runs with equal attributes are always
//! coalesced, so two span lists compare equal exactly when every character
//! has the same attributes.
//!
//! The API mirrors what a rich-text store does with attribute ranges:
//! `reset` restores defaults, `merge` overlays an [`AttributePatch`], and
//! `splice` shifts runs when text is replaced.

use egui::Color32;
use std::ops::Range;

// ─────────────────────────────────────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// Font request for a run. Hosts resolve it to a concrete face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    /// Point size
    pub size: f32,
    pub monospace: bool,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    /// Regular proportional font of the given size.
    pub fn regular(size: f32) -> Self {
        Self {
            size,
            monospace: false,
            bold: false,
            italic: false,
        }
    }

    pub fn monospace(size: f32) -> Self {
        Self {
            monospace: true,
            ..Self::regular(size)
        }
    }
}

/// The complete attribute set of a character.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAttributes {
    pub font: FontSpec,
    pub foreground: Color32,
    pub background: Option<Color32>,
    /// Paragraph head indent
    pub indent: f32,
    pub underline: bool,
    /// Link target
    pub link: Option<String>,
}

impl TextAttributes {
    /// Plain text in the given size and color.
    pub fn plain(font_size: f32, foreground: Color32) -> Self {
        Self {
            font: FontSpec::regular(font_size),
            foreground,
            background: None,
            indent: 0.0,
            underline: false,
            link: None,
        }
    }
}

/// A partial attribute set; `None` fields leave the target untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePatch {
    pub font: Option<FontSpec>,
    pub foreground: Option<Color32>,
    pub background: Option<Color32>,
    pub indent: Option<f32>,
    pub underline: Option<bool>,
    pub link: Option<String>,
}

impl AttributePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Only the background of this patch.
    pub fn background_only(&self) -> Self {
        Self {
            background: self.background,
            ..Self::default()
        }
    }

    pub fn apply_to(&self, attrs: &mut TextAttributes) {
        if let Some(font) = self.font {
            attrs.font = font;
        }
        if let Some(color) = self.foreground {
            attrs.foreground = color;
        }
        if let Some(color) = self.background {
            attrs.background = Some(color);
        }
        if let Some(indent) = self.indent {
            attrs.indent = indent;
        }
        if let Some(underline) = self.underline {
            attrs.underline = underline;
        }
        if let Some(link) = &self.link {
            attrs.link = Some(link.clone());
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Span List
// ─────────────────────────────────────────────────────────────────────────────

/// One run of identically styled characters.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    /// Scalar range in the display text
    pub range: Range<usize>,
    pub attributes: TextAttributes,
}

/// Ordered, coalesced, non-overlapping runs covering `[0, len)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpans {
    runs: Vec<StyledRun>,
    len: usize,
    defaults: TextAttributes,
}

impl StyledSpans {
    /// A span list of `len` characters, all with `defaults`.
    pub fn new(len: usize, defaults: TextAttributes) -> Self {
        let runs = if len > 0 {
            vec![StyledRun {
                range: 0..len,
                attributes: defaults.clone(),
            }]
        } else {
            Vec::new()
        };
        Self {
            runs,
            len,
            defaults,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn defaults(&self) -> &TextAttributes {
        &self.defaults
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    /// Attributes of the character at `offset`.
    pub fn attributes_at(&self, offset: usize) -> Option<&TextAttributes> {
        let idx = self.runs.partition_point(|run| run.range.end <= offset);
        self.runs
            .get(idx)
            .filter(|run| run.range.start <= offset)
            .map(|run| &run.attributes)
    }

    /// Restore default attributes over `range`.
    pub fn reset(&mut self, range: Range<usize>) {
        let defaults = self.defaults.clone();
        self.update(range, |attrs| *attrs = defaults.clone());
    }

    /// Overlay `patch` on every character in `range`.
    pub fn merge(&mut self, range: Range<usize>, patch: &AttributePatch) {
        if patch.is_empty() {
            return;
        }
        self.update(range, |attrs| patch.apply_to(attrs));
    }

    /// Account for the text in `old_range` being replaced by `new_len`
    /// characters. Inserted characters take the attributes of the character
    /// before the edit (or of the first replaced one at offset 0).
    pub fn splice(&mut self, old_range: Range<usize>, new_len: usize) {
        let old_range = self.clamp(old_range);
        let removed = old_range.len();

        let inherited = old_range
            .start
            .checked_sub(1)
            .and_then(|prev| self.attributes_at(prev))
            .or_else(|| self.attributes_at(old_range.start))
            .cloned()
            .unwrap_or_else(|| self.defaults.clone());

        let from = self.split_at(old_range.start);
        let to = self.split_at(old_range.end);
        self.runs.drain(from..to);

        for run in &mut self.runs[from..] {
            run.range.start = run.range.start - removed + new_len;
            run.range.end = run.range.end - removed + new_len;
        }
        if new_len > 0 {
            self.runs.insert(
                from,
                StyledRun {
                    range: old_range.start..old_range.start + new_len,
                    attributes: inherited,
                },
            );
        }
        self.len = self.len - removed + new_len;
        self.coalesce();
    }

    fn update(&mut self, range: Range<usize>, mut f: impl FnMut(&mut TextAttributes)) {
        let range = self.clamp(range);
        if range.is_empty() {
            return;
        }
        let from = self.split_at(range.start);
        let to = self.split_at(range.end);
        for run in &mut self.runs[from..to] {
            f(&mut run.attributes);
        }
        self.coalesce();
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let start = range.start.min(self.len);
        start..range.end.clamp(start, self.len)
    }

    /// Make sure a run boundary exists at `pos`; returns the index of the
    /// first run starting at or after it.
    fn split_at(&mut self, pos: usize) -> usize {
        let idx = self.runs.partition_point(|run| run.range.end <= pos);
        let Some(run) = self.runs.get(idx) else {
            return self.runs.len();
        };
        if run.range.start >= pos {
            return idx;
        }
        let mut tail = run.clone();
        tail.range.start = pos;
        self.runs[idx].range.end = pos;
        self.runs.insert(idx + 1, tail);
        idx + 1
    }

    fn coalesce(&mut self) {
        self.runs.dedup_by(|next, prev| {
            if prev.attributes == next.attributes && prev.range.end == next.range.start {
                prev.range.end = next.range.end;
                true
            } else {
                false
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
