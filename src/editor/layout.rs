//! egui rendering of styled spans
//!
//! Builds an `egui::text::LayoutJob` from the display text and its span
//! list, so an egui `TextEdit` layouter can show exactly what the
//! synchronizer painted.

use egui::text::{LayoutJob, TextFormat};
use egui::{FontFamily, FontId, Stroke};

use super::spans::{FontSpec, StyledSpans, TextAttributes};
use crate::string_utils::ScalarIndex;

/// Font families for the four weight/slant combinations of one typeface.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySet {
    pub regular: FontFamily,
    pub bold: FontFamily,
    pub italic: FontFamily,
    pub bold_italic: FontFamily,
}

impl FamilySet {
    /// Every variant uses the same family.
    pub fn uniform(family: FontFamily) -> Self {
        Self {
            regular: family.clone(),
            bold: family.clone(),
            italic: family.clone(),
            bold_italic: family,
        }
    }

    fn pick(&self, bold: bool, italic: bool) -> &FontFamily {
        match (bold, italic) {
            (true, true) => &self.bold_italic,
            (true, false) => &self.bold,
            (false, true) => &self.italic,
            (false, false) => &self.regular,
        }
    }
}

/// Families for body text and for code.
///
/// egui's built-in fonts have no bold or italic faces; hosts that register
/// named families for them pass those here.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFamilies {
    pub text: FamilySet,
    pub code: FamilySet,
}

impl Default for FontFamilies {
    fn default() -> Self {
        Self {
            text: FamilySet::uniform(FontFamily::Proportional),
            code: FamilySet::uniform(FontFamily::Monospace),
        }
    }
}

impl FontFamilies {
    pub fn font_id(&self, font: &FontSpec) -> FontId {
        let set = if font.monospace { &self.code } else { &self.text };
        FontId::new(font.size, set.pick(font.bold, font.italic).clone())
    }

    /// Whether italics must be synthesized because no italic face is set.
    fn synthesize_italics(&self, font: &FontSpec) -> bool {
        let set = if font.monospace { &self.code } else { &self.text };
        font.italic && set.pick(font.bold, true) == set.pick(font.bold, false)
    }

    fn text_format(&self, attrs: &TextAttributes) -> TextFormat {
        TextFormat {
            font_id: self.font_id(&attrs.font),
            color: attrs.foreground,
            background: attrs.background.unwrap_or(egui::Color32::TRANSPARENT),
            italics: self.synthesize_italics(&attrs.font),
            underline: if attrs.underline {
                Stroke::new(1.0, attrs.foreground)
            } else {
                Stroke::NONE
            },
            ..Default::default()
        }
    }
}

/// Lay out `text` with the attributes in `spans`.
///
/// Runs are split at line starts so a run's indent applies as leading
/// space on every line it begins.
pub fn layout_job(text: &str, spans: &StyledSpans, families: &FontFamilies, wrap_width: f32) -> LayoutJob {
    let mut job = LayoutJob {
        text: String::with_capacity(text.len()),
        ..Default::default()
    };
    job.wrap.max_width = wrap_width;

    let index = ScalarIndex::new(text);
    for run in spans.runs() {
        let start = index.byte_of(run.range.start);
        let end = index.byte_of(run.range.end);
        if start >= end {
            continue;
        }
        let format = families.text_format(&run.attributes);

        let mut piece_start = start;
        for line in text[start..end].split_inclusive('\n') {
            let at_line_start = piece_start == 0 || text.as_bytes()[piece_start - 1] == b'\n';
            let leading_space = if at_line_start {
                run.attributes.indent
            } else {
                0.0
            };
            job.append(line, leading_space, format.clone());
            piece_start += line.len();
        }
    }

    // Text not covered by spans (stale spans) is still shown
    let covered = index.byte_of(spans.len());
    if covered < text.len() {
        job.append(&text[covered..], 0.0, families.text_format(spans.defaults()));
    }
    job
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
