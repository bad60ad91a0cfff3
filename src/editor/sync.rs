//! Source/display synchronizer
//!
//! The [`Synchronizer`] owns the canonical markdown (the source), the text
//! the host actually shows and edits (the display), and the styled spans
//! painted over the display. The host forwards three kinds of events:
//!
//! - [`Synchronizer::set_source`] when a note is loaded
//! - [`Synchronizer::on_display_edited`] after every change to the editable text
//! - [`Synchronizer::on_selection_changed`] after every cursor or selection move
//!
//! Every handler returns a [`SyncOutcome`] telling the host whether to swap
//! in a new display text, which range to restyle, and where to put the
//! cursor. Applying a swap makes the host report the change back; the
//! synchronizer stays in [`Phase::SwappingBuffers`] until it sees that echo
//! (or [`Synchronizer::tick`] is called from the next UI-loop iteration)
//! and ignores notifications in the meantime.

use log::{debug, trace};
use std::ops::Range;

use super::diff::{diff_tokens, TokenDiff};
use super::display::{build_display, splice_text, Bias, DisplayBuffer, DisplayMap};
use super::selection::{SelectedLines, SelectionRange};
use super::spans::StyledSpans;
use super::style::{paint_all, repaint_range, StyleConfig};
use crate::config::Settings;
use crate::markdown::{MarkdownTokenizer, TokenStream, Tokenizer};
use crate::string_utils::{common_affixes, line_of_scalar, newline_count, scalar_len, scalar_slice};

// ─────────────────────────────────────────────────────────────────────────────
// State and Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// What the synchronizer is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Ready for host notifications
    #[default]
    Idle,
    /// Re-tokenizing and restyling after an event
    Reformatting,
    /// A new display text was handed to the host and has not been echoed yet
    SwappingBuffers,
}

/// Which part of the display the host must restyle from [`Synchronizer::spans`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repaint {
    None,
    Full,
    /// Scalar range in the display text
    Range(Range<usize>),
}

/// Work for the host after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    /// The host must replace its text with [`Synchronizer::display`]
    pub display_replaced: bool,
    pub repaint: Repaint,
    /// New caret position in the display text, when it moved
    pub cursor: Option<usize>,
}

impl SyncUpdate {
    fn full(display_replaced: bool, cursor: Option<usize>) -> Self {
        Self {
            display_replaced,
            repaint: Repaint::Full,
            cursor,
        }
    }
}

/// Result of a host notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Arrived while not idle (usually our own swap echoing back)
    Ignored,
    /// Nothing to do
    Unchanged,
    Updated(SyncUpdate),
}

impl SyncOutcome {
    pub fn update(&self) -> Option<&SyncUpdate> {
        match self {
            SyncOutcome::Updated(update) => Some(update),
            _ => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, SyncOutcome::Ignored)
    }
}

/// Callback receiving the new source text after it changed.
pub type SourceChangedCallback = Box<dyn FnMut(&str)>;

// ─────────────────────────────────────────────────────────────────────────────
// Synchronizer
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps the source text, the display text and their styling in step.
pub struct Synchronizer<T: Tokenizer = MarkdownTokenizer> {
    tokenizer: T,
    style: StyleConfig,
    render_headers: bool,

    source: String,
    source_tokens: TokenStream,
    display: DisplayBuffer,
    spans: StyledSpans,

    selected_lines: SelectedLines,
    /// Caret in display coordinates
    cursor: usize,
    phase: Phase,

    on_source_changed: Option<SourceChangedCallback>,
}

impl Default for Synchronizer<MarkdownTokenizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronizer<MarkdownTokenizer> {
    pub fn new() -> Self {
        Self::with_tokenizer(MarkdownTokenizer::new(), StyleConfig::default())
    }

    /// Synchronizer configured from user settings.
    pub fn from_settings(settings: &Settings, prefers_dark: bool) -> Self {
        let mut sync = Self::with_tokenizer(
            MarkdownTokenizer::new(),
            StyleConfig::from_settings(settings, prefers_dark),
        );
        sync.render_headers = settings.render_headers;
        sync
    }
}

impl<T: Tokenizer> Synchronizer<T> {
    pub fn with_tokenizer(tokenizer: T, style: StyleConfig) -> Self {
        let spans = StyledSpans::new(0, style.base_attributes());
        Self {
            tokenizer,
            style,
            render_headers: true,
            source: String::new(),
            source_tokens: TokenStream::empty(),
            display: DisplayBuffer::default(),
            spans,
            selected_lines: SelectedLines::new(),
            cursor: 0,
            phase: Phase::Idle,
            on_source_changed: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// The canonical markdown.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The text the host shows and edits.
    pub fn display(&self) -> &str {
        &self.display.text
    }

    /// Tokens of the source text.
    pub fn tokens(&self) -> &TokenStream {
        &self.source_tokens
    }

    /// Tokens of the display text.
    pub fn display_tokens(&self) -> &TokenStream {
        &self.display.tokens
    }

    pub fn display_map(&self) -> &DisplayMap {
        &self.display.map
    }

    pub fn spans(&self) -> &StyledSpans {
        &self.spans
    }

    pub fn selected_lines(&self) -> &SelectedLines {
        &self.selected_lines
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn render_headers(&self) -> bool {
        self.render_headers
    }

    /// Register the callback fired whenever the source text changes.
    pub fn set_on_source_changed(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_source_changed = Some(Box::new(callback));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Host Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the source text, e.g. when a note is opened.
    ///
    /// Accepted in every phase. Clears the selected lines and puts the
    /// caret at the start.
    pub fn set_source(&mut self, text: &str) -> SyncOutcome {
        self.phase = Phase::Reformatting;
        let changed = self.source != text;

        self.source = text.to_string();
        self.source_tokens = self.tokenizer.tokenize(text);
        self.selected_lines = SelectedLines::new();
        self.cursor = 0;
        self.rebuild();
        debug!(
            "Source set: {} scalars, {} tokens",
            self.display.map.source_len(),
            self.source_tokens.len()
        );

        if changed {
            self.notify_source_changed();
        }
        self.phase = Phase::SwappingBuffers;
        SyncOutcome::Updated(SyncUpdate::full(true, Some(0)))
    }

    /// The host's editable text changed to `new_text`.
    pub fn on_display_edited(&mut self, new_text: &str) -> SyncOutcome {
        match self.phase {
            Phase::SwappingBuffers if new_text == self.display.text => {
                trace!("Display swap acknowledged");
                self.phase = Phase::Idle;
                return SyncOutcome::Ignored;
            }
            Phase::Idle => {}
            phase => {
                debug!("Ignoring display edit while {:?}", phase);
                return SyncOutcome::Ignored;
            }
        }
        if new_text == self.display.text {
            return SyncOutcome::Unchanged;
        }

        self.phase = Phase::Reformatting;
        let update = self.apply_display_edit(new_text);
        self.phase = if update.display_replaced {
            Phase::SwappingBuffers
        } else {
            Phase::Idle
        };
        SyncOutcome::Updated(update)
    }

    /// The host's selection changed. Ranges are in display coordinates.
    pub fn on_selection_changed(&mut self, ranges: &[SelectionRange]) -> SyncOutcome {
        if self.phase != Phase::Idle {
            debug!("Ignoring selection change while {:?}", self.phase);
            return SyncOutcome::Ignored;
        }

        let caret = ranges
            .first()
            .map(|range| range.offset)
            .unwrap_or(0)
            .min(self.display.map.display_len());
        self.cursor = caret;

        let lines = SelectedLines::from_ranges(&self.display.text, ranges);
        if lines == self.selected_lines {
            return SyncOutcome::Unchanged;
        }
        self.selected_lines = lines;

        let rebuilt = self.build();
        if rebuilt.text == self.display.text {
            self.display = rebuilt;
            return SyncOutcome::Unchanged;
        }

        self.phase = Phase::Reformatting;
        let source_caret = self.display.map.to_source(caret, Bias::Right);
        let cursor = rebuilt.map.to_display(source_caret);
        self.install(rebuilt);
        self.cursor = cursor;
        trace!("Selected lines changed, caret {} -> {}", caret, cursor);

        self.phase = Phase::SwappingBuffers;
        SyncOutcome::Updated(SyncUpdate::full(true, Some(cursor)))
    }

    /// One UI-loop iteration has passed; stop waiting for a swap echo.
    pub fn tick(&mut self) {
        if self.phase != Phase::Idle {
            trace!("Tick: {:?} -> Idle", self.phase);
            self.phase = Phase::Idle;
        }
    }

    /// Change the styling inputs (font size, palette).
    pub fn set_style(&mut self, style: StyleConfig) -> SyncOutcome {
        if style == self.style {
            return SyncOutcome::Unchanged;
        }
        self.style = style;
        self.spans = paint_all(
            self.display.map.display_len(),
            &self.display.tokens,
            &self.style,
        );
        SyncOutcome::Updated(SyncUpdate::full(false, None))
    }

    /// Turn rendered headers on or off.
    pub fn set_render_headers(&mut self, render_headers: bool) -> SyncOutcome {
        if render_headers == self.render_headers {
            return SyncOutcome::Unchanged;
        }
        self.render_headers = render_headers;

        let rebuilt = self.build();
        let replaced = rebuilt.text != self.display.text;
        let source_caret = self.display.map.to_source(self.cursor, Bias::Right);
        let cursor = rebuilt.map.to_display(source_caret);
        self.install(rebuilt);

        if replaced {
            self.cursor = cursor;
            self.phase = Phase::SwappingBuffers;
            SyncOutcome::Updated(SyncUpdate::full(true, Some(cursor)))
        } else {
            SyncOutcome::Updated(SyncUpdate::full(false, None))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn build(&self) -> DisplayBuffer {
        build_display(
            &self.source,
            &self.source_tokens,
            &self.selected_lines,
            self.render_headers,
        )
    }

    fn install(&mut self, display: DisplayBuffer) {
        self.spans = paint_all(display.map.display_len(), &display.tokens, &self.style);
        self.display = display;
    }

    fn rebuild(&mut self) {
        let display = self.build();
        self.install(display);
    }

    fn notify_source_changed(&mut self) {
        if let Some(callback) = self.on_source_changed.as_mut() {
            callback(&self.source);
        }
    }

    /// Map a display edit back into the source and restyle.
    ///
    /// The edit is reduced to one replacement. Its start maps with right
    /// bias and its end with left bias, so hidden header markers survive
    /// edits that begin at or inside the rendered header and are removed by
    /// edits that begin before it.
    fn apply_display_edit(&mut self, new_text: &str) -> SyncUpdate {
        let old_len = self.display.map.display_len();
        let new_len = scalar_len(new_text);
        let (prefix, suffix) = common_affixes(&self.display.text, new_text);
        let removed = prefix..old_len - suffix;
        let inserted = scalar_slice(new_text, prefix..new_len - suffix);
        let inserted_len = new_len - suffix - prefix;

        let source_start = self.display.map.to_source(removed.start, Bias::Right);
        let source_end = self
            .display
            .map
            .to_source(removed.end, Bias::Left)
            .max(source_start);
        trace!(
            "Display edit {:?} (+{}) -> source {}..{}",
            removed,
            inserted_len,
            source_start,
            source_end
        );

        let edit_line = line_of_scalar(&self.display.text, prefix);
        let removed_text = scalar_slice(&self.display.text, removed.clone());
        let line_delta = newline_count(inserted) as isize - newline_count(removed_text) as isize;
        self.selected_lines = self.selected_lines.shifted(edit_line, line_delta);

        let new_source = splice_text(&self.source, source_start..source_end, inserted);
        let source_changed = new_source != self.source;
        self.source = new_source;
        self.source_tokens = self.tokenizer.tokenize(&self.source);

        let rebuilt = self.build();
        let update = if rebuilt.text != new_text {
            let cursor = rebuilt.map.to_display(source_start + inserted_len);
            debug!("Edit changed header rendering, replacing display text");
            self.install(rebuilt);
            self.cursor = cursor;
            SyncUpdate::full(true, Some(cursor))
        } else {
            self.cursor = prefix + inserted_len;
            self.spans.splice(removed, inserted_len);
            let repaint = self.repaint_after_edit(&rebuilt.tokens, prefix..prefix + inserted_len);
            self.display = rebuilt;
            SyncUpdate {
                display_replaced: false,
                repaint,
                cursor: None,
            }
        };

        if source_changed {
            self.notify_source_changed();
        }
        update
    }

    /// Restyle what differs between the current display tokens and `tokens`.
    ///
    /// `inserted` is the inserted text's range; it is restyled together with
    /// the changed tokens, since spans there were only inherited.
    fn repaint_after_edit(&mut self, tokens: &TokenStream, inserted: Range<usize>) -> Repaint {
        let diff = diff_tokens(&self.display.tokens, tokens);
        if diff == TokenDiff::Full {
            self.spans = paint_all(self.spans.len(), tokens, &self.style);
            return Repaint::Full;
        }

        let changed = match diff.source_range(tokens) {
            Some(range) => range.start.min(inserted.start)..range.end.max(inserted.end),
            None => inserted,
        };
        let painted = repaint_range(&mut self.spans, tokens, changed, &self.style);
        trace!("Repainted display range {:?}", painted);
        Repaint::Range(painted)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{ExternalTokenizer, TokenKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A synchronizer holding `source`, past the initial swap.
    fn synced(source: &str) -> Synchronizer {
        let mut sync = Synchronizer::new();
        sync.set_source(source);
        sync.tick();
        sync
    }

    fn select(sync: &mut Synchronizer, offset: usize) -> SyncOutcome {
        let outcome = sync.on_selection_changed(&[SelectionRange::caret(offset)]);
        sync.tick();
        outcome
    }

    fn edit(sync: &mut Synchronizer, new_text: &str) -> SyncUpdate {
        let outcome = sync.on_display_edited(new_text);
        sync.tick();
        outcome.update().cloned().expect("edit should update")
    }

    /// Incremental state must equal a from-scratch rebuild.
    fn assert_consistent(sync: &Synchronizer) {
        let tokens = MarkdownTokenizer::new().tokenize(sync.source());
        assert_eq!(sync.tokens(), &tokens);
        let rebuilt = build_display(
            sync.source(),
            &tokens,
            sync.selected_lines(),
            sync.render_headers(),
        );
        assert_eq!(sync.display(), rebuilt.text);
        assert_eq!(sync.display_tokens(), &rebuilt.tokens);
        let full = paint_all(scalar_len(&rebuilt.text), &rebuilt.tokens, sync.style());
        assert_eq!(sync.spans(), &full, "incremental spans diverged for {:?}", sync.display());
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let text = "# Title\n\n> quote\n\n- item with `code`\n\n```\nblock\n```\ntail";
        let mut sync = Synchronizer::new();
        sync.set_source(text);
        let first = (sync.display().to_string(), sync.spans().clone());
        sync.set_source(text);
        assert_eq!(sync.display(), first.0);
        assert_eq!(sync.spans(), &first.1);
    }

    #[test]
    fn test_plain_insert_does_not_repaint_header() {
        let mut sync = synced("# Title\n\nplain text");
        select(&mut sync, 10);
        assert_eq!(sync.display(), "Title\n\nplain text");

        let update = edit(&mut sync, "Title\n\nplain Xtext");
        assert_eq!(sync.source(), "# Title\n\nplain Xtext");
        assert!(!update.display_replaced);
        let Repaint::Range(range) = update.repaint else {
            panic!("expected a range repaint, got {:?}", update.repaint);
        };
        assert!(range.start >= 5);
        assert!(sync.display_map().to_source(range.start, Bias::Right) >= 7);
        assert_consistent(&sync);
    }

    #[test]
    fn test_header_round_trip() {
        let mut sync = synced("# Hello");
        assert_eq!(sync.display(), "Hello");
        assert_eq!(sync.source(), "# Hello");

        let outcome = select(&mut sync, 0);
        assert!(outcome.update().unwrap().display_replaced);
        assert_eq!(sync.display(), "# Hello");
        assert_eq!(sync.source(), "# Hello");
        assert_consistent(&sync);
    }

    #[test]
    fn test_reverse_mapping_fidelity() {
        let mut sync = synced("# Hello\nworld");
        select(&mut sync, 0);
        assert_eq!(sync.display(), "# Hello\nworld");

        let update = edit(&mut sync, "# Hi\nworld");
        assert!(!update.display_replaced);
        assert_eq!(sync.source(), "# Hi\nworld");

        select(&mut sync, 6);
        assert_eq!(sync.display(), "Hi\nworld");
        assert_eq!(sync.source(), "# Hi\nworld");
        assert_consistent(&sync);
    }

    #[test]
    fn test_caret_keeps_its_character_across_toggle() {
        let mut sync = synced("# Hello\nworld");
        let outcome = select(&mut sync, 3);
        assert_eq!(outcome.update().unwrap().cursor, Some(5));
        assert_eq!(sync.cursor(), 5);
        assert_eq!(&sync.display()[5..], "lo\nworld");
    }

    #[test]
    fn test_code_block_background_extension() {
        let sync = synced("```\ncode\n```\nafter");
        let block = sync
            .display_tokens()
            .iter()
            .find(|t| t.kind == TokenKind::BlockCode)
            .unwrap()
            .clone();
        let code_bg = Some(sync.style().code_background());
        let spill = sync.spans().attributes_at(block.end).unwrap();
        assert_eq!(spill.background, code_bg);
        assert!(!spill.font.monospace);
        assert!(sync.spans().attributes_at(block.start).unwrap().font.monospace);
        assert_eq!(sync.spans().attributes_at(block.end + 1).unwrap().background, None);
    }

    #[test]
    fn test_empty_source() {
        let mut sync = Synchronizer::new();
        let outcome = sync.set_source("");
        assert_eq!(outcome, SyncOutcome::Updated(SyncUpdate::full(true, Some(0))));
        assert_eq!(sync.display(), "");
        assert!(sync.tokens().is_empty());
        assert!(sync.spans().is_empty());
        assert_eq!(sync.on_display_edited(""), SyncOutcome::Ignored);
        assert_eq!(sync.phase(), Phase::Idle);
    }

    #[test]
    fn test_bold_and_italic_scenario() {
        let sync = synced("Some **bold** and *italic* text.");
        let tokens = sync.display_tokens();
        let bold = tokens.iter().find(|t| t.kind == TokenKind::Bold).unwrap();
        let italic = tokens.iter().find(|t| t.kind == TokenKind::Italic).unwrap();
        assert_eq!(bold.contents, "**bold**");
        assert_eq!(italic.contents, "*italic*");
        assert_eq!(tokens.tokens()[0].kind, TokenKind::Plain);

        let spans = sync.spans();
        let bold_font = spans.attributes_at(bold.start).unwrap().font;
        let italic_font = spans.attributes_at(italic.start).unwrap().font;
        assert!(bold_font.bold && !bold_font.italic);
        assert!(italic_font.italic && !italic_font.bold);
        assert!(!spans.attributes_at(0).unwrap().font.bold);
    }

    #[test]
    fn test_deleting_header_line_repaints_seam() {
        let mut sync = synced("# One\n# Two\n# Three");
        sync.set_render_headers(false);
        sync.tick();
        assert_eq!(sync.display(), "# One\n# Two\n# Three");

        let update = edit(&mut sync, "# One\n# Three");
        assert_eq!(sync.source(), "# One\n# Three");
        assert_ne!(update.repaint, Repaint::None);
        assert_consistent(&sync);
    }

    #[test]
    fn test_appending_repeated_token_repaints_it() {
        let mut sync = synced("*x* *x*");
        let update = edit(&mut sync, "*x* *x* *x*");
        let Repaint::Range(range) = update.repaint else {
            panic!("expected a range repaint");
        };
        assert_eq!(range.end, 11);
        assert!(sync.spans().attributes_at(9).unwrap().font.italic);
        assert_consistent(&sync);
    }

    #[test]
    fn test_multi_token_paste_into_rendered_text() {
        let mut sync = synced("# Title\nbody");
        assert_eq!(sync.display(), "Title\nbody");

        // Replace "le\nbo" with text containing a new header line
        let update = edit(&mut sync, "TitX\n## New\nYdy");
        assert_eq!(sync.source(), "# TitX\n## New\nYdy");
        assert!(update.display_replaced);
        assert_eq!(sync.display(), "TitX\nNew\nYdy");
        assert_eq!(update.cursor, Some(10));
        assert_consistent(&sync);
    }

    #[test]
    fn test_paste_starting_before_rendered_header_removes_markers() {
        let mut sync = synced("a\n# Head\nz");
        assert_eq!(sync.display(), "a\nHead\nz");

        let update = edit(&mut sync, "aQad\nz");
        assert_eq!(sync.source(), "aQad\nz");
        assert!(!update.display_replaced);
        assert_consistent(&sync);
    }

    #[test]
    fn test_typing_at_rendered_header_start_keeps_markers() {
        let mut sync = synced("# Hello\nworld");
        edit(&mut sync, "XHello\nworld");
        assert_eq!(sync.source(), "# XHello\nworld");
        assert_eq!(sync.display(), "XHello\nworld");
        assert_consistent(&sync);
    }

    #[test]
    fn test_incremental_repaint_matches_full_repaint() {
        let mut sync = synced("# Notes\n\nSome text\n\n```\nlet a = 1;\n```\nafter");
        select(&mut sync, 9);
        let steps = [
            "Notes\n\nSome **text\n\n```\nlet a = 1;\n```\nafter",
            "Notes\n\nSome **text**\n\n```\nlet a = 1;\n```\nafter",
            "Notes\n\nSome **text** and `x`\n\n```\nlet a = 1;\n```\nafter",
            "Notes\n\nSome **text** and `x`\n\n```\nlet a = 12;\n```\nafter",
            "Notes\n\nSome **text** and `x`\n\n```\nlet a = 12;\n```\n",
            "Notes\n\n> Some **text** and `x`\n\n```\nlet a = 12;\n```\n",
            "Notes\n\n> Some\n\n```\nlet a = 12;\n```\n",
            "Notes\n\n> Some\n\n```\nlet a = 12;\n```\n- one\n- two",
        ];
        for step in steps {
            let update = edit(&mut sync, step);
            assert!(!update.display_replaced, "step {:?} replaced the display", step);
            assert_consistent(&sync);
        }
    }

    #[test]
    fn test_typing_on_raw_header_line() {
        let mut sync = synced("# Hello\nworld");
        select(&mut sync, 1);
        let update = edit(&mut sync, "# Hello!\nworld");
        assert!(!update.display_replaced);
        assert_eq!(sync.source(), "# Hello!\nworld");

        // Enter at the end of the header keeps the header raw
        let update = edit(&mut sync, "# Hello!\n\nworld");
        assert!(!update.display_replaced);
        assert_eq!(sync.source(), "# Hello!\n\nworld");
        assert_consistent(&sync);
    }

    #[test]
    fn test_creating_header_on_selected_line() {
        let mut sync = synced("Title\nbody");
        select(&mut sync, 0);
        let update = edit(&mut sync, "# Title\nbody");
        assert!(!update.display_replaced);
        assert_eq!(sync.display_tokens().tokens()[0].kind, TokenKind::Header);
        assert_consistent(&sync);
    }

    #[test]
    fn test_newline_shifts_selected_lines() {
        let mut sync = synced("a\n# H");
        select(&mut sync, 3);
        assert_eq!(sync.display(), "a\n# H");

        edit(&mut sync, "\na\n# H");
        assert!(sync.selected_lines().contains(2));
        assert_eq!(sync.display(), "\na\n# H");
        assert_consistent(&sync);
    }

    #[test]
    fn test_phase_state_machine() {
        let mut sync = Synchronizer::new();
        sync.set_source("# A\nb");
        assert_eq!(sync.phase(), Phase::SwappingBuffers);

        // Notifications during the swap are ignored
        assert!(sync.on_display_edited("something else").is_ignored());
        assert!(sync
            .on_selection_changed(&[SelectionRange::caret(0)])
            .is_ignored());
        assert_eq!(sync.phase(), Phase::SwappingBuffers);

        // The host echoing our own text ends the swap
        let display = sync.display().to_string();
        assert!(sync.on_display_edited(&display).is_ignored());
        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(sync.on_display_edited(&display), SyncOutcome::Unchanged);

        // A selection toggle swaps again; tick ends it
        assert!(sync
            .on_selection_changed(&[SelectionRange::caret(0)])
            .update()
            .is_some());
        assert_eq!(sync.phase(), Phase::SwappingBuffers);
        sync.tick();
        assert_eq!(sync.phase(), Phase::Idle);
    }

    #[test]
    fn test_selection_without_visible_change() {
        let mut sync = synced("plain\nlines");
        assert_eq!(select(&mut sync, 7), SyncOutcome::Unchanged);
        assert!(sync.selected_lines().contains(1));
        assert_eq!(select(&mut sync, 8), SyncOutcome::Unchanged);
    }

    #[test]
    fn test_source_changed_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sync = Synchronizer::new();
        let sink = Rc::clone(&seen);
        sync.set_on_source_changed(move |source| sink.borrow_mut().push(source.to_string()));

        sync.set_source("# T\nx");
        sync.tick();
        edit(&mut sync, "T\nxy");
        select(&mut sync, 0);

        assert_eq!(
            seen.borrow().as_slice(),
            ["# T\nx".to_string(), "# T\nxy".to_string()]
        );
    }

    #[test]
    fn test_set_render_headers_toggles_display() {
        let mut sync = synced("## Sub\ntext");
        assert_eq!(sync.display(), "Sub\ntext");
        let outcome = sync.set_render_headers(false);
        assert!(outcome.update().unwrap().display_replaced);
        assert_eq!(sync.display(), "## Sub\ntext");
        assert_eq!(sync.set_render_headers(false), SyncOutcome::Unchanged);
    }

    #[test]
    fn test_set_style_repaints() {
        let mut sync = synced("**b**");
        let style = StyleConfig {
            base_font_size: 20.0,
            ..StyleConfig::default()
        };
        let outcome = sync.set_style(style);
        assert_eq!(outcome.update().unwrap().repaint, Repaint::Full);
        assert_eq!(sync.spans().attributes_at(0).unwrap().font.size, 20.0);
        assert_consistent(&sync);
    }

    #[test]
    fn test_parse_failure_renders_plain() {
        let tokenizer = ExternalTokenizer::new(|_: &str| None);
        let mut sync = Synchronizer::with_tokenizer(tokenizer, StyleConfig::default());
        sync.set_source("# Not styled");
        assert_eq!(sync.display(), "# Not styled");
        assert!(sync.display_tokens().is_empty());
        assert_eq!(sync.spans().runs().len(), 1);

        sync.tick();
        let update = sync.on_display_edited("# Not styled!").update().cloned().unwrap();
        assert_eq!(sync.source(), "# Not styled!");
        assert_eq!(update.repaint, Repaint::Full);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            render_headers: false,
            font_size: 18.0,
            ..Settings::default()
        };
        let mut sync = Synchronizer::from_settings(&settings, false);
        sync.set_source("# Raw");
        assert_eq!(sync.display(), "# Raw");
        assert_eq!(sync.style().base_font_size, 18.0);
    }
}
