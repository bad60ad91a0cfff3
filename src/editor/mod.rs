//! Editor core
//!
//! This module holds the incremental rendering engine: the styled span
//! list, the token styling rules, the token diff, the source/display
//! mapping and the synchronizer that ties them to a host text view.

mod diff;
mod display;
mod layout;
mod selection;
mod spans;
mod style;
mod sync;

pub use diff::{diff_tokens, TokenDiff};
pub use display::{build_display, splice_text, Bias, DisplayBuffer, DisplayMap, Segment};
pub use layout::{layout_job, FamilySet, FontFamilies};
pub use selection::{SelectedLines, SelectionRange};
pub use spans::{AttributePatch, FontSpec, StyledRun, StyledSpans, TextAttributes};
pub use style::{
    paint_all, paint_token, repaint_range, style_for, StyleConfig, BLOCK_CODE_SCALE, CODE_SCALE,
    HEADER_SCALES,
};
pub use sync::{
    Phase, Repaint, SourceChangedCallback, SyncOutcome, SyncUpdate, Synchronizer,
};
