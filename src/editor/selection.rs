//! Selection ranges and the set of lines they touch

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::string_utils::scalar_len;

/// A host selection: `length` scalars starting at `offset` in the display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub offset: usize,
    pub length: usize,
}

impl SelectionRange {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// An empty selection (a caret).
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, 0)
    }
}

/// Zero-based indices of the display lines touched by a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectedLines(BTreeSet<usize>);

impl SelectedLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines touched by `ranges` in `text`. Offsets past the end are clamped.
    ///
    /// A caret touches its own line; a non-empty range touches every line
    /// from its first to its last character.
    pub fn from_ranges(text: &str, ranges: &[SelectionRange]) -> Self {
        let starts = line_starts(text);
        let len = scalar_len(text);
        let line_of = |offset: usize| starts.partition_point(|&s| s <= offset.min(len)) - 1;

        let mut lines = BTreeSet::new();
        for range in ranges {
            let first = line_of(range.offset);
            let last = if range.length > 0 {
                line_of(range.offset.saturating_add(range.length) - 1)
            } else {
                first
            };
            lines.extend(first..=last.max(first));
        }
        Self(lines)
    }

    pub fn contains(&self, line: usize) -> bool {
        self.0.contains(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, line: usize) {
        self.0.insert(line);
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Adjust for an edit on `edit_line` that changed the newline count by
    /// `delta`. Lines after the edit move with it; lines swallowed by a
    /// deletion collapse onto the edit line.
    pub fn shifted(&self, edit_line: usize, delta: isize) -> Self {
        if delta == 0 {
            return self.clone();
        }
        let lines = self
            .0
            .iter()
            .map(|&line| {
                if line <= edit_line {
                    line
                } else {
                    let moved = line as isize + delta;
                    moved.max(edit_line as isize) as usize
                }
            })
            .collect();
        Self(lines)
    }
}

impl FromIterator<usize> for SelectedLines {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Scalar offset of the first character of every line.
fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.chars()
            .enumerate()
            .filter(|(_, c)| *c == '\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
