//! Unicode scalar offset utilities
//!
//! Every offset the tokenizer, the diff engine and the synchronizer exchange
//! is measured in Unicode scalar values (`char`s), never in UTF-8 bytes and
//! never in grapheme clusters. Rust strings are indexed by byte, so this
//! module holds the conversions between the two, the grapheme boundaries
//! token edges are snapped to, and the small amount of line/affix
//! arithmetic the editor needs.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::{scalar_slice, ScalarIndex};
//!
//! let text = "Hei på deg";
//! assert_eq!(scalar_slice(text, 4..6), "på");
//! let index = ScalarIndex::new(text);
//! assert_eq!(index.byte_of(5), 6); // 'å' is two bytes
//! ```

use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

// ─────────────────────────────────────────────────────────────────────────────
// Character Boundary Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the largest index that is less than or equal to `index`
/// and is on a UTF-8 character boundary.
///
/// If `index` is greater than the string length, returns the string length.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    if index == 0 {
        return 0;
    }

    let bytes = s.as_bytes();
    let mut i = index;
    while i > 0 && !is_utf8_char_start(bytes[i]) {
        i -= 1;
    }
    i
}

/// Check if a byte is the start of a UTF-8 character.
///
/// A byte is a char start if it's NOT a continuation byte (10xxxxxx).
#[inline]
fn is_utf8_char_start(byte: u8) -> bool {
    (byte & 0b11000000) != 0b10000000
}

// ─────────────────────────────────────────────────────────────────────────────
// Index Conversion Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Number of Unicode scalar values in `s`.
#[inline]
pub fn scalar_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a scalar index to a byte index.
///
/// Returns the string length if `char_index` is beyond the string.
pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Convert a byte index to a scalar index.
///
/// If the byte index is in the middle of a character, it counts
/// up to (but not including) that character.
pub fn byte_index_to_char_index(s: &str, byte_index: usize) -> usize {
    let byte_index = floor_char_boundary(s, byte_index);
    s[..byte_index].chars().count()
}

/// Slice `s` by a range of scalar offsets, clamping both ends to the string.
pub fn scalar_slice(s: &str, range: Range<usize>) -> &str {
    let start = char_index_to_byte_index(s, range.start);
    let end = char_index_to_byte_index(s, range.end.max(range.start));
    &s[start..end]
}

/// Precomputed byte offsets of every scalar in a string.
///
/// Converting many offsets over the same text (one per token) with
/// `char_index_to_byte_index` is quadratic; this table makes each
/// conversion a lookup or a binary search.
#[derive(Debug, Clone)]
pub struct ScalarIndex {
    /// Byte offset of each scalar, followed by the total byte length
    starts: Vec<usize>,
}

impl ScalarIndex {
    pub fn new(s: &str) -> Self {
        let mut starts: Vec<usize> = s.char_indices().map(|(i, _)| i).collect();
        starts.push(s.len());
        Self { starts }
    }

    /// Number of scalars in the indexed text.
    pub fn len(&self) -> usize {
        self.starts.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset of the scalar at `scalar`, clamped to the text length.
    pub fn byte_of(&self, scalar: usize) -> usize {
        self.starts[scalar.min(self.len())]
    }

    /// Scalar offset of `byte`, rounding down when it falls inside a character.
    pub fn scalar_of(&self, byte: usize) -> usize {
        match self.starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grapheme Boundaries
// ─────────────────────────────────────────────────────────────────────────────

/// Scalar offsets of every extended grapheme cluster boundary in `s`,
/// ascending, starting with 0 and ending with the scalar length.
pub fn grapheme_boundaries(s: &str) -> Vec<usize> {
    let mut bounds = Vec::new();
    let mut pos = 0;
    for grapheme in s.graphemes(true) {
        bounds.push(pos);
        pos += grapheme.chars().count();
    }
    bounds.push(pos);
    bounds
}

/// Smallest boundary at or after `offset` (the last boundary if past the end).
pub fn ceil_boundary(bounds: &[usize], offset: usize) -> usize {
    let i = bounds.partition_point(|&b| b < offset);
    bounds
        .get(i)
        .or_else(|| bounds.last())
        .copied()
        .unwrap_or(0)
}

/// Largest boundary at or before `offset`.
pub fn floor_boundary(bounds: &[usize], offset: usize) -> usize {
    let i = bounds.partition_point(|&b| b <= offset);
    i.checked_sub(1).and_then(|i| bounds.get(i)).copied().unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Zero-based line index of the scalar offset `offset`.
///
/// Offsets past the end report the last line.
pub fn line_of_scalar(s: &str, offset: usize) -> usize {
    s.chars().take(offset).filter(|&c| c == '\n').count()
}

/// Number of newline characters in `s`.
#[inline]
pub fn newline_count(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

/// Byte ranges of every line in `s`, excluding the terminating newline.
///
/// Always returns at least one line; a trailing newline yields a final
/// empty line.
pub fn line_byte_ranges(s: &str) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, b) in s.bytes().enumerate() {
        if b == b'\n' {
            lines.push(start..i);
            start = i + 1;
        }
    }
    lines.push(start..s.len());
    lines
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit Detection
// ─────────────────────────────────────────────────────────────────────────────

/// Length in scalars of the common prefix and the common suffix of two
/// strings, with the suffix never overlapping the prefix in either string.
///
/// `old[prefix..old_len - suffix]` is what was replaced and
/// `new[prefix..new_len - suffix]` is what replaced it.
pub fn common_affixes(old: &str, new: &str) -> (usize, usize) {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars
        .iter()
        .zip(new_chars.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    (prefix, suffix)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
