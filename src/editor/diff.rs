//! Token diff engine
//!
//! Compares the token stream from before an edit with the one after it and
//! finds the contiguous run of current tokens whose styling may differ. A
//! forward scan matches tokens at identical positions; a backward scan
//! matches tokens shifted by the edit's net length change. The backward
//! scan never reaches into tokens the forward scan already matched, so an
//! edit that removes or adds whole tokens cannot make the two scans overlap
//! and hide the change between them.

use log::trace;
use std::ops::Range;

use crate::markdown::TokenStream;

/// Result of comparing two token streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenDiff {
    /// No usable previous stream, or no current tokens: restyle everything
    Full,
    /// Both streams are identical
    Unchanged,
    /// Current tokens `first..=last` need restyling
    Changed { first: usize, last: usize },
}

impl TokenDiff {
    /// Scalar range of the changed tokens in the current text.
    pub fn source_range(&self, current: &TokenStream) -> Option<Range<usize>> {
        match self {
            TokenDiff::Full => Some(0..current.end()),
            TokenDiff::Unchanged => None,
            TokenDiff::Changed { first, last } => {
                let lo = current.get(*first)?.start;
                let hi = current.get(*last)?.end;
                Some(lo..hi)
            }
        }
    }
}

/// Find the current tokens that differ from `previous`.
///
/// Tokens are equal when kind, degree and contents match; forward matches
/// must also start at the same offset, backward matches at the offset
/// shifted by the total length change.
pub fn diff_tokens(previous: &TokenStream, current: &TokenStream) -> TokenDiff {
    if previous.is_empty() || current.is_empty() {
        return TokenDiff::Full;
    }

    let old = previous.tokens();
    let new = current.tokens();
    let (m, n) = (old.len(), new.len());

    let first = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a.same_shape(b) && a.start == b.start)
        .count();
    if first == n && first == m {
        return TokenDiff::Unchanged;
    }

    let length_change = current.end() as isize - previous.end() as isize;
    let matched_tail = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(m.min(n) - first)
        .take_while(|(a, b)| a.same_shape(b) && a.start as isize + length_change == b.start as isize)
        .count();

    let diff = if n - matched_tail > first {
        TokenDiff::Changed {
            first,
            last: n - 1 - matched_tail,
        }
    } else {
        // Every current token is matched, so tokens were only removed;
        // restyle the two tokens that now meet at the seam.
        TokenDiff::Changed {
            first: first.saturating_sub(1),
            last: first.min(n - 1),
        }
    };
    trace!("Token diff: {:?} ({} -> {} tokens)", diff, m, n);
    diff
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
