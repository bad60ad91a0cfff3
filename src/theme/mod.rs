//! Editor color palettes
//!
//! The attribute mapper needs a handful of colors: the text and background
//! of the editor, a secondary tone for quotes, and accents for headings,
//! links and list markers. [`Palette`] holds them as `egui::Color32` so an
//! egui host can use the resulting attributes directly; other hosts convert
//! with `Color32::to_array()`.
//!
//! # Usage
//!
//! ```ignore
//! use nana_render::theme::Palette;
//! use nana_render::config::Theme;
//!
//! let palette = Palette::from_theme(Theme::System, true); // host prefers dark
//! let code_bg = palette.code_background(0.15);
//! ```

use egui::Color32;

use crate::config::Theme;

// ─────────────────────────────────────────────────────────────────────────────
// Palette
// ─────────────────────────────────────────────────────────────────────────────

/// Colors used when styling markdown tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Editor background
    pub background: Color32,
    /// Default text color
    pub foreground: Color32,
    /// Quote text
    pub secondary: Color32,
    /// Horizontal rules
    pub muted: Color32,
    /// Header text
    pub heading: Color32,
    /// Link text and underline
    pub link: Color32,
    /// List bullets and numbers
    pub list_marker: Color32,
}

impl Palette {
    /// Palette for the given theme setting.
    ///
    /// `prefers_dark` resolves [`Theme::System`] and is ignored otherwise.
    pub fn from_theme(theme: Theme, prefers_dark: bool) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
            Theme::System => {
                if prefers_dark {
                    Self::dark()
                } else {
                    Self::light()
                }
            }
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color32::from_rgb(255, 255, 255),
            foreground: Color32::from_rgb(30, 30, 30),
            secondary: Color32::from_rgb(100, 100, 100),
            muted: Color32::from_rgb(160, 160, 160),
            heading: Color32::from_rgb(20, 20, 20),
            link: Color32::from_rgb(0, 100, 180),
            list_marker: Color32::from_rgb(100, 100, 100),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(30, 30, 30),
            foreground: Color32::from_rgb(220, 220, 220),
            secondary: Color32::from_rgb(180, 180, 180),
            muted: Color32::from_rgb(100, 100, 100),
            heading: Color32::from_rgb(235, 235, 235),
            link: Color32::from_rgb(100, 180, 255),
            list_marker: Color32::from_rgb(150, 150, 150),
        }
    }

    /// Check if this is a dark palette.
    pub fn is_dark(&self) -> bool {
        self.background.r() < 128
    }

    /// Background for code spans and blocks: the editor background blended
    /// `amount` of the way toward black.
    pub fn code_background(&self, amount: f32) -> Color32 {
        darken(self.background, amount)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}

/// Blend `color` toward black by `amount` (0.0 keeps it, 1.0 gives black).
/// Alpha is preserved.
pub fn darken(color: Color32, amount: f32) -> Color32 {
    let keep = 1.0 - amount.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f32 * keep).round() as u8;
    Color32::from_rgba_premultiplied(
        scale(color.r()),
        scale(color.g()),
        scale(color.b()),
        color.a(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
