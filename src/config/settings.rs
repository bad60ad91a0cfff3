//! Rendering settings
//!
//! This module defines the `Settings` struct that holds the user-configurable
//! options the renderer cares about, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences for markdown rendering.
///
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`,
/// so partial or older config files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color theme (light, dark, or system)
    pub theme: Theme,

    /// Base font size for body text (in points); headers scale from it
    pub font_size: f32,

    /// Left indent applied to block quotes
    pub quote_indent: f32,

    /// Show headers without their `#` markers unless the cursor is on them
    pub render_headers: bool,

    /// How far code backgrounds are blended toward black (0.0 - 1.0)
    pub code_background_darken: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: 14.0,
            quote_indent: 20.0,
            render_headers: true,
            code_background_darken: 0.15,
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed font size.
    pub const MIN_FONT_SIZE: f32 = 8.0;
    /// Maximum allowed font size.
    pub const MAX_FONT_SIZE: f32 = 72.0;
    /// Maximum allowed quote indent.
    pub const MAX_QUOTE_INDENT: f32 = 200.0;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        if !self.font_size.is_finite() {
            self.font_size = Self::default().font_size;
        }
        self.font_size = self
            .font_size
            .clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE);

        if !self.quote_indent.is_finite() {
            self.quote_indent = Self::default().quote_indent;
        }
        self.quote_indent = self.quote_indent.clamp(0.0, Self::MAX_QUOTE_INDENT);

        if !self.code_background_darken.is_finite() {
            self.code_background_darken = Self::default().code_background_darken;
        }
        self.code_background_darken = self.code_background_darken.clamp(0.0, 1.0);
    }

    /// Load settings and sanitize them to ensure validity.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
