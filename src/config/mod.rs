//! Configuration module
//!
//! This module handles the rendering preferences (theme, base font size,
//! header rendering) and loading them from JSON in the platform-specific
//! config directory.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
