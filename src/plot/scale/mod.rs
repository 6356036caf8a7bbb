//! Color scales for sqlggplot
//!
//! This module defines the palettes and colormaps used to color series.

pub mod palettes;

pub use palettes::{color_to_hex, color_to_rgb, colormap, default_color};
