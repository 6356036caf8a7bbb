//! Plot composition types
//!
//! This module contains everything that describes a plot and the figure it
//! resolves to.
//!
//! # Architecture
//!
//! The module is organized into submodules:
//!
//! - `main` - the `Ggplot` builder and `+` composition
//! - `aesthetic` - the `Aes` mapping
//! - `layer` - geoms and their stat queries
//! - `facet` - `facet_wrap` and the panel grid
//! - `scale` - colors and colormaps
//! - `figure` - the resolved, render-ready figure

pub mod aesthetic;
pub mod facet;
pub mod figure;
pub mod layer;
pub mod main;
pub mod scale;

// Re-export all types for convenience
pub use aesthetic::*;
pub use facet::*;
pub use figure::{Figure, Orientation};
pub use layer::*;
pub use main::*;
