//! Output format abstraction layer
//!
//! Writers turn a resolved [`Figure`] into an output format. They never touch
//! the database: every number they draw was computed by the geoms.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlggplot::writer::{PlottersWriter, Writer};
//!
//! let figure = plot.build()?;
//! PlottersWriter::new(1200, 800).write_png(&figure, "out.png")?;
//! ```

use crate::plot::Figure;
use crate::Result;

#[cfg(feature = "plotters")]
mod plotters;
#[cfg(feature = "vegalite")]
mod vegalite;

#[cfg(feature = "plotters")]
pub use self::plotters::PlottersWriter;
#[cfg(feature = "vegalite")]
pub use self::vegalite::VegaLiteWriter;

/// Trait for figure writers
pub trait Writer {
    /// Output type produced by this writer
    type Output;

    /// Render a figure
    fn write(&self, figure: &Figure) -> Result<Self::Output>;
}
