//! Geom trait and implementations
//!
//! A geom turns an aesthetic mapping into panel content by issuing aggregation
//! queries. Each geom lives in its own file and implements [`GeomTrait`]; the
//! [`Geom`] enum is what a [`Ggplot`](crate::plot::Ggplot) stores.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlggplot::plot::layer::geom::{Geom, GeomType};
//!
//! let geom = Geom::from(geom_histogram().bins(10));
//! assert_eq!(geom.geom_type(), GeomType::Histogram);
//! ```

use std::fmt;

use serde::Serialize;

use crate::plot::figure::Panel;
use crate::plot::Aes;
use crate::sql::Filter;
use crate::Result;

mod boxplot;
mod histogram;
pub mod types;

pub use boxplot::{geom_boxplot, GeomBoxplot};
pub use histogram::{geom_histogram, Binning, GeomHistogram};
pub use types::{ColumnKind, LayerContext};

/// Enum of all geom types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeomType {
    Histogram,
    Boxplot,
}

impl fmt::Display for GeomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GeomType::Histogram => "histogram",
            GeomType::Boxplot => "boxplot",
        };
        write!(f, "{}", s)
    }
}

/// Behaviour shared by all geoms.
pub trait GeomTrait: fmt::Debug {
    fn geom_type(&self) -> GeomType;

    /// The `x` columns this geom draws, checked against its own options.
    fn columns(&self, aes: &Aes) -> Result<Vec<String>> {
        aes.columns()
    }

    /// Resolve one panel per filter. An unfaceted plot passes a single empty
    /// filter.
    fn draw(&self, ctx: &LayerContext<'_>, panels: &[Filter]) -> Result<Vec<Panel>>;
}

/// A geom held by a plot.
#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    Histogram(GeomHistogram),
    Boxplot(GeomBoxplot),
}

impl Geom {
    fn inner(&self) -> &dyn GeomTrait {
        match self {
            Geom::Histogram(geom) => geom,
            Geom::Boxplot(geom) => geom,
        }
    }

    pub fn geom_type(&self) -> GeomType {
        self.inner().geom_type()
    }

    pub fn columns(&self, aes: &Aes) -> Result<Vec<String>> {
        self.inner().columns(aes)
    }

    pub fn draw(&self, ctx: &LayerContext<'_>, panels: &[Filter]) -> Result<Vec<Panel>> {
        self.inner().draw(ctx, panels)
    }
}

impl From<GeomHistogram> for Geom {
    fn from(geom: GeomHistogram) -> Self {
        Geom::Histogram(geom)
    }
}

impl From<GeomBoxplot> for Geom {
    fn from(geom: GeomBoxplot) -> Self {
        Geom::Boxplot(geom)
    }
}

impl fmt::Display for Geom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.geom_type())
    }
}
