//! Plot layers
//!
//! A plot carries a single layer: its geom, drawn against the plot's mapping.

pub mod geom;

pub use geom::{
    geom_boxplot, geom_histogram, Geom, GeomBoxplot, GeomHistogram, GeomTrait, GeomType,
    LayerContext,
};
