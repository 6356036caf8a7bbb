//! Facet types for small multiples
//!
//! This module defines faceting configuration and the panel grid.

mod types;

pub use types::{facet_filter, facet_wrap, get_facet_values, grid_layout, FacetGrid, FacetWrap};
