/*!
# sqlggplot - ggplot over SQL

A small grammar-of-graphics layer whose statistics are computed by a SQL
engine. Plots are composed by adding geometries and facets to a base
[`Ggplot`]:

```rust,ignore
use sqlggplot::prelude::*;

let conn = Connection::open("duckdb://memory")?;
let plot = ggplot(&conn, "penguins.csv", aes().x("bill_depth_mm"))
    + geom_histogram().bins(10)
    + facet_wrap("sex");
plot.save("bill_depth.png")?;
```

## Architecture

- **Query building** -> each geometry templates aggregation queries
  (`MIN`/`MAX`, `GROUP BY` bin, quartiles) from column and table names
- **Execution** -> queries run through a pluggable [`reader::Reader`]
  (DuckDB, SQLite), prefixed by saved snippets as `WITH` clauses
- **Figure** -> results are resolved into a render-ready [`plot::Figure`]
- **Output** -> figures are drawn by pluggable [`writer::Writer`]s
  (plotters PNG/SVG, Vega-Lite JSON)
*/

pub mod naming;
pub mod plot;
pub mod reader;
pub mod sql;
pub mod store;
pub mod writer;

pub use plot::{
    aes, facet_wrap, geom_boxplot, geom_histogram, ggplot, Aes, FacetWrap, Figure, GeomBoxplot,
    GeomHistogram, Ggplot, Orientation,
};
pub use reader::{Connection, Reader};

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Everything needed to compose and render a plot.
pub mod prelude {
    pub use crate::plot::{
        aes, facet_wrap, geom_boxplot, geom_histogram, ggplot, Aes, FacetWrap, GeomBoxplot,
        GeomHistogram, Ggplot, Orientation,
    };
    pub use crate::reader::{Connection, Reader};
    pub use crate::{GgplotError, Result};
}

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum GgplotError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Data source error: {0}")]
    ReaderError(String),

    #[error("Output generation error: {0}")]
    WriterError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, GgplotError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
