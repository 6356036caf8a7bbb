//! Facet types for small multiples
//!
//! `facet_wrap` splits a plot into one panel per distinct value of a column
//! and wraps the panels into a grid at most three columns wide.

use serde::Serialize;

use crate::reader::{frame, Connection, Value};
use crate::sql::{quote_ident, Filter};
use crate::{GgplotError, Result};

/// Maximum number of panels per grid row.
pub const MAX_COLUMNS: usize = 3;

/// Wrapped faceting by the values of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetWrap {
    pub column: String,
    /// Draw one shared legend for all panels
    pub legend: bool,
}

/// Facet a plot by `column`.
pub fn facet_wrap(column: impl Into<String>) -> FacetWrap {
    let column = column.into();
    tracing::debug!(column = %column, "facet-wrap-init");
    FacetWrap {
        column,
        legend: true,
    }
}

impl FacetWrap {
    pub fn legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }
}

/// Distinct facet values and the grid they are laid out on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetGrid {
    pub values: Vec<Value>,
    pub n_rows: usize,
    pub n_cols: usize,
}

/// Grid shape for `n` panels: `cols = min(n, 3)`, `rows = ceil(n / cols)`.
/// `None` when there is nothing to lay out.
pub fn grid_layout(n: usize) -> Option<(usize, usize)> {
    if n == 0 {
        return None;
    }
    let n_cols = n.min(MAX_COLUMNS);
    Some((n.div_ceil(n_cols), n_cols))
}

/// Fetch the sorted distinct values of `column` and size the panel grid.
///
/// # Errors
///
/// `ValidationError` when the column has no values at all.
pub fn get_facet_values(
    conn: &Connection,
    table: &str,
    column: &str,
    with: &[String],
) -> Result<FacetGrid> {
    let sql = format!(
        "SELECT DISTINCT ({col}) AS {col} FROM {table} ORDER BY 1",
        col = quote_ident(column),
        table = quote_ident(table),
    );
    let df = conn.execute(&sql, with)?;
    let values = frame::values(&df, column)?;

    let (n_rows, n_cols) = grid_layout(values.len()).ok_or_else(|| {
        GgplotError::ValidationError(format!(
            "Facet column '{}' in '{}' has no values",
            column, table
        ))
    })?;
    tracing::debug!(column = %column, panels = values.len(), n_rows, n_cols, "facet grid");

    Ok(FacetGrid {
        values,
        n_rows,
        n_cols,
    })
}

/// Predicate restricting a query to one facet panel.
pub fn facet_filter(column: &str, value: &Value) -> Filter {
    let predicate = if value.is_null() {
        format!("{} IS NULL", quote_ident(column))
    } else {
        format!("{} = {}", quote_ident(column), value.to_sql_literal())
    };
    Filter::new().and(predicate)
}
