//! Core types for the geom trait system
//!
//! These types are used by all geom implementations and are shared across the module.

use crate::naming;
use crate::plot::figure::Style;
use crate::plot::scale::{color_to_hex, default_color};
use crate::plot::Aes;
use crate::reader::{frame, Connection, Value};
use crate::sql::{not_null, quote_ident, Filter};
use crate::{DataFrame, Result};

/// Everything a geom needs to issue its queries.
#[derive(Debug, Clone, Copy)]
pub struct LayerContext<'a> {
    pub conn: &'a Connection,
    /// Table (or snippet alias) the plot reads from
    pub table: &'a str,
    /// Snippets prepended as a `WITH` clause
    pub with: &'a [String],
    pub aes: &'a Aes,
}

/// Whether a column is binned or counted per distinct value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl<'a> LayerContext<'a> {
    /// The quoted `FROM` target.
    pub fn source(&self) -> String {
        quote_ident(self.table)
    }

    /// Run a query with the plot's snippets attached.
    pub fn query(&self, sql: &str) -> Result<DataFrame> {
        self.conn.execute(sql, self.with)
    }

    /// Classify a column by the type of its first non-null value. A column
    /// without values counts as categorical (nothing to bin).
    pub fn column_kind(&self, column: &str) -> Result<ColumnKind> {
        let value = naming::stat_column("value");
        let sql = format!(
            "SELECT {col} AS {value} FROM {source} WHERE {col} IS NOT NULL LIMIT 1",
            col = quote_ident(column),
            value = quote_ident(&value),
            source = self.source(),
        );
        let df = self.query(&sql)?;
        if df.height() > 0 && frame::is_numeric_column(&df, &value)? {
            Ok(ColumnKind::Numeric)
        } else {
            Ok(ColumnKind::Categorical)
        }
    }

    /// `MIN`/`MAX` of a numeric column over the whole source, `None` when it
    /// has no values.
    pub fn min_max(&self, column: &str) -> Result<Option<(f64, f64)>> {
        let min = naming::stat_column("min");
        let max = naming::stat_column("max");
        let sql = format!(
            "SELECT CAST(MIN({col}) AS DOUBLE) AS {min}, CAST(MAX({col}) AS DOUBLE) AS {max} FROM {source}",
            col = quote_ident(column),
            min = quote_ident(&min),
            max = quote_ident(&max),
            source = self.source(),
        );
        let df = self.query(&sql)?;
        match (frame::first_f64(&df, &min)?, frame::first_f64(&df, &max)?) {
            (Some(lo), Some(hi)) => Ok(Some((lo, hi))),
            _ => Ok(None),
        }
    }

    /// Distinct values of a column over the whole source, sorted.
    pub fn distinct_values(&self, column: &str) -> Result<Vec<Value>> {
        let value = naming::stat_column("value");
        let sql = format!(
            "SELECT DISTINCT {col} AS {value} FROM {source} ORDER BY 1",
            col = quote_ident(column),
            value = quote_ident(&value),
            source = self.source(),
        );
        frame::values(&self.query(&sql)?, &value)
    }

    /// Non-null values of a column ordered by frequency (most common first).
    pub fn values_by_frequency(&self, column: &str) -> Result<Vec<Value>> {
        let value = naming::stat_column("value");
        let count = naming::stat_column("count");
        let sql = format!(
            "SELECT {col} AS {value}, COUNT(*) AS {count} FROM {source} {filter} GROUP BY 1 ORDER BY 2 DESC, 1",
            col = quote_ident(column),
            value = quote_ident(&value),
            count = quote_ident(&count),
            source = self.source(),
            filter = Filter::new().and(not_null(column)).where_clause(),
        );
        frame::values(&self.query(&sql)?, &value)
    }
}

/// Title used for panels of a plot that is not faceted.
pub fn default_title(columns: &[String], table: &str) -> String {
    format!("'{}' from '{}'", columns.join(", "), table)
}

/// Style of the `index`-th series: faces from `aes.fill` (or the default
/// palette), edges from `aes.color`, both cycled.
pub fn series_style(aes: &Aes, index: usize, opacity: f64) -> Result<Style> {
    let fill = match aes.fill.cycled(index) {
        Some(color) => color_to_hex(color)?,
        None => default_color(index).to_string(),
    };
    let edge = aes.color.cycled(index).map(color_to_hex).transpose()?;
    Ok(Style {
        fill,
        edge,
        opacity,
    })
}
