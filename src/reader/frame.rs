//! Row-to-DataFrame conversion shared by the readers, and typed access to the
//! resulting columns.
//!
//! Readers push one [`Value`] per cell; [`FrameBuilder::finish`] picks a
//! column type from the non-null cells:
//!
//! | cells                 | dtype     |
//! |-----------------------|-----------|
//! | only integers         | `Int64`   |
//! | integers and floats   | `Float64` |
//! | only booleans         | `Boolean` |
//! | anything else / mixed | `String`  |
//!
//! A column with no non-null cells becomes `String`.

use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use crate::sql::{number_literal, quote_literal};
use crate::{GgplotError, Result};

/// A single cell value fetched from a reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render as a SQL literal (`NULL`, `TRUE`, `42`, `'text'`).
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => number_literal(*f),
            Value::Text(s) => quote_literal(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Empty,
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn absorb(self, value: &Value) -> ColumnKind {
        use ColumnKind::*;
        match (self, value) {
            (kind, Value::Null) => kind,
            (Empty, Value::Int(_)) => Int,
            (Empty, Value::Float(_)) => Float,
            (Empty, Value::Bool(_)) => Bool,
            (Int, Value::Int(_)) => Int,
            (Int | Float, Value::Int(_) | Value::Float(_)) => Float,
            (Bool, Value::Bool(_)) => Bool,
            _ => Text,
        }
    }
}

/// Accumulates rows and produces a polars [`DataFrame`].
#[derive(Debug)]
pub struct FrameBuilder {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
}

impl FrameBuilder {
    pub fn new(names: Vec<String>) -> Self {
        let columns = names.iter().map(|_| Vec::new()).collect();
        Self { names, columns }
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Append one row; its length must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.names.len() {
            return Err(GgplotError::InternalError(format!(
                "Row has {} values but the result has {} columns",
                row.len(),
                self.names.len()
            )));
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
        Ok(())
    }

    pub fn finish(self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .names
            .into_iter()
            .zip(self.columns)
            .map(|(name, values)| build_column(&name, values))
            .collect();
        DataFrame::new(columns).map_err(|e| GgplotError::InternalError(e.to_string()))
    }
}

fn build_column(name: &str, values: Vec<Value>) -> Column {
    let kind = values
        .iter()
        .fold(ColumnKind::Empty, |kind, value| kind.absorb(value));

    match kind {
        ColumnKind::Int => {
            let data: Vec<Option<i64>> = values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Float => {
            let data: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Bool => {
            let data: Vec<Option<bool>> = values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Empty | ColumnKind::Text => {
            let data: Vec<Option<String>> = values
                .into_iter()
                .map(|v| match v {
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), data)
        }
    }
}

fn frame_err(e: PolarsError) -> GgplotError {
    GgplotError::InternalError(e.to_string())
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| {
            GgplotError::InternalError(format!("Query result has no column '{}'", name))
        })
}

/// Whether a polars dtype holds numbers.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Whether the named column holds numbers.
pub fn is_numeric_column(df: &DataFrame, name: &str) -> Result<bool> {
    Ok(is_numeric_dtype(series(df, name)?.dtype()))
}

/// Values of a column cast to `f64`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let cast = series(df, name)?
        .cast(&DataType::Float64)
        .map_err(frame_err)?;
    let values = cast.f64().map_err(frame_err)?;
    Ok(values.into_iter().collect())
}

/// The first value of a column cast to `f64`.
pub fn first_f64(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    Ok(f64_values(df, name)?.into_iter().next().flatten())
}

/// Values of a column as [`Value`]s, preserving the column type.
pub fn values(df: &DataFrame, name: &str) -> Result<Vec<Value>> {
    let series = series(df, name)?;
    let out = match series.dtype() {
        DataType::Boolean => series
            .bool()
            .map_err(frame_err)?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect(),
        DataType::Int64 => series
            .i64()
            .map_err(frame_err)?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Int))
            .collect(),
        dtype if is_numeric_dtype(dtype) => f64_values(df, name)?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Float))
            .collect(),
        _ => {
            let cast = series.cast(&DataType::String).map_err(frame_err)?;
            cast.str()
                .map_err(frame_err)?
                .into_iter()
                .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
                .collect()
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(names: &[&str], rows: Vec<Vec<Value>>) -> DataFrame {
        let mut builder = FrameBuilder::new(names.iter().map(|s| s.to_string()).collect());
        for row in rows {
            builder.push_row(row).unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_column_types_are_inferred() {
        let df = frame(
            &["i", "f", "b", "t", "n"],
            vec![
                vec![
                    Value::Int(1),
                    Value::Int(1),
                    Value::Bool(true),
                    Value::Text("a".into()),
                    Value::Null,
                ],
                vec![
                    Value::Null,
                    Value::Float(2.5),
                    Value::Bool(false),
                    Value::Int(3),
                    Value::Null,
                ],
            ],
        );

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("i").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("f").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("b").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("t").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_values_round_trip_through_frame() {
        let df = frame(
            &["sex"],
            vec![
                vec![Value::Text("FEMALE".into())],
                vec![Value::Null],
                vec![Value::Text("MALE".into())],
            ],
        );
        assert_eq!(
            values(&df, "sex").unwrap(),
            vec![
                Value::Text("FEMALE".into()),
                Value::Null,
                Value::Text("MALE".into())
            ]
        );
    }

    #[test]
    fn test_f64_values_casts_integers() {
        let df = frame(&["n"], vec![vec![Value::Int(4)], vec![Value::Null]]);
        assert_eq!(f64_values(&df, "n").unwrap(), vec![Some(4.0), None]);
        assert_eq!(first_f64(&df, "n").unwrap(), Some(4.0));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let df = frame(&["a"], vec![vec![Value::Int(1)]]);
        assert!(f64_values(&df, "b").is_err());
    }

    #[test]
    fn test_row_width_mismatch() {
        let mut builder = FrameBuilder::new(vec!["a".into(), "b".into()]);
        assert!(builder.push_row(vec![Value::Int(1)]).is_err());
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(Value::Text("it's".into()).to_sql_literal(), "'it''s'");
        assert_eq!(Value::Int(3).to_sql_literal(), "3");
        assert_eq!(Value::Float(2.5).to_sql_literal(), "2.5");
        assert_eq!(Value::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
    }
}
