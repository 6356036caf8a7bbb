//! DuckDB data source implementation
//!
//! Runs queries against an in-memory or file-backed DuckDB database. DuckDB
//! reads CSV/Parquet files referenced as quoted table names directly, so
//! `FROM "penguins.csv"` works without a prior import.

use std::path::Path;

use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;

use super::connection::{parse_connection_string, ConnectionInfo};
use super::frame::{FrameBuilder, Value};
use super::Reader;
use crate::{DataFrame, GgplotError, Result};

/// DuckDB reader
pub struct DuckDBReader {
    conn: Connection,
}

fn reader_err(e: duckdb::Error) -> GgplotError {
    GgplotError::ReaderError(e.to_string())
}

impl DuckDBReader {
    /// Create a reader from a `duckdb://` connection string.
    pub fn from_connection_string(uri: &str) -> Result<Self> {
        match parse_connection_string(uri)? {
            ConnectionInfo::DuckDBMemory => Self::in_memory(),
            ConnectionInfo::DuckDBFile(path) => Self::open(path),
            other => Err(GgplotError::ReaderError(format!(
                "Connection string '{}' is not a DuckDB connection ({}://)",
                uri,
                other.scheme()
            ))),
        }
    }

    /// Open an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(reader_err)?;
        Ok(Self { conn })
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(reader_err)?;
        Ok(Self { conn })
    }

    /// Underlying DuckDB connection, for setup statements.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl std::fmt::Debug for DuckDBReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDBReader").finish_non_exhaustive()
    }
}

fn convert_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::Int(i.into()),
        ValueRef::SmallInt(i) => Value::Int(i.into()),
        ValueRef::Int(i) => Value::Int(i.into()),
        ValueRef::BigInt(i) => Value::Int(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or(Value::Float(i as f64)),
        ValueRef::UTinyInt(i) => Value::Int(i.into()),
        ValueRef::USmallInt(i) => Value::Int(i.into()),
        ValueRef::UInt(i) => Value::Int(i.into()),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or(Value::Float(i as f64)),
        ValueRef::Float(f) => Value::Float(f.into()),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => temporal_text(date_text(days)),
        ValueRef::Timestamp(unit, value) => temporal_text(timestamp_text(micros(unit, value))),
        ValueRef::Time64(unit, value) => temporal_text(time_text(micros(unit, value))),
        other => {
            tracing::debug!("Converting unsupported DuckDB type to string: {:?}", other);
            Value::Text(format!("{:?}", other))
        }
    }
}

// Temporal values travel as ISO text so they can be compared back against
// their column in a facet filter.
fn micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn date_text(days: i32) -> Option<String> {
    let date = chrono::DateTime::from_timestamp(i64::from(days) * 86_400, 0)?.date_naive();
    Some(date.format("%Y-%m-%d").to_string())
}

fn timestamp_text(us: i64) -> Option<String> {
    let dt = chrono::DateTime::from_timestamp_micros(us)?;
    Some(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

fn time_text(us: i64) -> Option<String> {
    let secs = u32::try_from(us.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(us.rem_euclid(1_000_000) * 1_000).ok()?;
    let time = chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?;
    Some(time.format("%H:%M:%S%.f").to_string())
}

fn temporal_text(text: Option<String>) -> Value {
    text.map_or(Value::Null, Value::Text)
}

impl Reader for DuckDBReader {
    fn execute_sql(&self, sql: &str) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(sql).map_err(reader_err)?;
        let mut rows = stmt.query([]).map_err(reader_err)?;

        // Column metadata is only available once the statement has run
        let names: Vec<String> = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();
        let mut builder = FrameBuilder::new(names);

        while let Some(row) = rows.next().map_err(reader_err)? {
            let mut values = Vec::with_capacity(builder.width());
            for i in 0..builder.width() {
                values.push(convert_value(row.get_ref(i).map_err(reader_err)?));
            }
            builder.push_row(values)?;
        }

        builder.finish()
    }

    fn execute_statement(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(reader_err)
    }
}
