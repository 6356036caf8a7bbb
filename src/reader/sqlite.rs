//! SQLite data source implementation
//!
//! Stat queries are written in the DuckDB vocabulary. SQLite lacks some of it,
//! so the reader registers the missing functions on every connection:
//!
//! - `floor(x)`
//! - `quantile_cont(x, q)` (aggregate, linear interpolation)
//! - `median(x)` (aggregate)

use std::path::Path;

use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::connection::{parse_connection_string, ConnectionInfo};
use super::frame::{FrameBuilder, Value};
use super::Reader;
use crate::{DataFrame, GgplotError, Result};

/// SQLite reader
pub struct SqliteReader {
    conn: Connection,
}

fn reader_err(e: rusqlite::Error) -> GgplotError {
    GgplotError::ReaderError(e.to_string())
}

impl SqliteReader {
    /// Create a reader from a `sqlite://` connection string.
    pub fn from_connection_string(uri: &str) -> Result<Self> {
        match parse_connection_string(uri)? {
            ConnectionInfo::SQLiteMemory => Self::in_memory(),
            ConnectionInfo::SQLiteFile(path) => Self::open(path),
            other => Err(GgplotError::ReaderError(format!(
                "Connection string '{}' is not a SQLite connection ({}://)",
                uri,
                other.scheme()
            ))),
        }
    }

    /// Open an in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(reader_err)?)
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path).map_err(reader_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        register_functions(&conn).map_err(reader_err)?;
        Ok(Self { conn })
    }

    /// Underlying SQLite connection, for setup statements.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl std::fmt::Debug for SqliteReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteReader").finish_non_exhaustive()
    }
}

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("floor", 1, flags, |ctx| {
        let value: Option<f64> = ctx.get(0)?;
        Ok(value.map(f64::floor))
    })?;
    conn.create_aggregate_function("quantile_cont", 2, flags, Quantile { fixed: None })?;
    conn.create_aggregate_function("median", 1, flags, Quantile { fixed: Some(0.5) })?;
    Ok(())
}

/// Continuous quantile with linear interpolation between closest ranks.
///
/// Matches DuckDB's `quantile_cont`: position `q * (n - 1)` in the sorted
/// values. Returns `None` for an empty input.
pub fn quantile_cont(mut values: Vec<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * fraction)
}

struct Quantile {
    fixed: Option<f64>,
}

#[derive(Default)]
struct QuantileState {
    values: Vec<f64>,
    q: Option<f64>,
}

impl Aggregate<QuantileState, Option<f64>> for Quantile {
    fn init(&self, _ctx: &mut Context<'_>) -> rusqlite::Result<QuantileState> {
        Ok(QuantileState {
            values: Vec::new(),
            q: self.fixed,
        })
    }

    fn step(&self, ctx: &mut Context<'_>, state: &mut QuantileState) -> rusqlite::Result<()> {
        if let Some(value) = ctx.get::<Option<f64>>(0)? {
            state.values.push(value);
        }
        if state.q.is_none() {
            state.q = Some(ctx.get::<f64>(1)?);
        }
        Ok(())
    }

    fn finalize(
        &self,
        _ctx: &mut Context<'_>,
        state: Option<QuantileState>,
    ) -> rusqlite::Result<Option<f64>> {
        Ok(state.and_then(|s| quantile_cont(s.values, s.q.unwrap_or(0.5))))
    }
}

fn convert_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(format!("<{} bytes>", bytes.len())),
    }
}

impl Reader for SqliteReader {
    fn execute_sql(&self, sql: &str) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(sql).map_err(reader_err)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut builder = FrameBuilder::new(names);

        let mut rows = stmt.query([]).map_err(reader_err)?;
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
