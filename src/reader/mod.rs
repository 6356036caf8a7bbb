//! Data source abstraction layer
//!
//! The reader module provides a pluggable interface for executing SQL queries
//! against various data sources and returning Polars DataFrames.
//!
//! # Architecture
//!
//! All readers implement the `Reader` trait, which provides:
//! - SQL query execution → DataFrame conversion
//! - Statement execution for setup (DDL, inserts)
//!
//! A [`Connection`] pairs a reader with a [`SnippetStore`] so plots can refer
//! to saved queries by name; those are prepended as a `WITH` clause before the
//! query reaches the reader.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlggplot::reader::Connection;
//!
//! let mut conn = Connection::open("duckdb://memory")?;
//! conn.save_snippet("short_trips", "SELECT * FROM 'trips.parquet' WHERE trip_distance < 6.3")?;
//! let df = conn.execute("SELECT COUNT(*) FROM short_trips", &["short_trips".into()])?;
//! ```

use crate::store::SnippetStore;
use crate::{DataFrame, GgplotError, Result};

#[cfg(feature = "duckdb")]
pub mod duckdb;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod connection;
#[cfg(test)]
pub(crate) mod data;
pub mod frame;

#[cfg(feature = "duckdb")]
pub use self::duckdb::DuckDBReader;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteReader;
pub use connection::{parse_connection_string, ConnectionInfo};
pub use frame::Value;

// ============================================================================
// Reader Trait
// ============================================================================

/// Trait for data source readers
///
/// Readers execute SQL queries and return Polars DataFrames.
/// They provide a uniform interface for different database backends.
pub trait Reader {
    /// Execute a SQL query and return the result as a DataFrame
    ///
    /// # Errors
    ///
    /// Returns `GgplotError::ReaderError` carrying the engine's message if:
    /// - The SQL is invalid
    /// - The table or columns don't exist
    fn execute_sql(&self, sql: &str) -> Result<DataFrame>;

    /// Execute one or more statements whose results are discarded
    /// (`CREATE TABLE`, `INSERT`, ...).
    ///
    /// The default implementation runs the statement as a query.
    fn execute_statement(&self, sql: &str) -> Result<()> {
        self.execute_sql(sql).map(|_| ())
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A reader plus the snippets saved against it.
pub struct Connection {
    reader: Box<dyn Reader>,
    snippets: SnippetStore,
}

impl Connection {
    /// Wrap an existing reader.
    pub fn new(reader: impl Reader + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            snippets: SnippetStore::new(),
        }
    }

    /// Open a connection from a connection string (`duckdb://memory`,
    /// `sqlite://path.db`, ...).
    pub fn open(uri: &str) -> Result<Self> {
        let info = parse_connection_string(uri)?;
        tracing::debug!(scheme = info.scheme(), "opening connection");
        match info {
            #[cfg(feature = "duckdb")]
            ConnectionInfo::DuckDBMemory | ConnectionInfo::DuckDBFile(_) => {
                Ok(Self::new(DuckDBReader::from_connection_string(uri)?))
            }
            #[cfg(feature = "sqlite")]
            ConnectionInfo::SQLiteMemory | ConnectionInfo::SQLiteFile(_) => {
                Ok(Self::new(SqliteReader::from_connection_string(uri)?))
            }
            #[allow(unreachable_patterns)]
            other => Err(GgplotError::ReaderError(format!(
                "Support for {}:// connections was not compiled in",
                other.scheme()
            ))),
        }
    }

    /// Save a named query that later queries can reference.
    pub fn save_snippet(&mut self, name: &str, query: &str) -> Result<()> {
        self.snippets.save(name, query)
    }

    /// Save a named query that references other snippets.
    pub fn save_snippet_with(&mut self, name: &str, query: &str, with: &[String]) -> Result<()> {
        self.snippets.save_with(name, query, with)
    }

    /// Run `query`, prefixed with the `WITH` clause for the `with` snippets.
    pub fn execute(&self, query: &str, with: &[String]) -> Result<DataFrame> {
        let sql = self.snippets.render(query, with)?;
        tracing::debug!(sql = %sql, "executing query");
        self.reader.execute_sql(&sql)
    }

    /// Run a setup statement directly against the reader.
    pub fn run(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql = %sql, "executing statement");
        self.reader.execute_statement(sql)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("snippets", &self.snippets.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::frame::{FrameBuilder, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every query and answers with a one-cell frame.
    struct RecordingReader {
        queries: Rc<RefCell<Vec<String>>>,
    }

    impl Reader for RecordingReader {
        fn execute_sql(&self, sql: &str) -> Result<DataFrame> {
            self.queries.borrow_mut().push(sql.to_string());
            let mut builder = FrameBuilder::new(vec!["x".to_string()]);
            builder.push_row(vec![Value::Int(1)])?;
            builder.finish()
        }
    }

    #[test]
    fn test_execute_prefixes_snippets() {
        let queries = Rc::new(RefCell::new(Vec::new()));
        let mut conn = Connection::new(RecordingReader {
            queries: queries.clone(),
        });
        conn.save_snippet("no_nulls", "SELECT * FROM penguins WHERE sex IS NOT NULL")
            .unwrap();

        conn.execute("SELECT 1", &[]).unwrap();
        conn.execute("SELECT * FROM \"no_nulls\"", &["no_nulls".to_string()])
            .unwrap();

        let queries = queries.borrow();
        assert_eq!(queries[0], "SELECT 1");
        assert!(queries[1].starts_with("WITH \"no_nulls\" AS (SELECT * FROM penguins"));
    }

    #[test]
    fn test_default_execute_statement_uses_execute_sql() {
        let queries = Rc::new(RefCell::new(Vec::new()));
        let conn = Connection::new(RecordingReader {
            queries: queries.clone(),
        });
        conn.run("CREATE TABLE t (x INT)").unwrap();
        assert_eq!(queries.borrow().len(), 1);
    }

    #[test]
    fn test_unknown_snippet_never_reaches_reader() {
        let queries = Rc::new(RefCell::new(Vec::new()));
        let conn = Connection::new(RecordingReader {
            queries: queries.clone(),
        });
        assert!(conn.execute("SELECT 1", &["nope".to_string()]).is_err());
        assert!(queries.borrow().is_empty());
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_open_duckdb_and_query_snippet() {
        let mut conn = Connection::open("duckdb://memory").unwrap();
        conn.run("CREATE TABLE trips AS SELECT range AS d FROM range(10)")
            .unwrap();
        conn.save_snippet("short", "SELECT * FROM trips WHERE d < 4")
            .unwrap();

        let df = conn
            .execute("SELECT COUNT(*) AS n FROM \"short\"", &["short".to_string()])
            .unwrap();
        assert_eq!(frame::first_f64(&df, "n").unwrap(), Some(4.0));
    }

    #[test]
    fn test_open_unknown_scheme() {
        assert!(Connection::open("mysql://localhost").is_err());
    }
}
