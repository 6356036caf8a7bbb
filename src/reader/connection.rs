//! Connection string parsing
//!
//! Supported forms:
//!
//! - `duckdb://memory` (also `duckdb://` and `duckdb://:memory:`)
//! - `duckdb://path/to/file.duckdb`
//! - `sqlite://memory` (also `sqlite://` and `sqlite://:memory:`)
//! - `sqlite://path/to/file.db`

use crate::{GgplotError, Result};

/// Parsed connection target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionInfo {
    /// In-memory DuckDB database
    DuckDBMemory,
    /// File-backed DuckDB database
    DuckDBFile(String),
    /// In-memory SQLite database
    SQLiteMemory,
    /// File-backed SQLite database
    SQLiteFile(String),
}

impl ConnectionInfo {
    /// Scheme name as written in connection strings.
    pub fn scheme(&self) -> &'static str {
        match self {
            ConnectionInfo::DuckDBMemory | ConnectionInfo::DuckDBFile(_) => "duckdb",
            ConnectionInfo::SQLiteMemory | ConnectionInfo::SQLiteFile(_) => "sqlite",
        }
    }
}

fn is_memory(target: &str) -> bool {
    matches!(target, "" | "memory" | ":memory:")
}

/// Parse a connection string into a [`ConnectionInfo`].
pub fn parse_connection_string(uri: &str) -> Result<ConnectionInfo> {
    let uri = uri.trim();
    let (scheme, target) = uri.split_once("://").ok_or_else(|| {
        GgplotError::ReaderError(format!(
            "Invalid connection string '{}': expected '<scheme>://<target>'",
            uri
        ))
    })?;

    match scheme.to_lowercase().as_str() {
        "duckdb" if is_memory(target) => Ok(ConnectionInfo::DuckDBMemory),
        "duckdb" => Ok(ConnectionInfo::DuckDBFile(target.to_string())),
        "sqlite" if is_memory(target) => Ok(ConnectionInfo::SQLiteMemory),
        "sqlite" => Ok(ConnectionInfo::SQLiteFile(target.to_string())),
        other => Err(GgplotError::ReaderError(format!(
            "Unsupported connection scheme '{}'. Supported schemes: duckdb, sqlite",
            other
        ))),
    }
}
