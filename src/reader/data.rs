//! A tiny `penguins` table for the engine-backed tests.
//!
//! | species   | sex    | bill_depth_mm | flipper_length_mm |
//! |-----------|--------|---------------|-------------------|
//! | Adelie    | MALE   | 1.0           | 1                 |
//! | Adelie    | FEMALE | 2.0           | 2                 |
//! | Gentoo    | MALE   | 3.0           | 2                 |
//! | Gentoo    | FEMALE | 4.0           | 3                 |
//! | Chinstrap | NULL   | 5.0           | 3                 |

use super::Connection;

pub const PENGUINS_SETUP: &str = "
CREATE TABLE penguins (
    species VARCHAR,
    sex VARCHAR,
    bill_depth_mm DOUBLE,
    flipper_length_mm INTEGER
);
INSERT INTO penguins VALUES
    ('Adelie', 'MALE', 1.0, 1),
    ('Adelie', 'FEMALE', 2.0, 2),
    ('Gentoo', 'MALE', 3.0, 2),
    ('Gentoo', 'FEMALE', 4.0, 3),
    ('Chinstrap', NULL, 5.0, 3);
";

/// In-memory DuckDB connection holding the `penguins` table.
#[cfg(feature = "duckdb")]
pub fn duckdb_penguins() -> Connection {
    let conn = Connection::open("duckdb://memory").unwrap();
    conn.run(PENGUINS_SETUP).unwrap();
    conn
}

/// In-memory SQLite connection holding the `penguins` table.
#[cfg(feature = "sqlite")]
pub fn sqlite_penguins() -> Connection {
    let conn = Connection::open("sqlite://memory").unwrap();
    conn.run(PENGUINS_SETUP).unwrap();
    conn
}
