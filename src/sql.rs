//! SQL templating helpers
//!
//! Every query this crate issues is built by string substitution of
//! user-supplied table and column names. Identifiers are double-quoted and
//! literals single-quoted with embedded quotes doubled; nothing else about the
//! input is checked, so names are trusted input.

/// Quote an identifier (table, column or snippet name).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a float so it can be spliced into a query.
///
/// Rust's `Display` for `f64` never uses exponent notation, which keeps the
/// output parseable by every engine. Non-finite values become `NULL`.
pub fn number_literal(value: f64) -> String {
    if value.is_finite() {
        format!("{}", value)
    } else {
        "NULL".to_string()
    }
}

/// A conjunction of predicates rendered as a `WHERE` clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate, returning the extended filter.
    pub fn and(mut self, predicate: impl Into<String>) -> Self {
        self.predicates.push(predicate.into());
        self
    }

    /// `WHERE a AND b`, or an empty string when there are no predicates.
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.predicates.join(" AND "))
        }
    }
}

/// Predicate keeping the rows where `column` is not null.
pub fn not_null(column: &str) -> String {
    format!("{} IS NOT NULL", quote_ident(column))
}
