//! Names of the internal columns produced by stat queries.
//!
//! Stat queries alias their outputs with a reserved prefix so they can never
//! collide with user columns that are carried along (e.g. the stacking
//! category).

const STAT_PREFIX: &str = "__sqlggplot_stat_";

/// Prefixed name for a stat-computed column, e.g. `__sqlggplot_stat_count`.
pub fn stat_column(name: &str) -> String {
    format!("{}{}", STAT_PREFIX, name)
}
