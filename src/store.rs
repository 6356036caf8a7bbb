//! Saved query snippets
//!
//! A snippet is a named query that later queries can reference as if it were a
//! table. Referencing a snippet prepends it as a common table expression:
//!
//! ```rust,ignore
//! let mut store = SnippetStore::new();
//! store.save("short_trips", "SELECT * FROM trips WHERE trip_distance < 6.3")?;
//!
//! let sql = store.render("SELECT COUNT(*) FROM short_trips", &["short_trips".into()])?;
//! // WITH "short_trips" AS (SELECT * FROM trips WHERE trip_distance < 6.3)
//! // SELECT COUNT(*) FROM short_trips
//! ```
//!
//! Snippets may themselves depend on other snippets; dependencies are expanded
//! depth-first so every CTE is defined before it is referenced.

use std::collections::{BTreeMap, HashSet};

use crate::sql::quote_ident;
use crate::{GgplotError, Result};

/// A named query and the snippets it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub query: String,
    pub with: Vec<String>,
}

/// Collection of saved snippets.
#[derive(Debug, Clone, Default)]
pub struct SnippetStore {
    snippets: BTreeMap<String, Snippet>,
}

impl SnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a standalone snippet, replacing any previous one with that name.
    pub fn save(&mut self, name: &str, query: &str) -> Result<()> {
        self.save_with(name, query, &[])
    }

    /// Save a snippet that references other snippets.
    pub fn save_with(&mut self, name: &str, query: &str, with: &[String]) -> Result<()> {
        if name.trim().is_empty() {
            return Err(GgplotError::ValidationError(
                "Snippet name cannot be empty".to_string(),
            ));
        }
        for dependency in with {
            if dependency == name {
                return Err(GgplotError::ValidationError(format!(
                    "Snippet '{}' cannot reference itself",
                    name
                )));
            }
            self.get(dependency)?;
        }

        let query = query.trim().trim_end_matches(';').trim_end().to_string();
        tracing::debug!(snippet = name, "saving snippet");
        self.snippets.insert(
            name.to_string(),
            Snippet {
                query,
                with: with.to_vec(),
            },
        );
        Ok(())
    }

    /// Look up a snippet by name.
    pub fn get(&self, name: &str) -> Result<&Snippet> {
        self.snippets.get(name).ok_or_else(|| {
            GgplotError::ValidationError(format!(
                "'{}' is not a valid snippet identifier. Valid identifiers are: {}",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// Names of all saved snippets, sorted.
    pub fn names(&self) -> Vec<String> {
        self.snippets.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snippets.contains_key(name)
    }

    /// Remove a snippet. Fails while another snippet still references it.
    pub fn remove(&mut self, name: &str) -> Result<Snippet> {
        self.get(name)?;
        let dependents: Vec<&str> = self
            .snippets
            .iter()
            .filter(|(_, snippet)| snippet.with.iter().any(|w| w == name))
            .map(|(key, _)| key.as_str())
            .collect();
        if !dependents.is_empty() {
            return Err(GgplotError::ValidationError(format!(
                "Cannot remove snippet '{}': it is referenced by {}",
                name,
                dependents.join(", ")
            )));
        }
        self.snippets
            .remove(name)
            .ok_or_else(|| GgplotError::InternalError(format!("Snippet '{}' vanished", name)))
    }

    /// Prefix `query` with a `WITH` clause defining `with` and everything they
    /// depend on. Returns the query unchanged when `with` is empty.
    pub fn render(&self, query: &str, with: &[String]) -> Result<String> {
        if with.is_empty() {
            return Ok(query.to_string());
        }

        let mut ordered = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        for name in with {
            self.resolve(name, &mut ordered, &mut done, &mut visiting)?;
        }

        let ctes: Vec<String> = ordered
            .iter()
            .map(|name| {
                let snippet = &self.snippets[name.as_str()];
                format!("{} AS ({})", quote_ident(name), snippet.query)
            })
            .collect();

        Ok(format!("WITH {}\n{}", ctes.join(", "), query.trim()))
    }

    fn resolve(
        &self,
        name: &str,
        ordered: &mut Vec<String>,
        done: &mut HashSet<String>,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if visiting.iter().any(|v| v == name) {
            visiting.push(name.to_string());
            return Err(GgplotError::ValidationError(format!(
                "Snippets form a cycle: {}",
                visiting.join(" -> ")
            )));
        }

        let snippet = self.get(name)?;
        visiting.push(name.to_string());
        for dependency in &snippet.with {
            self.resolve(dependency, ordered, done, visiting)?;
        }
        visiting.pop();

        done.insert(name.to_string());
        ordered.push(name.to_string());
        Ok(())
    }
}
