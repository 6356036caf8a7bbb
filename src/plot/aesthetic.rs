//! Aesthetic mappings
//!
//! `x` names the column(s) to plot; `fill` and `color` are literal colors for
//! bar/box faces and edges. Each accepts either a single value or a list:
//!
//! ```rust,ignore
//! aes().x("price").fill("red")
//! aes().x(["color", "carat"]).color(["green", "magenta"])
//! ```

use serde::Serialize;

use crate::{GgplotError, Result};

/// A value given either once or as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueList(Vec<String>);

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The `index`-th value, cycling through the list.
    pub fn cycled(&self, index: usize) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0[index % self.0.len()].as_str())
        }
    }
}

impl From<&str> for ValueList {
    fn from(value: &str) -> Self {
        ValueList(vec![value.to_string()])
    }
}

impl From<String> for ValueList {
    fn from(value: String) -> Self {
        ValueList(vec![value])
    }
}

impl From<Option<&str>> for ValueList {
    fn from(value: Option<&str>) -> Self {
        ValueList(value.map(str::to_string).into_iter().collect())
    }
}

impl From<Vec<&str>> for ValueList {
    fn from(values: Vec<&str>) -> Self {
        ValueList(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ValueList {
    fn from(values: Vec<String>) -> Self {
        ValueList(values)
    }
}

impl From<&[&str]> for ValueList {
    fn from(values: &[&str]) -> Self {
        ValueList(values.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ValueList {
    fn from(values: [&str; N]) -> Self {
        ValueList(values.iter().map(|s| s.to_string()).collect())
    }
}

/// Aesthetic mapping specification
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aes {
    /// Column(s) plotted on the x axis.
    pub x: ValueList,
    /// Face color(s), cycled per series.
    pub fill: ValueList,
    /// Edge color(s), cycled per series.
    pub color: ValueList,
}

/// Start an empty aesthetic mapping.
pub fn aes() -> Aes {
    Aes::default()
}

impl Aes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, columns: impl Into<ValueList>) -> Self {
        self.x = columns.into();
        self
    }

    pub fn fill(mut self, colors: impl Into<ValueList>) -> Self {
        self.fill = colors.into();
        self
    }

    pub fn color(mut self, colors: impl Into<ValueList>) -> Self {
        self.color = colors.into();
        self
    }

    /// The non-empty `x` column names.
    ///
    /// # Errors
    ///
    /// `ValidationError` when no usable column name was given.
    pub fn columns(&self) -> Result<Vec<String>> {
        let columns: Vec<String> = self
            .x
            .values()
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect();
        if columns.is_empty() {
            return Err(GgplotError::ValidationError(
                "Column name has not been specified".to_string(),
            ));
        }
        Ok(columns)
    }
}
