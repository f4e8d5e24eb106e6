//! Core tabular data model: typed cells and the in-memory [`Table`].
//!
//! A [`Table`] is an ordered sequence of uniform-width rows over a named
//! column set. It is the value type every pipeline stage consumes and
//! produces; stages never mutate their input.
//!
//! Column presence is queried through [`Table::has_column`] /
//! [`Table::column_index`] once per stage, so optional features degrade
//! gracefully when a recognized column is missing from an upload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// A single typed cell value.
///
/// CSV fields are inferred as `Int`, then `Float`, otherwise `Str`; empty
/// fields become `Null`. `Date` cells are only produced by the derivation
/// stage, which parses the `Order Date` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Str(String),
}

impl Cell {
    /// Infer a cell from a raw CSV field.
    pub fn parse(field: &str) -> Cell {
        let field = field.trim();
        if field.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = field.parse::<f64>() {
            return Cell::Float(f);
        }
        Cell::Str(field.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering used when an aggregate view sorts ascending by key:
    /// numbers numerically, dates chronologically, everything else lexically.
    pub fn compare(&self, other: &Cell) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => match (self, other) {
                (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
                _ => self.to_string().cmp(&other.to_string()),
            },
        }
    }

    /// JSON view of the cell, for API responses and the `parse` CLI command.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => Value::from(*f),
            Cell::Date(d) => Value::from(d.format("%Y-%m-%d").to_string()),
            Cell::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for Cell {
    /// Stringification used by CSV export. `Null` renders empty, dates as
    /// ISO `%Y-%m-%d`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Str(s) => write!(f, "{}", s),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Ordered collection of uniform-schema rows.
///
/// Invariant: every row has exactly `columns.len()` cells. After
/// [`crate::analysis::clean`] the table additionally contains no `Null` cell
/// and no two identical rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Capability check: does this table carry the named column?
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of a column as `f64`, or `None` if any cell is non-numeric.
    ///
    /// An empty table is vacuously numeric.
    pub fn numeric_column(&self, index: usize) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row[index].as_f64()).collect()
    }

    /// Names and indices of the columns whose every cell is numeric.
    pub fn numeric_columns(&self) -> Vec<(usize, &str)> {
        (0..self.columns.len())
            .filter(|&i| self.rows.iter().all(|row| row[i].as_f64().is_some()))
            .map(|i| (i, self.columns[i].as_str()))
            .collect()
    }

    /// Distinct values of a column in first-seen order. Empty when the
    /// column is absent.
    pub fn distinct(&self, name: &str) -> Vec<Cell> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let cell = &row[idx];
            if seen.insert(cell.to_string()) {
                out.push(cell.clone());
            }
        }
        out
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_objects(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), cell.to_json());
                }
                Value::Object(obj)
            })
            .collect()
    }
}
