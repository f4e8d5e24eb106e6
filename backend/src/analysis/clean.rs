//! Cleaning stage: null removal and deduplication.

use std::collections::HashSet;

use crate::table::{Cell, Table};

/// Remove every row containing a null cell, then exact-duplicate rows,
/// keeping first occurrences and preserving the relative order of survivors.
///
/// Pure: the input table is not mutated.
pub fn clean(table: &Table) -> Table {
    let mut out = Table::new(table.columns.clone());
    let mut seen: HashSet<String> = HashSet::new();

    for row in &table.rows {
        if row.iter().any(Cell::is_null) {
            continue;
        }
        if seen.insert(row_key(row)) {
            out.rows.push(row.clone());
        }
    }

    out
}

/// Canonical key for exact-duplicate detection. Cells are tagged with their
/// variant so `Int(1)` and `Str("1")` never collide.
fn row_key(row: &[Cell]) -> String {
    let mut key = String::new();
    for cell in row {
        let tag = match cell {
            Cell::Null => 'n',
            Cell::Int(_) => 'i',
            Cell::Float(_) => 'f',
            Cell::Date(_) => 'd',
            Cell::Str(_) => 's',
        };
        key.push(tag);
        key.push_str(&cell.to_string());
        key.push('\u{1f}');
    }
    key
}
