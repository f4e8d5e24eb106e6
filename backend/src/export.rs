//! CSV export of tables and views.
//!
//! The one bit-exact contract of the system: re-parsing exported bytes must
//! reproduce the same rows and column names as the in-memory table (modulo
//! type stringification). Header row included, no index column.

use std::path::Path;

use crate::analysis::AggregateView;
use crate::error::{CsvError, CsvResult};
use crate::table::Table;

/// Serialize a table to CSV bytes.
pub fn table_to_csv(table: &Table) -> CsvResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| CsvError::ParseError(e.to_string()))
}

/// Serialize an aggregate or pivot view to two-column CSV bytes.
pub fn view_to_csv(view: &AggregateView, key_name: &str, value_name: &str) -> CsvResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([key_name, value_name])?;
    for entry in view {
        writer.write_record([entry.key.to_string(), entry.value.to_string()])?;
    }
    writer
        .into_inner()
        .map_err(|e| CsvError::ParseError(e.to_string()))
}

/// Write a table to a CSV file.
pub fn write_csv_file<P: AsRef<Path>>(table: &Table, path: P) -> CsvResult<()> {
    let bytes = table_to_csv(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{clean, derive, pivot, AggFunc, FilterCriteria};
    use crate::analysis::filter::filter;
    use crate::config::PipelineConfig;
    use crate::parser::{parse_bytes_auto, parse_str};

    fn filtered_sample() -> Table {
        let raw = parse_str(
            "Order Date,Product,Quantity Ordered,Price Each,City\n\
             2024-01-10,USB-C Cable,2,11.95,San Francisco\n\
             2024-01-15,iPhone,1,699.00,New York",
            ',',
        )
        .unwrap();
        let derived = derive(&clean(&raw), &PipelineConfig::default());
        filter(&derived, &FilterCriteria::default())
    }

    #[test]
    fn test_round_trip() {
        let table = filtered_sample();
        let bytes = table_to_csv(&table).unwrap();
        let reparsed = parse_bytes_auto(&bytes).unwrap();

        assert_eq!(reparsed.table.columns, table.columns);
        assert_eq!(reparsed.table.row_count(), table.row_count());
    }

    #[test]
    fn test_header_and_values() {
        let table = parse_str("Product,Price Each\niPhone,699.00", ',').unwrap();
        let bytes = table_to_csv(&table).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Product,Price Each"));
        assert_eq!(lines.next(), Some("iPhone,699"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_quoting_preserved() {
        let table = parse_str("Product\n\"Monitor, 27in\"", ',').unwrap();
        let bytes = table_to_csv(&table).unwrap();
        let reparsed = parse_str(&String::from_utf8(bytes).unwrap(), ',').unwrap();
        assert_eq!(reparsed.rows[0][0].to_string(), "Monitor, 27in");
    }

    #[test]
    fn test_dates_exported_iso() {
        let table = filtered_sample();
        let bytes = table_to_csv(&table).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("2024-01-10"));
    }

    #[test]
    fn test_view_export() {
        let table = filtered_sample();
        let view = pivot(&table, "City", "Total Sales", AggFunc::Sum).unwrap();
        let bytes = view_to_csv(&view, "City", "Total Sales").unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("City,Total Sales\n"));
        assert!(text.contains("San Francisco,23.9"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let table = filtered_sample();
        write_csv_file(&table, &path).unwrap();
        let reparsed = crate::parser::parse_file_auto(&path).unwrap();
        assert_eq!(reparsed.table.columns, table.columns);
        assert_eq!(reparsed.table.row_count(), table.row_count());
    }
}
