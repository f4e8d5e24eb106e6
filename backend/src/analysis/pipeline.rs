//! High-level pipeline API: upload bytes in, full analysis out.
//!
//! Combines all stages: parsing, cleaning, derivation, filtering, and the
//! named views the dashboard renders. Re-running on a filter change
//! recomputes from the cleaned-and-derived table; no incremental state.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesboard::analysis::{analyze_file, FilterCriteria};
//! use salesboard::config::PipelineConfig;
//!
//! let result = analyze_file(
//!     "sales.csv",
//!     &FilterCriteria::default(),
//!     &PipelineConfig::from_env(),
//! )?;
//! println!("{} orders, {:.2} total", result.kpis.total_orders, result.kpis.total_sales);
//! ```

use serde::Serialize;
use std::path::Path;

use crate::analysis::aggregate::{aggregate, daily_sales, kpis, AggregateView, Kpis, ViewOrder, TOP_N};
use crate::analysis::clean::clean;
use crate::analysis::columns;
use crate::analysis::derive::derive;
use crate::analysis::filter::{filter, FilterCriteria};
use crate::analysis::summary::{correlation, describe, ColumnSummary, CorrelationMatrix};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::parser::{parse_bytes_auto, parse_file_auto, ParseResult};
use crate::table::Table;

/// CSV file information surfaced alongside the analysis.
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    /// Rows parsed from the upload.
    pub row_count: usize,
    /// Rows surviving cleaning and date derivation.
    pub clean_row_count: usize,
}

/// Distinct values a UI can populate its filter widgets from, computed on
/// the cleaned-and-derived table before filtering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterDomains {
    /// Ascending.
    pub years: Vec<i64>,
    /// Alphabetical.
    pub products: Vec<String>,
    /// Alphabetical.
    pub cities: Vec<String>,
}

/// Result of a complete analysis pass.
///
/// Every optional view is `None` when the columns it needs did not survive
/// into the table; the pipeline degrades rather than fails.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// The cleaned, derived, filtered table.
    pub table: Table,

    /// Total sales / order count / average order value.
    pub kpis: Kpis,

    /// Total Sales per Month, ascending by month.
    pub monthly_sales: Option<AggregateView>,

    /// Quantity Ordered per Product, descending, top 10.
    pub top_products: Option<AggregateView>,

    /// Total Sales per City, descending.
    pub city_sales: Option<AggregateView>,

    /// Total Sales per Order Date, ascending.
    pub daily_sales: Option<AggregateView>,

    /// Summary statistics for the numeric columns.
    pub summary: Vec<ColumnSummary>,

    /// Pearson correlations between the numeric columns.
    pub correlation: CorrelationMatrix,

    /// Filter widget domains (years, products, cities).
    pub domains: FilterDomains,

    /// CSV parsing metadata.
    pub csv_info: CsvInfo,
}

/// Analyze a CSV file with auto-detection.
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    criteria: &FilterCriteria,
    config: &PipelineConfig,
) -> PipelineResult<AnalysisResult> {
    let parsed = parse_file_auto(path)?;
    analyze_table(parsed, criteria, config)
}

/// Analyze uploaded CSV bytes with auto-detection.
pub fn analyze_bytes(
    bytes: &[u8],
    criteria: &FilterCriteria,
    config: &PipelineConfig,
) -> PipelineResult<AnalysisResult> {
    let parsed = parse_bytes_auto(bytes)?;
    analyze_table(parsed, criteria, config)
}

/// Analyze an already-parsed table.
pub fn analyze_table(
    parsed: ParseResult,
    criteria: &FilterCriteria,
    config: &PipelineConfig,
) -> PipelineResult<AnalysisResult> {
    log_info("Reading CSV...");
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!(
        "Detected separator: '{}'",
        format_delimiter(parsed.delimiter)
    ));
    log_success(format!("Read {} rows", parsed.table.row_count()));

    let row_count = parsed.table.row_count();

    log_info("Cleaning data...");
    let cleaned = clean(&parsed.table);
    let dropped = row_count - cleaned.row_count();
    if dropped > 0 {
        log_warning(format!("Dropped {} incomplete or duplicate rows", dropped));
    }

    let derived = derive(&cleaned, config);
    let invalid_dropped = cleaned.row_count() - derived.row_count();
    if invalid_dropped > 0 {
        log_warning(format!(
            "Dropped {} rows with invalid dates or amounts",
            invalid_dropped
        ));
    }
    log_success(format!(
        "{} rows, {} columns after preparation",
        derived.row_count(),
        derived.columns.len()
    ));

    let domains = filter_domains(&derived);
    let clean_row_count = derived.row_count();

    let table = if criteria.is_empty() {
        derived
    } else {
        log_info("Applying filters...");
        let filtered = filter(&derived, criteria);
        log_success(format!("{} rows match the filters", filtered.row_count()));
        filtered
    };

    log_info("Computing views...");
    let monthly_sales = view_if_present(&table, columns::MONTH, columns::TOTAL_SALES, || {
        aggregate(
            &table,
            columns::MONTH,
            columns::TOTAL_SALES,
            ViewOrder::KeyAscending,
        )
    })?;
    let top_products =
        view_if_present(&table, columns::PRODUCT, columns::QUANTITY_ORDERED, || {
            aggregate(
                &table,
                columns::PRODUCT,
                columns::QUANTITY_ORDERED,
                ViewOrder::ValueDescending { top: Some(TOP_N) },
            )
        })?;
    let city_sales = view_if_present(&table, columns::CITY, columns::TOTAL_SALES, || {
        aggregate(
            &table,
            columns::CITY,
            columns::TOTAL_SALES,
            ViewOrder::ValueDescending { top: None },
        )
    })?;
    let over_time = view_if_present(&table, columns::ORDER_DATE, columns::TOTAL_SALES, || {
        daily_sales(&table)
    })?;

    let result = AnalysisResult {
        kpis: kpis(&table, columns::TOTAL_SALES),
        monthly_sales,
        top_products,
        city_sales,
        daily_sales: over_time,
        summary: describe(&table),
        correlation: correlation(&table),
        domains,
        csv_info: CsvInfo {
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            headers: parsed.table.columns.clone(),
            row_count,
            clean_row_count,
        },
        table,
    };

    log_success(format!(
        "Analysis ready: {} orders, total sales {:.2}",
        result.kpis.total_orders, result.kpis.total_sales
    ));

    Ok(result)
}

/// Run `view` only when both columns exist; the degrade-don't-fail policy
/// for the automatic, non-user-directed views.
fn view_if_present<F>(
    table: &Table,
    group: &str,
    metric: &str,
    view: F,
) -> PipelineResult<Option<AggregateView>>
where
    F: FnOnce() -> crate::error::ColumnResult<AggregateView>,
{
    if table.has_column(group) && table.has_column(metric) {
        Ok(Some(view()?))
    } else {
        Ok(None)
    }
}

fn filter_domains(table: &Table) -> FilterDomains {
    let mut years: Vec<i64> = table
        .distinct(columns::YEAR)
        .iter()
        .filter_map(|c| c.as_i64())
        .collect();
    years.sort_unstable();

    let mut products: Vec<String> = table
        .distinct(columns::PRODUCT)
        .iter()
        .map(|c| c.to_string())
        .collect();
    products.sort();

    let mut cities: Vec<String> = table
        .distinct(columns::CITY)
        .iter()
        .map(|c| c.to_string())
        .collect();
    cities.sort();

    FilterDomains {
        years,
        products,
        cities,
    }
}

/// Format delimiter for display.
pub fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Order Date,Product,Quantity Ordered,Price Each,City\n\
        2024-01-10,USB-C Cable,2,11.95,San Francisco\n\
        2024-01-15,iPhone,1,699.00,New York\n\
        2023-11-02,iPhone,2,699.00,New York\n\
        bad-date,Monitor,1,149.99,Austin\n\
        2024-01-15,iPhone,1,699.00,New York";

    #[test]
    fn test_full_pipeline() {
        let result = analyze_bytes(
            SAMPLE.as_bytes(),
            &FilterCriteria::default(),
            &PipelineConfig::default(),
        )
        .unwrap();

        // 5 parsed; 1 duplicate and 1 bad date dropped
        assert_eq!(result.csv_info.row_count, 5);
        assert_eq!(result.table.row_count(), 3);

        assert_eq!(result.kpis.total_orders, 3);
        assert!((result.kpis.total_sales - (23.90 + 699.0 + 1398.0)).abs() < 1e-9);

        let monthly = result.monthly_sales.unwrap();
        assert_eq!(monthly.len(), 2);
        let products = result.top_products.unwrap();
        assert_eq!(products[0].key.to_string(), "iPhone");

        assert_eq!(result.domains.years, vec![2023, 2024]);
        assert_eq!(result.domains.cities, vec!["New York", "San Francisco"]);
    }

    #[test]
    fn test_pipeline_with_filters() {
        let criteria = FilterCriteria {
            year: Some(2024),
            ..Default::default()
        };
        let result =
            analyze_bytes(SAMPLE.as_bytes(), &criteria, &PipelineConfig::default()).unwrap();

        assert_eq!(result.table.row_count(), 2);
        assert_eq!(result.kpis.total_orders, 2);
        // Domains still reflect the unfiltered table
        assert_eq!(result.domains.years, vec![2023, 2024]);
    }

    #[test]
    fn test_pipeline_degrades_without_sales_columns() {
        let csv = "Product,City\nA,X\nB,Y";
        let result = analyze_bytes(
            csv.as_bytes(),
            &FilterCriteria::default(),
            &PipelineConfig::default(),
        )
        .unwrap();

        assert!(result.monthly_sales.is_none());
        assert!(result.top_products.is_none());
        assert!(result.city_sales.is_none());
        assert!(result.daily_sales.is_none());
        assert_eq!(result.kpis.total_orders, 2);
        assert_eq!(result.kpis.total_sales, 0.0);
    }

    #[test]
    fn test_pipeline_currency() {
        let result = analyze_bytes(
            SAMPLE.as_bytes(),
            &FilterCriteria::default(),
            &PipelineConfig::with_rate(2.0),
        )
        .unwrap();
        let idx = result.table.column_index("Total Sales (EUR)").unwrap();
        let total = result.table.column_index("Total Sales").unwrap();
        for row in &result.table.rows {
            let base = row[total].as_f64().unwrap();
            let converted = row[idx].as_f64().unwrap();
            assert!((converted - base * 2.0).abs() < 1e-9);
        }
    }
}
