//! The tabular transformation pipeline.
//!
//! Stages compose left to right, each one pure:
//!
//! ```text
//! raw table -> clean() -> derive() -> filter(criteria) -> { aggregate, pivot, kpis }
//! ```
//!
//! - [`clean`] - drop null-bearing and duplicate rows
//! - [`derive`] - add Month/Year/Day and Total Sales columns
//! - [`filter`] - apply user-selected [`FilterCriteria`]
//! - [`aggregate`] / [`pivot`] / [`kpis`] - named views over the result
//! - [`summary`] - per-column statistics and correlations
//! - [`pipeline`] - orchestration into a single [`AnalysisResult`]

pub mod aggregate;
pub mod clean;
pub mod derive;
pub mod filter;
pub mod pipeline;
pub mod summary;

pub use aggregate::{
    aggregate, daily_sales, kpis, pivot, AggFunc, AggregateEntry, AggregateView, Kpis, ViewOrder,
    TOP_N,
};
pub use clean::clean;
pub use derive::derive;
pub use filter::{filter, FilterCriteria};
pub use pipeline::{
    analyze_bytes, analyze_file, analyze_table, AnalysisResult, CsvInfo, FilterDomains,
};
pub use summary::{correlation, describe, ColumnSummary, CorrelationMatrix};

/// The recognized column set. Everything is optional; stages check presence
/// once and degrade gracefully when a column is missing.
pub mod columns {
    pub const ORDER_DATE: &str = "Order Date";
    pub const QUANTITY_ORDERED: &str = "Quantity Ordered";
    pub const PRICE_EACH: &str = "Price Each";
    pub const PRODUCT: &str = "Product";
    pub const CITY: &str = "City";

    // Derived
    pub const MONTH: &str = "Month";
    pub const YEAR: &str = "Year";
    pub const DAY: &str = "Day";
    pub const TOTAL_SALES: &str = "Total Sales";
}
