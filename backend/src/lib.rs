//! # Salesboard - automatic exploratory analysis for sales CSV uploads
//!
//! Salesboard turns an uploaded sales CSV into a full exploratory analysis:
//! cleaning, derived fields, filters, KPIs, aggregate views and pivot tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────────┐     ┌───────────┐
//! │   CSV File  │────▶│   Parser    │────▶│ clean→derive→filter  │────▶│  Views +  │
//! │  (ISO/UTF8) │     │ (auto-enc)  │     │      (pipeline)      │     │  KPIs     │
//! └─────────────┘     └─────────────┘     └──────────────────────┘     └───────────┘
//! ```
//!
//! Every stage is a pure function over the in-memory [`table::Table`]; a
//! filter change recomputes from the cleaned-and-derived table rather than
//! patching state.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salesboard::{analyze_file, FilterCriteria, PipelineConfig};
//!
//! let result = analyze_file("sales.csv", &FilterCriteria::default(), &PipelineConfig::from_env())?;
//! println!("Total sales: {:.2}", result.kpis.total_sales);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`table`] - Typed cells and the core Table value
//! - [`parser`] - CSV parsing with auto-detection
//! - [`analysis`] - The transformation pipeline and its views
//! - [`export`] - CSV serialization with a round-trip guarantee
//! - [`config`] - Currency conversion configuration
//! - [`api`] - HTTP API server and SSE log stream

// Core modules
pub mod config;
pub mod error;
pub mod table;

// Parsing
pub mod parser;

// Analysis pipeline
pub mod analysis;

// Export
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ColumnError, CsvError, PipelineError, ServerError};

// =============================================================================
// Re-exports - Data model
// =============================================================================

pub use table::{Cell, Table};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use analysis::{
    aggregate, analyze_bytes, analyze_file, analyze_table, clean, daily_sales, derive, filter,
    kpis, pivot, AggFunc, AggregateEntry, AggregateView, AnalysisResult, ColumnSummary,
    CorrelationMatrix, CsvInfo, FilterCriteria, FilterDomains, Kpis, ViewOrder, TOP_N,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{table_to_csv, view_to_csv, write_csv_file};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{CurrencyConversion, PipelineConfig, DEFAULT_CURRENCY_COLUMN};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ExportRequest, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
