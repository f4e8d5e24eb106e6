//! Error types for the Salesboard analysis pipeline.
//!
//! The hierarchy mirrors the pipeline stages:
//!
//! - [`CsvError`] - the uploaded content cannot be parsed as tabular data
//! - [`ColumnError`] - an explicit column selection references a column the
//!   table does not have (or cannot aggregate)
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP boundary errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Note the deliberate split between "optional enrichment" and "explicit
//! selection": automatic stages (clean, derive, filters) silently skip
//! features whose columns are absent and never raise [`ColumnError`]; only
//! operations that take user-chosen columns (aggregate, pivot, daily sales)
//! fail hard.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::ParseError(e.to_string())
    }
}

// =============================================================================
// Column Selection Errors
// =============================================================================

/// Errors raised by operations that take explicit column selections
/// (aggregate, pivot, daily sales).
#[derive(Debug, Error)]
pub enum ColumnError {
    /// Referenced column is absent from the table.
    #[error("Column not found: {0}")]
    Missing(String),

    /// Column is not numeric but a numeric aggregation was requested.
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::analysis::analyze_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Column selection error.
    #[error("Column error: {0}")]
    Column(#[from] ColumnError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for column-selecting operations.
pub type ColumnResult<T> = Result<T, ColumnError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
