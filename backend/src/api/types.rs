//! REST API types for dashboard clients.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::table::Table;

/// Response sent after CSV upload and analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier.
    pub job_id: String,

    /// "ready" when rows survived the pipeline, "empty" otherwise.
    pub status: String,

    /// The full analysis: table, KPIs, views, summary, filter domains.
    pub analysis: AnalysisResult,
}

impl From<AnalysisResult> for UploadResponse {
    fn from(analysis: AnalysisResult) -> Self {
        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if analysis.table.is_empty() {
                "empty"
            } else {
                "ready"
            }
            .to_string(),
            analysis,
        }
    }
}

/// Body of `POST /api/export`: a table to serialize back to CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub table: Table,
    /// Download filename, defaults to `export.csv`.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Standard error response body.
pub fn error_response(message: &str) -> Value {
    json!({
        "status": "error",
        "message": message,
    })
}
