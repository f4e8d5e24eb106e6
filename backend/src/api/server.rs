//! HTTP server for the dashboard API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/api/upload`     | Upload CSV, returns the full analysis    |
//! | POST   | `/api/export`     | Serialize a table back to CSV            |
//! | GET    | `/api/logs`       | SSE stream for real-time pipeline logs   |
//!
//! `POST /api/upload` takes a multipart form: a required `file` field plus
//! optional filter fields `year`, `products`, `cities`, `from`, `to`
//! (products/cities comma-separated, dates ISO).

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, ExportRequest, UploadResponse};
use crate::analysis::derive::parse_date;
use crate::analysis::{analyze_bytes, FilterCriteria};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::export::table_to_csv;

type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/export", post(export_csv))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Salesboard server running on http://localhost:{}", port);
    println!("   POST /api/upload - Upload CSV for analysis");
    println!("   POST /api/export - Download a table as CSV");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "salesboard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "export": "POST /api/export",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload CSV endpoint: multipart file plus optional filter fields.
async fn upload_csv(mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut criteria = FilterCriteria::default();
    let mut from: Option<NaiveDate> = None;
    let mut to: Option<NaiveDate> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("Read error: {}", e)))?
                    .to_vec(),
            );
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
        match name.as_str() {
            "year" => {
                criteria.year = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| bad_request(&format!("Invalid year: {}", text)))?,
                );
            }
            "products" => criteria.products = Some(split_set(&text)),
            "cities" => criteria.cities = Some(split_set(&text)),
            "from" => {
                from = Some(
                    parse_date(text.trim())
                        .ok_or_else(|| bad_request(&format!("Invalid date: {}", text)))?,
                );
            }
            "to" => {
                to = Some(
                    parse_date(text.trim())
                        .ok_or_else(|| bad_request(&format!("Invalid date: {}", text)))?,
                );
            }
            _ => {}
        }
    }

    criteria.date_range = match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        (None, None) => None,
        _ => return Err(bad_request("Date range needs both 'from' and 'to'")),
    };

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    );
    println!("{}\n", "=".repeat(70));

    let config = PipelineConfig::from_env();
    let result = analyze_bytes(&bytes, &criteria, &config).map_err(|e| {
        eprintln!("❌ Analysis error: {}", e);
        (pipeline_error_status(&e), Json(error_response(&e.to_string())))
    })?;

    println!("\n{}", "=".repeat(70));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(70));
    println!("   Rows parsed:    {}", result.csv_info.row_count);
    println!("   Rows analyzed:  {}", result.table.row_count());
    println!("   Total sales:    {:.2}", result.kpis.total_sales);
    println!("   Orders:         {}", result.kpis.total_orders);
    println!("{}\n", "=".repeat(70));

    Ok(Json(UploadResponse::from(result)))
}

/// Export endpoint: JSON table in, `text/csv` attachment out.
async fn export_csv(Json(request): Json<ExportRequest>) -> Result<impl IntoResponse, ApiError> {
    let bytes = table_to_csv(&request.table).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;

    let filename = request.filename.unwrap_or_else(|| "export.csv".to_string());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

/// Bad input is the client's fault; anything else is ours.
fn pipeline_error_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Csv(_) | PipelineError::Column(_) => StatusCode::BAD_REQUEST,
        PipelineError::Io(_) | PipelineError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn split_set(text: &str) -> std::collections::BTreeSet<String> {
    text.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ColumnError, CsvError};

    #[test]
    fn test_pipeline_error_status() {
        assert_eq!(
            pipeline_error_status(&PipelineError::Csv(CsvError::EmptyFile)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            pipeline_error_status(&PipelineError::Column(ColumnError::Missing("Month".into()))),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(
            pipeline_error_status(&PipelineError::Io(io)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_split_set() {
        let set = split_set("Boston, Austin,,Dallas ");
        assert_eq!(set.len(), 3);
        assert!(set.contains("Austin"));
        assert!(set.contains("Dallas"));
    }
}
