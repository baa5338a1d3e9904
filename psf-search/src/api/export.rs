//! Export endpoints
//!
//! Records come from the client (the page keeps its own result list), so
//! these handlers are pure formatting.

use crate::bulk::BulkReport;
use crate::export::{bulk_to_csv, records_to_csv, records_to_json};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Local;
use psf_common::ProductRecord;
use serde::Deserialize;
use tracing::debug;

/// Export request body
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub records: Vec<ProductRecord>,
}

fn attachment(content_type: &'static str, prefix: &str, extension: &str, body: String) -> Response {
    let filename = format!("{}_{}.{}", prefix, Local::now().format("%Y%m%d_%H%M%S"), extension);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// POST /api/export/json
pub async fn export_json(Json(request): Json<ExportRequest>) -> ApiResult<Response> {
    let body = records_to_json(&request.records)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize records: {}", e)))?;
    debug!(count = request.records.len(), "Exporting JSON");
    Ok(attachment("application/json", "product_specs", "json", body))
}

/// POST /api/export/csv
pub async fn export_csv(Json(request): Json<ExportRequest>) -> Response {
    debug!(count = request.records.len(), "Exporting CSV");
    attachment(
        "text/csv; charset=utf-8",
        "product_specs",
        "csv",
        records_to_csv(&request.records),
    )
}

/// POST /api/bulk/export/csv
///
/// **Request:** a `BulkReport` as returned by POST /api/bulk
pub async fn export_bulk_csv(Json(report): Json<BulkReport>) -> Response {
    debug!(batch_id = %report.batch_id, items = report.items.len(), "Exporting bulk CSV");
    attachment("text/csv; charset=utf-8", "bulk_search", "csv", bulk_to_csv(&report))
}

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/api/export/json", post(export_json))
        .route("/api/export/csv", post(export_csv))
        .route("/api/bulk/export/csv", post(export_bulk_csv))
}
