//! Bulk search endpoint

use crate::bulk::{parse_bulk_input, BulkReport};
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

/// POST /api/bulk request
///
/// Either an explicit list (kept as-is, blank entries fail per item) or
/// free text (JSON array or one query per line, blank lines skipped).
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub queries: Option<Vec<String>>,
    #[serde(default)]
    pub text: Option<String>,
}

impl BulkRequest {
    fn into_queries(self) -> Result<Vec<String>, ApiError> {
        match (self.queries, self.text) {
            (Some(queries), None) => Ok(queries),
            (None, Some(text)) => Ok(parse_bulk_input(&text)),
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "Provide either 'queries' or 'text', not both".to_string(),
            )),
            (None, None) => Err(ApiError::BadRequest(
                "Request needs 'queries' or 'text'".to_string(),
            )),
        }
    }
}

/// POST /api/bulk
///
/// **Response:** `BulkReport` with one item per query, in input order
///
/// **Errors:** 400 when the batch exceeds the configured limit
pub async fn bulk_search(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> ApiResult<Json<BulkReport>> {
    let queries = request.into_queries()?;
    let report = state.bulk.run(queries).await?;
    Ok(Json(report))
}

/// Build bulk routes
pub fn bulk_routes() -> Router<AppState> {
    Router::new().route("/api/bulk", post(bulk_search))
}
