//! Single product search endpoint

use crate::{ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use psf_common::{ProductRecord, QueryKind};
use serde::Deserialize;

/// POST /api/search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Declared query kind; inferred from the text when absent
    #[serde(default)]
    pub kind: Option<QueryKind>,
}

/// POST /api/search
///
/// **Request:** `{"query": "Sony WH-1000XM5", "kind": "name"}`
/// **Response:** merged `ProductRecord`
///
/// **Errors:** 400 empty query, 404 no product, 429/502 upstream trouble,
/// 503 no source enabled
pub async fn search_product(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<ProductRecord>> {
    let record = state.pipeline.search(&request.query, request.kind).await?;
    Ok(Json(record))
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/api/search", post(search_product))
}
