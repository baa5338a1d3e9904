//! Source listing and connectivity probe
//!
//! - GET /api/sources - enabled sources in priority order
//! - POST /api/sources/test - run one query against each source separately

use crate::adapters::SourceStatus;
use crate::{ApiResult, AppState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// GET /api/sources response
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    /// Adapter ids, highest priority first
    pub sources: Vec<String>,
    pub demo_mode: bool,
    pub batch_limit: usize,
}

/// POST /api/sources/test request
#[derive(Debug, Default, Deserialize)]
pub struct ProbeRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// POST /api/sources/test response
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub query: String,
    pub sources: Vec<SourceStatus>,
}

/// GET /api/sources
pub async fn list_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: state.pipeline.source_ids().into_iter().map(str::to_string).collect(),
        demo_mode: state.config.demo_mode,
        batch_limit: state.config.batch_limit,
    })
}

/// POST /api/sources/test
///
/// **Request:** `{"query": "Dell P2422H"}` (optional; a default query is used)
pub async fn test_sources(
    State(state): State<AppState>,
    Json(request): Json<ProbeRequest>,
) -> ApiResult<Json<ProbeResponse>> {
    let query = request
        .query
        .unwrap_or_else(|| crate::pipeline::DEFAULT_PROBE_QUERY.to_string());

    let sources = state.pipeline.probe(Some(&query)).await?;

    let healthy = sources.iter().filter(|s| s.ok).count();
    info!(query = %query, healthy, total = sources.len(), "Source probe complete");

    Ok(Json(ProbeResponse {
        query: query.trim().to_string(),
        sources,
    }))
}

/// Build source routes
pub fn source_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sources", get(list_sources))
        .route("/api/sources/test", post(test_sources))
}
