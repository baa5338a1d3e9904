//! psf-search library interface
//!
//! Product specification search: normalizes a product query, fans it out to
//! the enabled data sources, merges their answers into one record, and
//! serves single, bulk and export operations over HTTP.

pub mod adapters;
pub mod api;
pub mod bulk;
pub mod error;
pub mod export;
pub mod merger;
pub mod normalizer;
pub mod pipeline;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use crate::adapters::AdapterSet;
use crate::bulk::BulkRunner;
use crate::pipeline::SearchPipeline;
use axum::Router;
use chrono::{DateTime, Utc};
use psf_common::config::Config;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
    pub bulk: Arc<BulkRunner>,
    /// Immutable after startup
    pub config: Arc<Config>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the pipeline and bulk runner over an adapter set
    pub fn new(config: Config, adapters: AdapterSet) -> Self {
        let pipeline = Arc::new(SearchPipeline::new(adapters));
        let bulk = Arc::new(BulkRunner::new(
            Arc::clone(&pipeline),
            config.batch_limit,
            config.bulk_concurrency,
        ));

        Self {
            pipeline,
            bulk,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }

    /// Build state with the adapters the configuration asks for
    pub fn from_config(config: Config) -> Result<Self, types::AdapterError> {
        let adapters = AdapterSet::from_config(&config)?;
        Ok(Self::new(config, adapters))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .merge(api::source_routes())
        .merge(api::search_routes())
        .merge(api::bulk_routes())
        .merge(api::export_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
