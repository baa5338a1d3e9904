//! Single-query search pipeline
//!
//! normalize → all enabled adapters (concurrently) → merge
//!
//! # Failure policy
//! - Any adapter succeeded: merge the successes, failures are only logged
//! - Every adapter failed: surface the first non-NotFound failure in priority
//!   order, or NotFound when every failure was NotFound

use crate::adapters::{AdapterOutcome, AdapterSet, SourceStatus};
use crate::merger;
use crate::normalizer;
use crate::types::{AdapterError, SearchError};
use psf_common::{ProductRecord, Query, QueryKind, SourceResult};
use std::time::Instant;
use tracing::{info, warn};

/// Query used by the source probe when the caller gives none
pub const DEFAULT_PROBE_QUERY: &str = "iPhone 15 Pro";

/// Search pipeline over a fixed adapter set
pub struct SearchPipeline {
    adapters: AdapterSet,
}

impl SearchPipeline {
    pub fn new(adapters: AdapterSet) -> Self {
        Self { adapters }
    }

    /// Adapter ids in priority order
    pub fn source_ids(&self) -> Vec<&'static str> {
        self.adapters.ids()
    }

    /// Look one raw query up
    ///
    /// # Errors
    /// `InvalidQuery` for blank input, `NoSourcesEnabled` with an empty adapter
    /// set, otherwise per the failure policy above
    pub async fn search(&self, raw: &str, kind: Option<QueryKind>) -> Result<ProductRecord, SearchError> {
        let query = normalizer::normalize(raw, kind)?;
        self.search_query(&query).await
    }

    /// Look an already normalized query up
    pub async fn search_query(&self, query: &Query) -> Result<ProductRecord, SearchError> {
        if self.adapters.is_empty() {
            return Err(SearchError::NoSourcesEnabled);
        }

        let started = Instant::now();
        let outcomes = self.adapters.search_all(query).await;
        let (results, failure) = partition(query, outcomes);

        if results.is_empty() {
            let error = failure.unwrap_or_else(|| SearchError::NotFound(query.text.clone()));
            warn!(query = %query.text, code = error.code(), "All sources failed");
            return Err(error);
        }

        let record = merger::merge(results, &query.text)?;

        info!(
            query = %query.text,
            kind = %query.kind,
            sources = ?record.sources,
            spec_count = record.specifications.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );

        Ok(record)
    }

    /// Run `raw` (or a default test query) against each source separately
    pub async fn probe(&self, raw: Option<&str>) -> Result<Vec<SourceStatus>, SearchError> {
        let query = normalizer::normalize(raw.unwrap_or(DEFAULT_PROBE_QUERY), None)?;
        Ok(self.adapters.probe(&query).await)
    }
}

/// Split outcomes into successes (priority order) and the failure to surface
/// if nothing succeeded
fn partition(query: &Query, outcomes: Vec<AdapterOutcome>) -> (Vec<SourceResult>, Option<SearchError>) {
    let mut results = Vec::new();
    let mut failure = None;

    for outcome in outcomes {
        match outcome.result {
            Ok(result) => results.push(result),
            Err(AdapterError::NotFound(_)) => {}
            Err(e) => {
                if failure.is_none() {
                    failure = Some(SearchError::from_adapter(outcome.adapter, query, e));
                }
            }
        }
    }

    (results, failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockAdapter;
    use crate::types::SourceAdapter;
    use std::sync::Arc;
    use std::time::Duration;

    fn pipeline(adapters: Vec<Arc<dyn SourceAdapter>>) -> SearchPipeline {
        SearchPipeline::new(AdapterSet::new(adapters, Duration::from_millis(1)))
    }

    fn found(source: &'static str, brand: &str) -> SourceResult {
        let mut r = SourceResult::new(source);
        r.brand = Some(brand.into());
        r
    }

    #[tokio::test]
    async fn test_blank_query_rejected_before_adapters() {
        let mock = Arc::new(MockAdapter::ok("a", found("a", "Dell")));
        let adapter: Arc<dyn SourceAdapter> = mock.clone();
        let p = pipeline(vec![adapter]);

        let err = p.search("   ", None).await.unwrap_err();

        assert_eq!(err.code(), "INVALID_QUERY");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_sources_enabled() {
        let err = pipeline(Vec::new()).search("Dell P2422H", None).await.unwrap_err();
        assert_eq!(err, SearchError::NoSourcesEnabled);
    }

    #[tokio::test]
    async fn test_partial_failure_still_merges() {
        let p = pipeline(vec![
            Arc::new(MockAdapter::failing("a", AdapterError::RateLimit("429".into()))),
            Arc::new(MockAdapter::ok("b", found("b", "Dell"))),
        ]);

        let record = p.search("Dell P2422H", None).await.unwrap();

        assert_eq!(record.brand.as_deref(), Some("Dell"));
        assert_eq!(record.sources, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_first_real_failure_surfaces() {
        let p = pipeline(vec![
            Arc::new(MockAdapter::failing("a", AdapterError::NotFound("nope".into()))),
            Arc::new(MockAdapter::failing("b", AdapterError::Auth("403".into()))),
            Arc::new(MockAdapter::failing("c", AdapterError::MalformedResponse("bad".into()))),
        ]);

        let err = p.search("Dell P2422H", None).await.unwrap_err();

        assert_eq!(
            err,
            SearchError::Auth {
                adapter: "b".into(),
                message: "403".into()
            }
        );
    }

    #[tokio::test]
    async fn test_all_not_found() {
        let p = pipeline(vec![
            Arc::new(MockAdapter::failing("a", AdapterError::NotFound("x".into()))),
            Arc::new(MockAdapter::failing("b", AdapterError::NotFound("y".into()))),
        ]);

        let err = p.search("  Nokia 3310 ", None).await.unwrap_err();
        assert_eq!(err, SearchError::NotFound("Nokia 3310".into()));
    }

    #[tokio::test]
    async fn test_empty_results_are_no_data_found() {
        let p = pipeline(vec![Arc::new(MockAdapter::ok("a", SourceResult::new("a")))]);
        let err = p.search("mystery", None).await.unwrap_err();
        assert_eq!(err.code(), "NO_DATA_FOUND");
    }

    #[tokio::test]
    async fn test_probe_uses_default_query() {
        let p = pipeline(vec![Arc::new(MockAdapter::ok("a", found("a", "Apple")))]);
        let status = p.probe(None).await.unwrap();
        assert_eq!(status.len(), 1);
        assert!(status[0].ok);
    }
}
