//! Bulk search
//!
//! Runs a list of queries through the [`SearchPipeline`] with bounded
//! concurrency. One failed item never aborts the rest, and the report keeps
//! input order.

use crate::pipeline::SearchPipeline;
use crate::types::{FailureInfo, SearchError};
use futures::stream::{self, StreamExt};
use psf_common::ProductRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Per-item outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Ok { record: ProductRecord },
    Error { error: FailureInfo },
}

/// One input query and what became of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItem {
    pub query: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

impl BulkItem {
    pub fn record(&self) -> Option<&ProductRecord> {
        match &self.outcome {
            ItemOutcome::Ok { record } => Some(record),
            ItemOutcome::Error { .. } => None,
        }
    }
}

/// Result of a bulk run, items in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    pub batch_id: Uuid,
    pub items: Vec<BulkItem>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkReport {
    /// Records of the successful items, in input order
    pub fn records(&self) -> Vec<ProductRecord> {
        self.items.iter().filter_map(|i| i.record().cloned()).collect()
    }
}

/// Bulk runner
pub struct BulkRunner {
    pipeline: Arc<SearchPipeline>,
    batch_limit: usize,
    concurrency: usize,
}

impl BulkRunner {
    pub fn new(pipeline: Arc<SearchPipeline>, batch_limit: usize, concurrency: usize) -> Self {
        Self {
            pipeline,
            batch_limit,
            concurrency: concurrency.max(1),
        }
    }

    /// Search every query
    ///
    /// # Errors
    /// `BatchTooLarge` when the list exceeds the batch limit; no adapter is
    /// called in that case
    pub async fn run(&self, queries: Vec<String>) -> Result<BulkReport, SearchError> {
        if queries.len() > self.batch_limit {
            return Err(SearchError::BatchTooLarge {
                size: queries.len(),
                limit: self.batch_limit,
            });
        }

        let batch_id = Uuid::new_v4();
        let total = queries.len();
        let started = Instant::now();
        info!(batch_id = %batch_id, total, concurrency = self.concurrency, "Starting bulk search");

        let pipeline = &self.pipeline;
        let items: Vec<BulkItem> = stream::iter(queries.into_iter().enumerate())
            .map(|(index, query)| async move {
                let outcome = match pipeline.search(&query, None).await {
                    Ok(record) => ItemOutcome::Ok { record },
                    Err(e) => ItemOutcome::Error { error: e.to_failure() },
                };
                debug!(
                    batch_id = %batch_id,
                    item = index + 1,
                    total,
                    ok = matches!(outcome, ItemOutcome::Ok { .. }),
                    "Bulk item finished"
                );
                BulkItem { query, outcome }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let succeeded = items.iter().filter(|i| i.record().is_some()).count();
        let failed = items.len() - succeeded;

        info!(
            batch_id = %batch_id,
            succeeded,
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Bulk search complete"
        );

        Ok(BulkReport {
            batch_id,
            items,
            succeeded,
            failed,
        })
    }
}

/// Split free-form bulk input into queries
///
/// A JSON array is taken element by element (strings verbatim, other scalars
/// stringified). Anything else is read one query per line; blank lines are
/// skipped.
pub fn parse_bulk_input(text: &str) -> Vec<String> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        return items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect();
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::demo::DemoAdapter;
    use crate::adapters::mock::MockAdapter;
    use crate::adapters::AdapterSet;
    use crate::types::SourceAdapter;
    use psf_common::SourceResult;
    use std::time::Duration;

    fn demo_runner(limit: usize, concurrency: usize) -> BulkRunner {
        let set = AdapterSet::new(vec![Arc::new(DemoAdapter::new())], Duration::from_millis(1));
        BulkRunner::new(Arc::new(SearchPipeline::new(set)), limit, concurrency)
    }

    #[tokio::test]
    async fn test_order_kept_with_invalid_item_in_middle() {
        for concurrency in [1, 4] {
            let runner = demo_runner(50, concurrency);
            let queries = vec!["iPhone 15 Pro".to_string(), "   ".to_string(), "Dell P2422H".to_string()];

            let report = runner.run(queries).await.unwrap();

            assert_eq!(report.items.len(), 3);
            assert_eq!(report.items[0].query, "iPhone 15 Pro");
            assert_eq!(report.items[0].record().unwrap().brand.as_deref(), Some("Apple"));
            match &report.items[1].outcome {
                ItemOutcome::Error { error } => assert_eq!(error.code, "INVALID_QUERY"),
                other => panic!("expected failure, got {:?}", other),
            }
            assert_eq!(report.items[2].record().unwrap().brand.as_deref(), Some("Dell"));
            assert_eq!(report.succeeded, 2);
            assert_eq!(report.failed, 1);
        }
    }

    #[tokio::test]
    async fn test_batch_too_large_calls_no_adapter() {
        let mut result = SourceResult::new("mock");
        result.brand = Some("Dell".into());
        let mock = Arc::new(MockAdapter::ok("mock", result));
        let adapter: Arc<dyn SourceAdapter> = mock.clone();
        let set = AdapterSet::new(vec![adapter], Duration::from_millis(1));
        let runner = BulkRunner::new(Arc::new(SearchPipeline::new(set)), 2, 2);

        let err = runner
            .run(vec!["a".into(), "b".into(), "c".into()])
            .await
            .unwrap_err();

        assert_eq!(err, SearchError::BatchTooLarge { size: 3, limit: 2 });
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = demo_runner(50, 2).run(Vec::new()).await.unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.succeeded + report.failed, 0);
    }

    #[tokio::test]
    async fn test_report_round_trips_through_json() {
        let report = demo_runner(50, 2)
            .run(vec!["AirPods Pro".into(), "Nokia 3310".into()])
            .await
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][0]["status"], "ok");
        assert_eq!(json["items"][1]["status"], "error");
        assert_eq!(json["items"][1]["error"]["code"], "NOT_FOUND");

        let back: BulkReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
        assert_eq!(back.records().len(), 1);
    }

    #[test]
    fn test_parse_lines_skips_blanks() {
        let queries = parse_bulk_input("iPhone 15 Pro\n\n  Dell P2422H  \r\n\t\nTesla Model 3");
        assert_eq!(queries, vec!["iPhone 15 Pro", "Dell P2422H", "Tesla Model 3"]);
    }

    #[test]
    fn test_parse_json_array() {
        let queries = parse_bulk_input(r#"["Sony WH-1000XM5", 1234567890123, null, "AirPods Pro"]"#);
        assert_eq!(queries, vec!["Sony WH-1000XM5", "1234567890123", "AirPods Pro"]);
    }

    #[test]
    fn test_parse_json_object_falls_back_to_lines() {
        let queries = parse_bulk_input(r#"{"query": "x"}"#);
        assert_eq!(queries, vec![r#"{"query": "x"}"#]);
    }
}
