//! Core Types and Trait Definitions for psf-search
//!
//! - [`SourceAdapter`]: one implementation per backing data source
//! - [`AdapterError`]: what a single adapter call can fail with
//! - [`SearchError`]: what a whole query (or batch) can fail with
//!
//! The merger and bulk runner only ever see these types, never vendor payloads.

use psf_common::{Query, SourceResult};
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Source Adapter Trait
// ============================================================================

/// Source adapter trait
///
/// Each adapter knows how to issue its own request and translate the vendor's
/// native response into a [`SourceResult`]. Partial upstream data is not an
/// error: a response with only brand and model is a valid result.
///
/// # Adapters
/// 1. Gemini - AI search with web-search grounding
/// 2. Icecat - product database lookup
/// 3. GS1 - barcode registry lookup
/// 4. Demo - static sample set (demo mode)
///
/// # Example
/// ```rust,ignore
/// use psf_search::types::{SourceAdapter, AdapterError};
/// use psf_common::{Query, SourceResult};
///
/// pub struct CatalogAdapter;
///
/// #[async_trait::async_trait]
/// impl SourceAdapter for CatalogAdapter {
///     fn id(&self) -> &'static str { "catalog" }
///
///     async fn search(&self, query: &Query) -> Result<SourceResult, AdapterError> {
///         let mut result = SourceResult::new(self.id());
///         result.brand = Some("Dell".into());
///         Ok(result.sanitized())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter identifier used for provenance ("gemini", "icecat", ...)
    fn id(&self) -> &'static str;

    /// Look the query up in this source
    ///
    /// # Errors
    /// Returns `AdapterError` if the lookup fails (per-adapter error isolation)
    async fn search(&self, query: &Query) -> Result<SourceResult, AdapterError>;
}

/// Adapter error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// Credential rejected by the vendor
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Vendor quota exhausted
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Vendor has no entry for the query
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vendor payload did not match the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transport failure or timeout
    #[error("Network error: {0}")]
    Network(String),
}

impl AdapterError {
    /// Only transient network failures are worth a retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Network(_))
    }
}

// ============================================================================
// Search Error
// ============================================================================

/// Error for a single query or a batch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// Empty or malformed client input; never retried
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{adapter}: authentication failed: {message}")]
    Auth { adapter: String, message: String },

    #[error("{adapter}: rate limited: {message}")]
    RateLimit { adapter: String, message: String },

    /// No enabled source knows the product
    #[error("No product found for '{0}'")]
    NotFound(String),

    /// Sources answered, but nothing usable survived the merge
    #[error("No usable product data for '{0}'")]
    NoDataFound(String),

    #[error("{adapter}: malformed response: {message}")]
    MalformedResponse { adapter: String, message: String },

    #[error("{adapter}: network error: {message}")]
    Network { adapter: String, message: String },

    /// Rejected before any adapter call
    #[error("Batch of {size} queries exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("No data sources enabled")]
    NoSourcesEnabled,
}

impl SearchError {
    /// Attribute an adapter failure to the query it was serving
    pub fn from_adapter(adapter: &str, query: &Query, error: AdapterError) -> Self {
        let adapter = adapter.to_string();
        match error {
            AdapterError::Auth(message) => SearchError::Auth { adapter, message },
            AdapterError::RateLimit(message) => SearchError::RateLimit { adapter, message },
            AdapterError::NotFound(_) => SearchError::NotFound(query.text.clone()),
            AdapterError::MalformedResponse(message) => {
                SearchError::MalformedResponse { adapter, message }
            }
            AdapterError::Network(message) => SearchError::Network { adapter, message },
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::InvalidQuery(_) => "INVALID_QUERY",
            SearchError::Auth { .. } => "AUTH_ERROR",
            SearchError::RateLimit { .. } => "RATE_LIMIT",
            SearchError::NotFound(_) => "NOT_FOUND",
            SearchError::NoDataFound(_) => "NO_DATA_FOUND",
            SearchError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            SearchError::Network { .. } => "NETWORK_ERROR",
            SearchError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            SearchError::NoSourcesEnabled => "NO_SOURCES_ENABLED",
        }
    }

    /// Serializable summary for per-item bulk reporting
    pub fn to_failure(&self) -> FailureInfo {
        FailureInfo {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Error code + message pair as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct FailureInfo {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use psf_common::QueryKind;

    fn query() -> Query {
        Query {
            text: "Dell P2422H".into(),
            kind: QueryKind::Name,
        }
    }

    #[test]
    fn test_only_network_errors_retry() {
        assert!(AdapterError::Network("timeout".into()).is_retryable());
        assert!(!AdapterError::Auth("bad key".into()).is_retryable());
        assert!(!AdapterError::RateLimit("429".into()).is_retryable());
    }

    #[test]
    fn test_adapter_error_mapping() {
        let err = SearchError::from_adapter("icecat", &query(), AdapterError::Auth("403".into()));
        assert_eq!(err.code(), "AUTH_ERROR");
        assert!(err.to_string().starts_with("icecat:"));

        let err = SearchError::from_adapter("gs1", &query(), AdapterError::NotFound("gtin".into()));
        assert_eq!(err, SearchError::NotFound("Dell P2422H".into()));
    }

    #[test]
    fn test_failure_info() {
        let info = SearchError::BatchTooLarge { size: 60, limit: 50 }.to_failure();
        assert_eq!(info.code, "BATCH_TOO_LARGE");
        assert!(info.message.contains("60"));
    }
}
