//! Source Adapters
//!
//! One adapter per backing data source, each implementing
//! [`SourceAdapter`](crate::types::SourceAdapter):
//!
//! 1. **gemini** - AI search with Google Search grounding
//! 2. **icecat** - Icecat Live product database
//! 3. **gs1** - GS1 barcode registry (GTIN queries only)
//! 4. **demo** - static sample set used in demo mode
//!
//! # Concurrent Execution
//! [`AdapterSet`] runs every enabled adapter concurrently for one query and
//! hands the outcomes back in priority order. A failed adapter never blocks
//! the others. Transient network failures are retried once after a backoff.

pub mod demo;
pub mod gemini;
pub mod gs1;
pub mod icecat;

use crate::types::{AdapterError, SourceAdapter};
use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use psf_common::config::{Config, SourceKind};
use psf_common::{Query, SourceResult};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// User agent sent to every vendor
const USER_AGENT: &str = concat!("psf-search/", env!("CARGO_PKG_VERSION"));

/// Direct (unkeyed) rate limiter owned by one adapter
pub type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Build a per-second rate limiter; zero is bumped to one
pub fn rate_limiter(requests_per_second: u32) -> DirectRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rps))
}

/// Build the HTTP client shared by one adapter
///
/// `timeout` bounds every vendor call; expiry surfaces as `AdapterError::Network`.
pub fn http_client(timeout: Duration) -> Result<Client, AdapterError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| AdapterError::Network(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport-level reqwest failure
pub fn transport_error(vendor: &str, error: reqwest::Error) -> AdapterError {
    if error.is_timeout() {
        AdapterError::Network(format!("{} request timed out", vendor))
    } else if error.is_decode() {
        AdapterError::MalformedResponse(format!("{} response body unreadable: {}", vendor, error))
    } else {
        AdapterError::Network(format!("{} request failed: {}", vendor, error))
    }
}

/// Map a non-success HTTP status
///
/// 401/403 → Auth, 429 → RateLimit, 404 → NotFound. A 400 that names an
/// invalid key is an Auth error too. Anything else is unexpected vendor
/// behaviour and reported as MalformedResponse.
pub fn status_error(vendor: &str, status: StatusCode, body: &str) -> AdapterError {
    let snippet: String = body.chars().take(200).collect();
    let message = format!("{} returned {}: {}", vendor, status, snippet);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdapterError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => AdapterError::RateLimit(message),
        StatusCode::NOT_FOUND => AdapterError::NotFound(message),
        StatusCode::BAD_REQUEST if mentions_bad_key(body) => AdapterError::Auth(message),
        _ => AdapterError::MalformedResponse(message),
    }
}

fn mentions_bad_key(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("api_key_invalid") || lower.contains("api key not valid") || lower.contains("invalid api key")
}

/// Host part of a URL, without a leading "www."
pub fn domain_of(uri: &str) -> Option<String> {
    let url = reqwest::Url::parse(uri).ok()?;
    let host = url.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}

/// Run `operation`, retrying once after `backoff` if it fails with a network error
pub async fn with_retry<F, Fut, T>(adapter: &str, backoff: Duration, mut operation: F) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    match operation().await {
        Err(e) if e.is_retryable() => {
            debug!(
                adapter,
                error = %e,
                backoff_ms = backoff.as_millis() as u64,
                "Transient failure, retrying once"
            );
            tokio::time::sleep(backoff).await;
            operation().await
        }
        other => other,
    }
}

// ============================================================================
// Adapter Set
// ============================================================================

/// Outcome of one adapter for one query
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub adapter: &'static str,
    pub result: Result<SourceResult, AdapterError>,
}

/// Per-source status reported by [`AdapterSet::probe`]
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub source: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Enabled adapters in priority order
///
/// # Example
/// ```rust,ignore
/// let set = AdapterSet::new(vec![Arc::new(DemoAdapter::new())], Duration::from_millis(500));
/// let outcomes = set.search_all(&query).await;
/// for outcome in outcomes {
///     println!("{}: {:?}", outcome.adapter, outcome.result.is_ok());
/// }
/// ```
#[derive(Clone)]
pub struct AdapterSet {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    retry_backoff: Duration,
}

impl AdapterSet {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, retry_backoff: Duration) -> Self {
        Self {
            adapters,
            retry_backoff,
        }
    }

    /// Build the adapter set the configuration asks for
    ///
    /// Demo mode replaces every live source with the sample set.
    pub fn from_config(config: &Config) -> Result<Self, AdapterError> {
        let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

        if config.demo_mode {
            info!("Demo mode: using static sample data");
            adapters.push(Arc::new(demo::DemoAdapter::new()));
        } else {
            for kind in config.active_sources() {
                let adapter: Arc<dyn SourceAdapter> = match kind {
                    SourceKind::Gemini => Arc::new(gemini::GeminiAdapter::new(&config.gemini, config.request_timeout)?),
                    SourceKind::Icecat => Arc::new(icecat::IcecatAdapter::new(&config.icecat, config.request_timeout)?),
                    SourceKind::Gs1 => Arc::new(gs1::Gs1Adapter::new(&config.gs1, config.request_timeout)?),
                };
                info!(source = adapter.id(), "Source adapter enabled");
                adapters.push(adapter);
            }
        }

        Ok(Self::new(adapters, config.retry_backoff))
    }

    /// Adapter ids in priority order
    pub fn ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Query every adapter concurrently; outcomes come back in priority order
    pub async fn search_all(&self, query: &Query) -> Vec<AdapterOutcome> {
        let futures = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let backoff = self.retry_backoff;
            async move {
                let id = adapter.id();
                let result = with_retry(id, backoff, || adapter.search(query)).await;
                match &result {
                    Ok(r) => debug!(
                        adapter = id,
                        query = %query.text,
                        spec_count = r.specifications.len(),
                        "Adapter search successful"
                    ),
                    Err(e) => warn!(
                        adapter = id,
                        query = %query.text,
                        error = %e,
                        "Adapter search failed (per-adapter error isolation)"
                    ),
                }
                AdapterOutcome { adapter: id, result }
            }
        });

        join_all(futures).await
    }

    /// Run a test query against each adapter and report which ones answer
    pub async fn probe(&self, query: &Query) -> Vec<SourceStatus> {
        self.search_all(query)
            .await
            .into_iter()
            .map(|outcome| SourceStatus {
                source: outcome.adapter.to_string(),
                ok: outcome.result.is_ok(),
                error: outcome.result.err().map(|e| e.to_string()),
            })
            .collect()
    }
}

// ============================================================================
// Mock Adapter for Testing
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
