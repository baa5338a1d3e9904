//! GS1 barcode registry adapter
//!
//! Only article-number queries (8/12/13/14-digit GTINs) are looked up; any
//! other query is `NotFound` without touching the network.
//!
//! # API
//! `GET {endpoint}/gtins/{gtin}`, optional `APIKey` header
//!
//! Registry records carry language-tagged values
//! (`[{"language":"en","value":".."}]`); plain strings are accepted too.

use super::{http_client, rate_limiter, status_error, transport_error, DirectRateLimiter};
use crate::types::{AdapterError, SourceAdapter};
use async_trait::async_trait;
use psf_common::config::Gs1Settings;
use psf_common::{Query, SourceResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const CITATION: &str = "gs1.org";

/// GS1 adapter
pub struct Gs1Adapter {
    api_key: Option<String>,
    endpoint: String,
    http_client: Client,
    rate_limiter: DirectRateLimiter,
}

impl Gs1Adapter {
    pub fn new(settings: &Gs1Settings, timeout: Duration) -> Result<Self, AdapterError> {
        Ok(Self {
            api_key: settings.api_key.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            http_client: http_client(timeout)?,
            rate_limiter: rate_limiter(settings.requests_per_second),
        })
    }
}

#[async_trait]
impl SourceAdapter for Gs1Adapter {
    fn id(&self) -> &'static str {
        "gs1"
    }

    async fn search(&self, query: &Query) -> Result<SourceResult, AdapterError> {
        let gtin = query.gtin().ok_or_else(|| {
            AdapterError::NotFound(format!("GS1 lookup needs an 8, 12, 13 or 14 digit GTIN, got '{}'", query.text))
        })?;

        self.rate_limiter.until_ready().await;

        debug!(gtin = %gtin, "Querying GS1 registry");

        let mut request = self.http_client.get(format!("{}/gtins/{}", self.endpoint, gtin));
        if let Some(key) = &self.api_key {
            request = request.header("APIKey", key);
        }

        let response = request.send().await.map_err(|e| transport_error("GS1", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("GS1", status, &body));
        }

        let body = response.text().await.map_err(|e| transport_error("GS1", e))?;
        parse_response(self.id(), &gtin, &body)
    }
}

/// Translate a registry record into a `SourceResult`
fn parse_response(source: &str, gtin: &str, body: &str) -> Result<SourceResult, AdapterError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| AdapterError::MalformedResponse(format!("GS1 response is not valid JSON: {}", e)))?;

    // Some registry front-ends wrap the record in a one-element array
    let record = match parsed {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::NotFound(format!("GS1 has no record for {}", gtin)))?,
        Value::Object(_) => parsed,
        _ => return Err(AdapterError::MalformedResponse("GS1 record is not an object".to_string())),
    };

    let mut result = SourceResult::new(source);
    result.brand = record.get("brandName").and_then(localized);
    result.model = record.get("productDescription").and_then(localized);
    result.category = record
        .get("gpcCategoryDescription")
        .or_else(|| record.get("gpcCategoryName"))
        .and_then(localized);

    if let Some(code) = record.get("gpcCategoryCode").and_then(localized) {
        result.insert_spec("gpc_category_code", code);
    }
    if let Some(licensee) = record.get("licenseeName").and_then(localized) {
        result.insert_spec("licensee", licensee);
    }
    if let Some(Value::Array(contents)) = record.get("netContent") {
        let parts: Vec<String> = contents
            .iter()
            .filter_map(|c| {
                let value = c.get("value").and_then(localized)?;
                match c.get("unitCode").and_then(localized) {
                    Some(unit) => Some(format!("{} {}", value, unit)),
                    None => Some(value),
                }
            })
            .collect();
        if !parts.is_empty() {
            result.insert_spec("net_content", parts.join(", "));
        }
    }
    if let Some(Value::Array(countries)) = record.get("countryOfSaleCode") {
        let codes: Vec<String> = countries
            .iter()
            .filter_map(|c| c.get("alpha2").or_else(|| c.get("value")).and_then(localized))
            .collect();
        if !codes.is_empty() {
            result.insert_spec("country_of_sale", codes.join(", "));
        }
    }

    // The registry answers with a bare shell for unknown prefixes
    let mut result = result.sanitized();
    if result.is_empty() {
        return Err(AdapterError::NotFound(format!("GS1 record for {} has no product data", gtin)));
    }

    result.insert_spec("gtin", gtin);
    result.insert_spec("identification_standard", "GS1 GTIN");
    if record.get("isComplete").and_then(Value::as_bool) == Some(true) {
        result.insert_spec("gs1_verified", "Yes");
    }
    result.citations = vec![CITATION.to_string()];

    Ok(result)
}

/// Pick the English entry of a language-tagged list, else the first entry
fn localized(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let english = items
                .iter()
                .find(|i| i.get("language").and_then(Value::as_str).map(|l| l.starts_with("en")) == Some(true));
            english.or_else(|| items.first()).and_then(|i| match i {
                Value::Object(_) => i.get("value").and_then(localized),
                other => localized(other),
            })
        }
        Value::Object(_) => value.get("value").and_then(localized),
        _ => None,
    }
}
