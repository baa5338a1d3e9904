//! Icecat Live product database adapter
//!
//! Looks a product up by GTIN, or by brand plus manufacturer product code
//! ("Dell P2422H" → Brand=Dell, ProductCode=P2422H).
//!
//! # API
//! `GET {endpoint}?UserName=..&Language=..&GTIN=..`
//! `GET {endpoint}?UserName=..&Language=..&Brand=..&ProductCode=..`
//!
//! Optional `api-token` and `content-token` headers carry the paid-tier
//! credentials.

use super::{http_client, rate_limiter, status_error, transport_error, DirectRateLimiter};
use crate::types::{AdapterError, SourceAdapter};
use async_trait::async_trait;
use psf_common::config::IcecatSettings;
use psf_common::model::spec_key;
use psf_common::{Query, SourceResult};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CITATION: &str = "icecat.biz";

/// Icecat adapter
pub struct IcecatAdapter {
    username: String,
    api_token: Option<String>,
    content_token: Option<String>,
    language: String,
    endpoint: String,
    http_client: Client,
    rate_limiter: DirectRateLimiter,
}

/// Icecat Live response envelope
#[derive(Debug, Deserialize)]
struct IcecatResponse {
    msg: Option<String>,
    data: Option<IcecatData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IcecatData {
    general_info: Option<GeneralInfo>,
    #[serde(default)]
    features_groups: Vec<FeaturesGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GeneralInfo {
    icecat_id: Option<serde_json::Value>,
    title: Option<String>,
    brand: Option<String>,
    product_name: Option<String>,
    brand_part_code: Option<String>,
    category: Option<Category>,
    summary_description: Option<SummaryDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Category {
    name: Option<LocalizedValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocalizedValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryDescription {
    short_summary_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FeaturesGroup {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Feature {
    presentation_value: Option<String>,
    value: Option<String>,
    feature: Option<FeatureInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FeatureInfo {
    name: Option<LocalizedValue>,
}

/// How a query is sent to Icecat
#[derive(Debug, PartialEq, Eq)]
enum Lookup {
    Gtin(String),
    BrandCode { brand: String, code: String },
}

impl Lookup {
    fn from_query(query: &Query) -> Option<Self> {
        if let Some(gtin) = query.gtin() {
            return Some(Lookup::Gtin(gtin));
        }
        let (brand, code) = query.text.split_once(char::is_whitespace)?;
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        Some(Lookup::BrandCode {
            brand: brand.to_string(),
            code: code.to_string(),
        })
    }
}

impl IcecatAdapter {
    /// Create an Icecat adapter
    ///
    /// # Errors
    /// `Auth` when no username is configured
    pub fn new(settings: &IcecatSettings, timeout: Duration) -> Result<Self, AdapterError> {
        let username = settings
            .username
            .clone()
            .ok_or_else(|| AdapterError::Auth("Icecat username not configured".to_string()))?;

        Ok(Self {
            username,
            api_token: settings.api_token.clone(),
            content_token: settings.content_token.clone(),
            language: settings.language.clone(),
            endpoint: settings.endpoint.clone(),
            http_client: http_client(timeout)?,
            rate_limiter: rate_limiter(settings.requests_per_second),
        })
    }
}

#[async_trait]
impl SourceAdapter for IcecatAdapter {
    fn id(&self) -> &'static str {
        "icecat"
    }

    async fn search(&self, query: &Query) -> Result<SourceResult, AdapterError> {
        let lookup = Lookup::from_query(query).ok_or_else(|| {
            AdapterError::NotFound(format!(
                "Icecat lookup needs a GTIN or 'Brand ProductCode', got '{}'",
                query.text
            ))
        })?;

        self.rate_limiter.until_ready().await;

        let mut params: Vec<(&str, &str)> = vec![("UserName", self.username.as_str()), ("Language", self.language.as_str())];
        match &lookup {
            Lookup::Gtin(gtin) => params.push(("GTIN", gtin.as_str())),
            Lookup::BrandCode { brand, code } => {
                params.push(("Brand", brand.as_str()));
                params.push(("ProductCode", code.as_str()));
            }
        }

        debug!(lookup = ?lookup, "Querying Icecat");

        let mut request = self.http_client.get(&self.endpoint).query(&params);
        if let Some(token) = &self.api_token {
            request = request.header("api-token", token);
        }
        if let Some(token) = &self.content_token {
            request = request.header("content-token", token);
        }

        let response = request.send().await.map_err(|e| transport_error("Icecat", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("Icecat", status, &body));
        }

        let body = response.text().await.map_err(|e| transport_error("Icecat", e))?;
        parse_response(self.id(), &body)
    }
}

/// Translate an Icecat Live body into a `SourceResult`
fn parse_response(source: &str, body: &str) -> Result<SourceResult, AdapterError> {
    let response: IcecatResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::MalformedResponse(format!("Icecat response is not valid JSON: {}", e)))?;

    let data = response.data.ok_or_else(|| {
        let msg = response.msg.unwrap_or_else(|| "no data".to_string());
        AdapterError::NotFound(format!("Icecat: {}", msg))
    })?;

    let info = data
        .general_info
        .ok_or_else(|| AdapterError::MalformedResponse("Icecat response has no GeneralInfo".to_string()))?;

    let mut result = SourceResult::new(source);
    result.brand = info.brand;
    result.model = info.product_name.or(info.title);
    result.category = info.category.and_then(|c| c.name).and_then(|n| n.value);

    if let Some(code) = info.brand_part_code {
        result.insert_spec("model_code", code);
    }
    if let Some(id) = info.icecat_id {
        let id = match id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        result.insert_spec("icecat_id", id);
    }
    if let Some(summary) = info.summary_description.and_then(|s| s.short_summary_description) {
        result.insert_spec("description", summary);
    }

    for feature in data.features_groups.into_iter().flat_map(|g| g.features) {
        let name = feature.feature.and_then(|f| f.name).and_then(|n| n.value);
        let value = feature
            .presentation_value
            .filter(|v| !v.trim().is_empty())
            .or(feature.value);
        if let (Some(name), Some(value)) = (name, value) {
            let key = spec_key(&name);
            if !result.specifications.contains_key(&key) {
                result.insert_spec(key, value);
            }
        }
    }

    result.citations = vec![CITATION.to_string()];

    Ok(result.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use psf_common::QueryKind;

    #[test]
    fn test_lookup_by_gtin() {
        let q = Query {
            text: "5397184525737".into(),
            kind: QueryKind::ArticleNumber,
        };
        assert_eq!(Lookup::from_query(&q), Some(Lookup::Gtin("5397184525737".into())));
    }

    #[test]
    fn test_lookup_by_brand_and_code() {
        let q = Query {
            text: "Samsung SM-S921B ZYD".into(),
            kind: QueryKind::Name,
        };
        assert_eq!(
            Lookup::from_query(&q),
            Some(Lookup::BrandCode {
                brand: "Samsung".into(),
                code: "SM-S921B ZYD".into()
            })
        );
    }

    #[test]
    fn test_single_token_has_no_lookup() {
        let q = Query {
            text: "P2422H".into(),
            kind: QueryKind::Model,
        };
        assert_eq!(Lookup::from_query(&q), None);
    }

    #[test]
    fn test_parses_general_info_and_features() {
        let body = r#"{
            "msg": "OK",
            "data": {
                "GeneralInfo": {
                    "IcecatId": 86543210,
                    "Title": "DELL P Series P2422H",
                    "Brand": "DELL",
                    "ProductName": "P2422H",
                    "BrandPartCode": "DELL-P2422H",
                    "Category": { "CategoryID": 1584, "Name": { "Value": "Computer Monitors", "Language": "EN" } },
                    "SummaryDescription": { "ShortSummaryDescription": "DELL P2422H, 60.5 cm (23.8\"), 1920 x 1080 pixels" }
                },
                "FeaturesGroups": [
                    {
                        "FeatureGroup": { "Name": { "Value": "Display" } },
                        "Features": [
                            { "PresentationValue": "60.5 cm (23.8\")", "Value": "23.8", "Feature": { "Name": { "Value": "Display diagonal" } } },
                            { "PresentationValue": "IPS", "Feature": { "Name": { "Value": "Panel type" } } },
                            { "PresentationValue": "", "Feature": { "Name": { "Value": "HDR" } } }
                        ]
                    },
                    {
                        "Features": [
                            { "Value": "60", "Feature": { "Name": { "Value": "Refresh rate" } } }
                        ]
                    }
                ]
            }
        }"#;

        let result = parse_response("icecat", body).unwrap();

        assert_eq!(result.brand.as_deref(), Some("DELL"));
        assert_eq!(result.model.as_deref(), Some("P2422H"));
        assert_eq!(result.category.as_deref(), Some("Computer Monitors"));
        assert_eq!(result.specifications["display_diagonal"], "60.5 cm (23.8\")");
        assert_eq!(result.specifications["panel_type"], "IPS");
        assert_eq!(result.specifications["refresh_rate"], "60");
        assert_eq!(result.specifications["icecat_id"], "86543210");
        assert_eq!(result.specifications["model_code"], "DELL-P2422H");
        assert!(!result.specifications.contains_key("hdr"));
        assert_eq!(result.citations, vec!["icecat.biz".to_string()]);
    }

    #[test]
    fn test_missing_data_is_not_found() {
        let body = r#"{"msg":"The requested product is not present in the Icecat database"}"#;
        assert!(matches!(parse_response("icecat", body), Err(AdapterError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_response("icecat", "<html>oops</html>"),
            Err(AdapterError::MalformedResponse(_))
        ));
    }
}
