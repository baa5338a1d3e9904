//! Gemini AI search adapter
//!
//! Asks a Gemini model for the product's specifications with the Google
//! Search tool enabled, then reads the cited pages out of the grounding
//! metadata.
//!
//! # API
//! `POST {endpoint}/models/{model}:generateContent`, key in `x-goog-api-key`
//!
//! The search tool cannot be combined with `responseMimeType` or
//! `responseSchema`, so the answer shape is spelled out in the prompt instead.
//!
//! # Response handling
//! - Answer text is the concatenation of `candidates[0].content.parts[].text`
//! - The JSON object is cut out of the text, so ```json fences are tolerated
//! - Citations come from `groundingMetadata.groundingChunks[].web`; the
//!   model's own `sources` array is the fallback

use super::{domain_of, http_client, rate_limiter, status_error, transport_error, DirectRateLimiter};
use crate::types::{AdapterError, SourceAdapter};
use async_trait::async_trait;
use psf_common::config::GeminiSettings;
use psf_common::model::spec_key;
use psf_common::{Query, QueryKind, SourceResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Gemini adapter
pub struct GeminiAdapter {
    api_key: String,
    url: String,
    http_client: Client,
    rate_limiter: DirectRateLimiter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

impl GeminiAdapter {
    /// Create a Gemini adapter
    ///
    /// # Errors
    /// `Auth` when no API key is configured
    pub fn new(settings: &GeminiSettings, timeout: Duration) -> Result<Self, AdapterError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| AdapterError::Auth("Gemini API key not configured".to_string()))?;

        Ok(Self {
            api_key,
            url: format!(
                "{}/models/{}:generateContent",
                settings.endpoint.trim_end_matches('/'),
                settings.model
            ),
            http_client: http_client(timeout)?,
            rate_limiter: rate_limiter(settings.requests_per_second),
        })
    }

    fn request_body(query: &Query) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(query) }]
            }],
            "tools": [{ "google_search": {} }],
            "generationConfig": {
                "temperature": 0.1,
                "maxOutputTokens": 2048
            }
        })
    }
}

#[async_trait]
impl SourceAdapter for GeminiAdapter {
    fn id(&self) -> &'static str {
        "gemini"
    }

    async fn search(&self, query: &Query) -> Result<SourceResult, AdapterError> {
        self.rate_limiter.until_ready().await;

        debug!(query = %query.text, kind = %query.kind, "Querying Gemini");

        let response = self
            .http_client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(query))
            .send()
            .await
            .map_err(|e| transport_error("Gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("Gemini", status, &body));
        }

        let body = response.text().await.map_err(|e| transport_error("Gemini", e))?;
        parse_response(self.id(), &body)
    }
}

const ANSWER_SHAPE: &str = r#"{
  "brand": "string",
  "model": "string",
  "category": "string",
  "specifications": [{"name": "string", "value": "string with units"}],
  "price_range": "string",
  "availability": "string",
  "sources": ["website used"]
}"#;

fn build_prompt(query: &Query) -> String {
    let hint = match query.kind {
        QueryKind::Name => "a product name",
        QueryKind::Model => "a manufacturer model number",
        QueryKind::ArticleNumber => "an article number (GTIN/EAN barcode)",
    };

    format!(
        "Search the web for the product identified by {hint}: \"{text}\".\n\
         Answer with a single JSON object and nothing else, shaped like this:\n\
         {shape}\n\
         specifications covers the key technical specifications, price_range is the \
         current typical retail price range and sources lists the websites used.\n\
         Use information from official manufacturer pages and reputable retailers. \
         Omit any field you cannot verify instead of guessing.",
        hint = hint,
        text = query.text,
        shape = ANSWER_SHAPE
    )
}

/// Translate a `generateContent` response body into a `SourceResult`
fn parse_response(source: &str, body: &str) -> Result<SourceResult, AdapterError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::MalformedResponse(format!("Gemini response is not valid JSON: {}", e)))?;

    let candidate = match response.candidates.into_iter().next() {
        Some(c) => c,
        None => {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(AdapterError::MalformedResponse(format!("Gemini returned no answer: {}", reason)));
        }
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "empty".to_string());
        return Err(AdapterError::MalformedResponse(format!("Gemini answer has no text ({})", reason)));
    }

    let answer = extract_json_object(&text)?;

    let mut result = SourceResult::new(source);
    result.brand = string_field(&answer, "brand");
    result.model = string_field(&answer, "model");
    result.category = string_field(&answer, "category");
    result.price_range = string_field(&answer, "price_range");
    result.availability = string_field(&answer, "availability");

    match answer.get("specifications") {
        Some(Value::Object(map)) => {
            for (name, value) in map {
                if let Some(value) = scalar_text(value) {
                    result.insert_spec(spec_key(name), value);
                }
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let name = item.get("name").and_then(scalar_text);
                let value = item.get("value").and_then(scalar_text);
                if let (Some(name), Some(value)) = (name, value) {
                    result.insert_spec(spec_key(&name), value);
                }
            }
        }
        _ => {}
    }

    let grounded: Vec<String> = candidate
        .grounding_metadata
        .map(|g| {
            g.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| web.title.filter(|t| !t.trim().is_empty()).or_else(|| web.uri.as_deref().and_then(domain_of)))
                .collect()
        })
        .unwrap_or_default();

    result.citations = if grounded.is_empty() {
        match answer.get("sources") {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            _ => Vec::new(),
        }
    } else {
        grounded
    };

    Ok(result.sanitized())
}

/// Cut the outermost JSON object out of the model's answer text
fn extract_json_object(text: &str) -> Result<Value, AdapterError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let slice = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(AdapterError::MalformedResponse(
                "Gemini answer contains no JSON object".to_string(),
            ))
        }
    };

    serde_json::from_str(slice)
        .map_err(|e| AdapterError::MalformedResponse(format!("Gemini answer is not valid JSON: {}", e)))
}

fn string_field(answer: &Value, field: &str) -> Option<String> {
    answer.get(field).and_then(scalar_text)
}

/// String form of a JSON scalar; arrays of scalars are joined with ", "
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(answer_text: &str, grounding: Value) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": answer_text }], "role": "model" },
                "finishReason": "STOP",
                "groundingMetadata": grounding
            }]
        })
        .to_string()
    }

    #[test]
    fn test_parses_fenced_answer_with_grounding() {
        let answer = "```json\n{\"brand\":\"Apple\",\"model\":\"iPhone 15 Pro\",\"category\":\"Smartphone\",\
            \"specifications\":[{\"name\":\"Display\",\"value\":\"6.1-inch Super Retina XDR\"},\
            {\"name\":\"Chip\",\"value\":\"A17 Pro\"}],\"price_range\":\"$999 - $1,499\",\
            \"sources\":[\"ignored.example\"]}\n```";
        let grounding = json!({
            "groundingChunks": [
                { "web": { "uri": "https://vertexaisearch.example/redirect/1", "title": "apple.com" } },
                { "web": { "uri": "https://www.gsmarena.com/apple_iphone_15_pro.php" } }
            ]
        });

        let result = parse_response("gemini", &wrap(answer, grounding)).unwrap();

        assert_eq!(result.brand.as_deref(), Some("Apple"));
        assert_eq!(result.specifications["display"], "6.1-inch Super Retina XDR");
        assert_eq!(result.specifications["chip"], "A17 Pro");
        assert_eq!(result.citations, vec!["apple.com".to_string(), "gsmarena.com".to_string()]);
        assert_eq!(result.availability, None);
    }

    #[test]
    fn test_falls_back_to_model_sources() {
        let answer = r#"{"brand":"Sony","model":"WH-1000XM5","specifications":{"Battery Life":"30 hours","Weight":250},"sources":["sony.com","rtings.com"]}"#;
        let result = parse_response("gemini", &wrap(answer, Value::Null)).unwrap();

        assert_eq!(result.specifications["battery_life"], "30 hours");
        assert_eq!(result.specifications["weight"], "250");
        assert_eq!(result.citations, vec!["sony.com".to_string(), "rtings.com".to_string()]);
    }

    #[test]
    fn test_placeholder_fields_dropped() {
        let answer = r#"{"brand":"Not Found","model":"X1","price_range":"N/A","specifications":[]}"#;
        let result = parse_response("gemini", &wrap(answer, Value::Null)).unwrap();
        assert_eq!(result.brand, None);
        assert_eq!(result.price_range, None);
        assert_eq!(result.model.as_deref(), Some("X1"));
    }

    #[test]
    fn test_non_json_answer_is_malformed() {
        let err = parse_response("gemini", &wrap("I could not find that product.", Value::Null)).unwrap_err();
        assert!(matches!(err, AdapterError::MalformedResponse(_)));
    }

    #[test]
    fn test_blocked_prompt_is_malformed() {
        let body = r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#;
        match parse_response("gemini", body).unwrap_err() {
            AdapterError::MalformedResponse(msg) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_prompt_mentions_query_and_kind() {
        let query = Query {
            text: "0194253401735".into(),
            kind: QueryKind::ArticleNumber,
        };
        let prompt = build_prompt(&query);
        assert!(prompt.contains("0194253401735"));
        assert!(prompt.contains("GTIN"));
        assert!(prompt.contains("\"specifications\": [{\"name\""));
    }

    #[test]
    fn test_request_keeps_search_tool_without_json_mode() {
        let query = Query {
            text: "Dell P2422H".into(),
            kind: QueryKind::Name,
        };
        let body = GeminiAdapter::request_body(&query);

        assert!(body["tools"][0].get("google_search").is_some());
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_missing_key_rejected() {
        let settings = GeminiSettings {
            api_key: None,
            model: "gemini-2.0-flash".into(),
            endpoint: "http://127.0.0.1:1".into(),
            requests_per_second: 1,
        };
        assert!(matches!(
            GeminiAdapter::new(&settings, Duration::from_secs(1)),
            Err(AdapterError::Auth(_))
        ));
    }
}
