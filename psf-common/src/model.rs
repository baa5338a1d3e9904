//! Domain model shared by the search service and its tests
//!
//! - [`Query`]: a trimmed, type-tagged product query
//! - [`SourceResult`]: what one data source returned for one query (partial)
//! - [`ProductRecord`]: the merged record handed to presentation/export

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Values vendors use to mean "no data". Compared case-insensitively after trimming.
const PLACEHOLDER_VALUES: &[&str] = &["", "n/a", "na", "unknown", "none", "null", "-", "not available", "not found"];

/// What kind of identifier the query text is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Free-text product name ("Sony WH-1000XM5 headphones")
    Name,
    /// Manufacturer model number ("P2422H")
    Model,
    /// Article number / GTIN barcode ("0194252707050")
    ArticleNumber,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Name => "name",
            QueryKind::Model => "model",
            QueryKind::ArticleNumber => "article_number",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical product query
///
/// Only built by the query normalizer, so `text` is never empty and carries no
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub kind: QueryKind,
}

impl Query {
    /// GTIN digits when the query is an article number (spaces and dashes removed)
    pub fn gtin(&self) -> Option<String> {
        if self.kind != QueryKind::ArticleNumber {
            return None;
        }
        gtin_digits(&self.text)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.kind)
    }
}

/// Strip spaces and dashes; return the digits if they form a valid GTIN length (8/12/13/14)
pub fn gtin_digits(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let valid_len = matches!(cleaned.len(), 8 | 12 | 13 | 14);
    if valid_len && cleaned.chars().all(|c| c.is_ascii_digit()) {
        Some(cleaned)
    } else {
        None
    }
}

/// True when a vendor value carries no information
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    PLACEHOLDER_VALUES
        .iter()
        .any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Trim a vendor value, mapping placeholders to `None`
pub fn clean_value(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        if is_placeholder(&v) {
            None
        } else {
            Some(v.trim().to_string())
        }
    })
}

/// Turn a vendor feature name into a specification key ("Display diagonal" → "display_diagonal")
pub fn spec_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Raw parsed output of one source adapter for one query
///
/// Any field may be missing. Adapters fill public fields and call
/// [`SourceResult::sanitized`] before handing the result on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    /// Adapter identifier ("gemini", "icecat", "gs1", "demo")
    pub source: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub price_range: Option<String>,
    pub availability: Option<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    /// Cited pages/domains (grounding metadata), in citation order
    #[serde(default)]
    pub citations: Vec<String>,
}

impl SourceResult {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Insert a specification, skipping empty keys and placeholder values
    pub fn insert_spec(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        let key = key.as_ref().trim();
        let value = value.as_ref();
        if key.is_empty() || is_placeholder(value) {
            return;
        }
        self.specifications
            .insert(key.to_string(), value.trim().to_string());
    }

    /// Trim every field and drop placeholders
    pub fn sanitized(self) -> Self {
        let mut out = SourceResult {
            source: self.source,
            brand: clean_value(self.brand),
            model: clean_value(self.model),
            category: clean_value(self.category),
            price_range: clean_value(self.price_range),
            availability: clean_value(self.availability),
            specifications: BTreeMap::new(),
            citations: Vec::new(),
        };
        for (key, value) in self.specifications {
            out.insert_spec(key, value);
        }
        for citation in self.citations {
            let citation = citation.trim();
            if !citation.is_empty() && !out.citations.iter().any(|c| c == citation) {
                out.citations.push(citation.to_string());
            }
        }
        out
    }

    /// True when the vendor returned nothing usable: no brand, model, category or specifications
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.model.is_none() && self.category.is_none() && self.specifications.is_empty()
    }
}

/// Merged, structured product record
///
/// Identified by the (brand, model) pair. Lives only for the duration of a
/// request and whatever list the client keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    /// Adapter ids that contributed at least one field, in priority order
    #[serde(default)]
    pub sources: Vec<String>,
    /// Citations of the contributing adapters, de-duplicated, in order
    #[serde(default)]
    pub citations: Vec<String>,
}
