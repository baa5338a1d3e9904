//! Query Normalizer
//!
//! Turns raw user input into a canonical [`Query`]: trimmed and type-tagged.
//! Case and punctuation are kept as typed; downstream sources do their own
//! fuzzy matching.

use crate::types::SearchError;
use psf_common::model::gtin_digits;
use psf_common::{Query, QueryKind};

/// Normalize a raw query string
///
/// # Errors
/// `InvalidQuery` when the input is empty or whitespace-only
pub fn normalize(raw: &str, kind: Option<QueryKind>) -> Result<Query, SearchError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SearchError::InvalidQuery(
            "query is empty".to_string(),
        ));
    }

    let kind = kind.unwrap_or_else(|| detect_kind(text));

    Ok(Query {
        text: text.to_string(),
        kind,
    })
}

/// Infer the query kind from its shape
///
/// - 8/12/13/14 digits (spaces and dashes allowed) → article number (GTIN)
/// - one token containing a digit → model number
/// - anything else → product name
pub fn detect_kind(text: &str) -> QueryKind {
    if gtin_digits(text).is_some() {
        return QueryKind::ArticleNumber;
    }

    let single_token = !text.chars().any(char::is_whitespace);
    if single_token && text.chars().any(|c| c.is_ascii_digit()) {
        return QueryKind::Model;
    }

    QueryKind::Name
}
