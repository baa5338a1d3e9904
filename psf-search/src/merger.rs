//! Result Merger
//!
//! Combines the per-source results for one query into a single
//! [`ProductRecord`].
//!
//! # Merge Policy
//! Input order is priority order (earliest wins ties):
//! - Scalar fields: first non-empty value
//! - Specifications: union of keys, first source's value on collision
//! - Sources: ids of results that contributed at least one field, de-duplicated
//! - Citations: citations of contributing results, de-duplicated, in order

use crate::types::SearchError;
use psf_common::{ProductRecord, SourceResult};
use tracing::debug;

/// Merge results in priority order
///
/// `query_text` is only used for the error message.
///
/// # Errors
/// `NoDataFound` when no result carries a brand, a model or a specification
pub fn merge(results: Vec<SourceResult>, query_text: &str) -> Result<ProductRecord, SearchError> {
    let results: Vec<SourceResult> = results.into_iter().map(SourceResult::sanitized).collect();

    let mut record = ProductRecord::default();
    let mut contributed = vec![false; results.len()];

    take_first(&results, &mut contributed, &mut record.brand, |r| r.brand.as_ref());
    take_first(&results, &mut contributed, &mut record.model, |r| r.model.as_ref());
    take_first(&results, &mut contributed, &mut record.category, |r| r.category.as_ref());
    take_first(&results, &mut contributed, &mut record.price_range, |r| r.price_range.as_ref());
    take_first(&results, &mut contributed, &mut record.availability, |r| r.availability.as_ref());

    for (idx, result) in results.iter().enumerate() {
        for (key, value) in &result.specifications {
            if !record.specifications.contains_key(key) {
                record.specifications.insert(key.clone(), value.clone());
                contributed[idx] = true;
            }
        }
    }

    if record.brand.is_none() && record.model.is_none() && record.specifications.is_empty() {
        return Err(SearchError::NoDataFound(query_text.to_string()));
    }

    for (result, _) in results.iter().zip(&contributed).filter(|(_, c)| **c) {
        if !record.sources.contains(&result.source) {
            record.sources.push(result.source.clone());
        }
        for citation in &result.citations {
            if !record.citations.contains(citation) {
                record.citations.push(citation.clone());
            }
        }
    }

    debug!(
        input_count = results.len(),
        sources = ?record.sources,
        spec_count = record.specifications.len(),
        "Merge complete"
    );

    Ok(record)
}

/// Fill `slot` from the first result that has a value; mark that result as contributing
fn take_first<F>(
    results: &[SourceResult],
    contributed: &mut [bool],
    slot: &mut Option<String>,
    field: F,
) where
    F: Fn(&SourceResult) -> Option<&String>,
{
    if let Some((idx, value)) = results
        .iter()
        .enumerate()
        .find_map(|(idx, r)| field(r).map(|v| (idx, v)))
    {
        *slot = Some(value.clone());
        contributed[idx] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(source: &str) -> SourceResult {
        SourceResult::new(source)
    }

    #[test]
    fn test_single_result_passes_through() {
        let mut r = result("gemini");
        r.brand = Some("Apple".into());
        r.model = Some("iPhone 15 Pro".into());
        r.insert_spec("display", "6.1-inch OLED");

        let record = merge(vec![r], "iPhone 15 Pro").unwrap();

        assert_eq!(record.brand.as_deref(), Some("Apple"));
        assert_eq!(record.model.as_deref(), Some("iPhone 15 Pro"));
        assert_eq!(record.specifications.len(), 1);
        assert_eq!(record.specifications["display"], "6.1-inch OLED");
        assert_eq!(record.category, None);
        assert_eq!(record.sources, vec!["gemini".to_string()]);
    }

    #[test]
    fn test_complementary_results_combine_in_priority_order() {
        let mut first = result("icecat");
        first.price_range = Some("$999-$1499".into());

        let mut second = result("gemini");
        second.price_range = Some(String::new());
        second.insert_spec("display", "6.1-inch OLED");
        second.insert_spec("chip", "A17 Pro");

        let record = merge(vec![first, second], "iPhone 15 Pro").unwrap();

        assert_eq!(record.price_range.as_deref(), Some("$999-$1499"));
        assert_eq!(record.specifications.len(), 2);
        assert_eq!(record.sources, vec!["icecat".to_string(), "gemini".to_string()]);
    }

    #[test]
    fn test_first_source_wins_conflicts() {
        let mut first = result("icecat");
        first.brand = Some("Dell".into());
        first.insert_spec("refresh_rate", "60 Hz");

        let mut second = result("gemini");
        second.brand = Some("Dell Technologies".into());
        second.insert_spec("refresh_rate", "60Hz");
        second.insert_spec("panel_type", "IPS");

        let record = merge(vec![first, second], "Dell P2422H").unwrap();

        assert_eq!(record.brand.as_deref(), Some("Dell"));
        assert_eq!(record.specifications["refresh_rate"], "60 Hz");
        assert_eq!(record.specifications["panel_type"], "IPS");
    }

    #[test]
    fn test_non_contributing_source_not_attributed() {
        let mut first = result("icecat");
        first.brand = Some("Dell".into());
        first.model = Some("P2422H".into());
        first.citations = vec!["icecat.biz".into()];

        let mut second = result("gs1");
        second.brand = Some("Dell Inc".into());
        second.citations = vec!["gs1.org".into()];

        let record = merge(vec![first, second], "Dell P2422H").unwrap();

        assert_eq!(record.sources, vec!["icecat".to_string()]);
        assert_eq!(record.citations, vec!["icecat.biz".to_string()]);
    }

    #[test]
    fn test_duplicate_source_ids_collapse() {
        let mut first = result("demo");
        first.brand = Some("Sony".into());
        first.citations = vec!["sony.com".into()];
        let mut second = result("demo");
        second.model = Some("WH-1000XM5".into());
        second.citations = vec!["sony.com".into(), "rtings.com".into()];

        let record = merge(vec![first, second], "Sony WH-1000XM5").unwrap();

        assert_eq!(record.sources, vec!["demo".to_string()]);
        assert_eq!(record.citations, vec!["sony.com".to_string(), "rtings.com".to_string()]);
    }

    #[test]
    fn test_all_empty_fails_with_no_data_found() {
        let mut priced = result("gemini");
        priced.price_range = Some("$10".into());
        let inputs = vec![result("icecat"), priced, result("gs1")];

        let err = merge(inputs, "mystery").unwrap_err();
        assert_eq!(err, SearchError::NoDataFound("mystery".into()));
    }

    #[test]
    fn test_no_results_fails_with_no_data_found() {
        assert_eq!(merge(Vec::new(), "x").unwrap_err().code(), "NO_DATA_FOUND");
    }

    #[test]
    fn test_placeholders_do_not_win() {
        let mut first = result("gemini");
        first.brand = Some("Unknown".into());
        first.model = Some("N/A".into());

        let mut second = result("icecat");
        second.brand = Some("Samsung".into());
        second.model = Some("Galaxy S24".into());

        let record = merge(vec![first, second], "galaxy").unwrap();

        assert_eq!(record.brand.as_deref(), Some("Samsung"));
        assert_eq!(record.sources, vec!["icecat".to_string()]);
    }
}
