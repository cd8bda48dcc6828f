//! Tests for `SearchQuery` construction and validation.

use chrono::{TimeZone, Utc};
use ragstore_core::{FilterCondition, MetadataFilter, RagstoreError, SearchQuery};

#[test]
fn semantic_query_is_valid() {
    let query = SearchQuery::semantic("what is rust", 10);
    assert_eq!(query.text.as_deref(), Some("what is rust"));
    assert_eq!(query.limit, 10);
    assert!(query.validate().is_ok());
}

#[test]
fn keyword_query_is_valid() {
    let query = SearchQuery::keyword(vec!["rust".into(), "postgres".into()], 5);
    assert!(query.validate().is_ok());
}

#[test]
fn date_range_alone_is_a_criterion() {
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
    let query = SearchQuery::new(3).with_date_range(from, to);
    assert!(query.validate().is_ok());
}

#[test]
fn metadata_filters_alone_are_a_criterion() {
    let filters = vec![MetadataFilter::new("author", FilterCondition::Eq, "Ada")];
    let query = SearchQuery::new(1).with_metadata_filters(filters);
    assert!(query.validate().is_ok());
}

#[test]
fn rejects_zero_limit() {
    let query = SearchQuery::semantic("anything", 0);
    let err = query.validate().unwrap_err();
    assert!(matches!(err, RagstoreError::Validation(_)));
}

#[test]
fn rejects_query_without_criteria() {
    let query = SearchQuery::new(10);
    let err = query.validate().unwrap_err();
    assert!(err.to_string().contains("at least one search criterion"));
}

#[test]
fn blank_text_is_not_a_criterion() {
    let query = SearchQuery::semantic("   ", 10);
    assert!(query.validate().is_err());
}

#[test]
fn empty_keyword_list_is_not_a_criterion() {
    let query = SearchQuery::keyword(vec![], 10);
    assert!(query.validate().is_err());
}

#[test]
fn builder_combines_criteria() {
    let query = SearchQuery::semantic("vector databases", 20)
        .with_keywords(vec!["pgvector".into()])
        .with_metadata_filters(vec![MetadataFilter::new(
            "year",
            FilterCondition::Gte,
            2020,
        )]);
    assert!(query.validate().is_ok());
    assert!(query.keywords.is_some());
    assert_eq!(query.metadata_filters.as_ref().unwrap().len(), 1);
}
