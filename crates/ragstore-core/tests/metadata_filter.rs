//! Tests for metadata filter validation against schemars-generated schemas.

use ragstore_core::{
    validate_metadata_filter, FilterCondition, MetadataFilter, RagstoreError,
};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Serialize, JsonSchema)]
struct ArticleMetadata {
    author: String,
    year: i64,
    rating: f64,
    published: bool,
    tags: Vec<String>,
}

#[derive(Serialize, JsonSchema)]
struct JournalInfo {
    journal: String,
    volume: i64,
}

#[derive(Serialize, JsonSchema)]
struct NestedMetadata {
    info: JournalInfo,
    category: String,
}

fn assert_validation_err(result: Result<(), RagstoreError>, needle: &str) {
    let err = result.unwrap_err();
    assert!(
        matches!(err, RagstoreError::Validation(_)),
        "expected validation error, got {err:?}"
    );
    assert!(
        err.to_string().contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn string_field_allows_eq_and_exists() {
    let eq = MetadataFilter::new("author", FilterCondition::Eq, "Ada Lovelace");
    assert!(validate_metadata_filter::<ArticleMetadata>(&eq).is_ok());

    let exists = MetadataFilter::new("author", FilterCondition::Exists, true);
    assert!(validate_metadata_filter::<ArticleMetadata>(&exists).is_ok());
}

#[test]
fn string_field_rejects_comparison() {
    let filter = MetadataFilter::new("author", FilterCondition::Gt, "A");
    assert_validation_err(
        validate_metadata_filter::<ArticleMetadata>(&filter),
        "not valid for field 'author'",
    );
}

#[test]
fn integer_field_allows_comparisons() {
    for condition in [
        FilterCondition::Eq,
        FilterCondition::Gt,
        FilterCondition::Gte,
        FilterCondition::Lt,
        FilterCondition::Lte,
        FilterCondition::Exists,
    ] {
        let filter = MetadataFilter::new("year", condition, 2023);
        assert!(
            validate_metadata_filter::<ArticleMetadata>(&filter).is_ok(),
            "condition {condition} should be valid for integer field"
        );
    }
}

#[test]
fn float_field_allows_comparisons() {
    let filter = MetadataFilter::new("rating", FilterCondition::Gte, 0.75);
    assert!(validate_metadata_filter::<ArticleMetadata>(&filter).is_ok());
}

#[test]
fn boolean_field_rejects_comparison() {
    let ok = MetadataFilter::new("published", FilterCondition::Eq, true);
    assert!(validate_metadata_filter::<ArticleMetadata>(&ok).is_ok());

    let bad = MetadataFilter::new("published", FilterCondition::Lt, true);
    assert!(validate_metadata_filter::<ArticleMetadata>(&bad).is_err());
}

#[test]
fn array_field_allows_contains_and_in() {
    let contains = MetadataFilter::new("tags", FilterCondition::Contains, "AI");
    assert!(validate_metadata_filter::<ArticleMetadata>(&contains).is_ok());

    let any_of = MetadataFilter::new(
        "tags",
        FilterCondition::In,
        serde_json::json!(["AI", "ML"]),
    );
    assert!(validate_metadata_filter::<ArticleMetadata>(&any_of).is_ok());
}

#[test]
fn array_field_rejects_eq() {
    let filter = MetadataFilter::new("tags", FilterCondition::Eq, "AI");
    assert!(validate_metadata_filter::<ArticleMetadata>(&filter).is_err());
}

#[test]
fn unknown_field_is_rejected() {
    let filter = MetadataFilter::new("publisher", FilterCondition::Eq, "ACM");
    assert_validation_err(
        validate_metadata_filter::<ArticleMetadata>(&filter),
        "not found in metadata schema",
    );
}

#[test]
fn nested_field_navigation() {
    let filter = MetadataFilter::new("info.journal", FilterCondition::Eq, "Nature");
    assert!(validate_metadata_filter::<NestedMetadata>(&filter).is_ok());

    let volume = MetadataFilter::new("info.volume", FilterCondition::Gt, 10);
    assert!(validate_metadata_filter::<NestedMetadata>(&volume).is_ok());
}

#[test]
fn nested_unknown_leaf_is_rejected() {
    let filter = MetadataFilter::new("info.issue", FilterCondition::Eq, 3);
    assert_validation_err(
        validate_metadata_filter::<NestedMetadata>(&filter),
        "not found in metadata schema",
    );
}

#[test]
fn cannot_navigate_into_scalar() {
    let filter = MetadataFilter::new("category.sub", FilterCondition::Eq, "x");
    assert_validation_err(
        validate_metadata_filter::<NestedMetadata>(&filter),
        "non-object field",
    );
}

#[test]
fn empty_path_segment_is_rejected() {
    let filter = MetadataFilter::new("info.", FilterCondition::Exists, true);
    assert!(validate_metadata_filter::<NestedMetadata>(&filter).is_err());
}
