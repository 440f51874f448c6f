//! Documents the validator accepts must also pass the exported JSON Schemas,
//! and out-of-bounds or undeclared fields are refused by both.

use pretty_assertions::assert_eq;
use rstest::rstest;
use prism_core::enums::CollectionKind;
use prism_schema::validator::declared_fields;
use prism_schema::{Constraint, SchemaRegistry, validate};
use serde_json::{Value, json};

fn samples() -> Vec<(CollectionKind, Value)> {
    vec![
        (
            CollectionKind::Issues,
            json!({
                "_id": "iss-1",
                "title": "Housing prices",
                "category": "economy",
                "summary": "Prices keep climbing.",
                "keywords": ["housing"],
                "createdAt": "2025-02-01T00:00:00Z",
                "updatedAt": "2025-02-02T00:00:00Z",
                "leftSummary": "",
                "view": 10,
                "coverageSpectrum": {"left": 1, "center": 2, "right": 0, "total": 3},
                "leftKeywords": ["rent"],
                "centerKeywords": [],
                "rightKeywords": []
            }),
        ),
        (
            CollectionKind::Articles,
            json!({
                "_id": "art-1",
                "title": "Rents up again",
                "url": "https://n.example/1",
                "content": "text",
                "preview": "Rents rose",
                "sourceId": "src-1",
                "source": {"_id": "src-1", "name": "Herald", "perspective": "far_left"},
                "keywords": ["rent"],
                "reporter": "Lee",
                "publishedAt": "2025-02-01T12:00:00Z",
                "issueId": "iss-1",
                "category": "economy",
                "embedding": [0.0, 1.0]
            }),
        ),
        (
            CollectionKind::MediaSources,
            json!({
                "_id": "src-1",
                "name": "Herald",
                "perspective": "far_left",
                "description": "Daily paper",
                "websiteUrl": "https://herald.example",
                "foundedYear": 1950,
                "ownershipInfo": "Cooperative",
                "createdAt": "2024-01-01T00:00:00Z"
            }),
        ),
    ]
}

#[test]
fn accepted_documents_pass_exported_schema() {
    let registry = SchemaRegistry::new();
    for (kind, doc) in samples() {
        let typed = validate(kind, &doc).unwrap();
        let reserialized = serde_json::to_value(&typed).unwrap();
        registry.validate(kind, &doc).unwrap();
        registry.validate(kind, &reserialized).unwrap();
    }
}

#[test]
fn unknown_fields_rejected_by_both() {
    let registry = SchemaRegistry::new();
    for (kind, mut doc) in samples() {
        doc.as_object_mut()
            .unwrap()
            .insert("surprise".into(), json!(true));
        let err = validate(kind, &doc).unwrap_err();
        assert_eq!(err.field, "surprise");
        assert_eq!(err.constraint, Constraint::UnknownField);
        assert!(registry.validate(kind, &doc).is_err(), "{kind}");
    }
}

#[test]
fn schema_properties_match_declared_fields() {
    let registry = SchemaRegistry::new();
    for kind in CollectionKind::ALL {
        let schema = registry.get(kind).unwrap();
        let mut props: Vec<&str> = schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut declared = declared_fields(kind);
        props.sort_unstable();
        declared.sort_unstable();
        assert_eq!(props, declared, "{kind}");
    }
}

fn sample(kind: CollectionKind) -> Value {
    samples()
        .into_iter()
        .find_map(|(k, doc)| (k == kind).then_some(doc))
        .unwrap()
}

#[rstest]
#[case::perspective_summary(CollectionKind::Issues, "rightSummary", json!("x".repeat(501)), "rightSummary")]
#[case::bias_comparison(CollectionKind::Issues, "biasComparison", json!("x".repeat(501)), "biasComparison")]
#[case::issue_keyword(CollectionKind::Issues, "keywords", json!(["k".repeat(51)]), "keywords[0]")]
#[case::empty_bucket_keyword(CollectionKind::Issues, "leftKeywords", json!([""]), "leftKeywords[0]")]
#[case::article_summary(CollectionKind::Articles, "summary", json!("x".repeat(501)), "summary")]
#[case::article_keyword(CollectionKind::Articles, "keywords", json!(["k".repeat(51)]), "keywords[0]")]
#[case::empty_reporter(CollectionKind::Articles, "reporter", json!(""), "reporter")]
#[case::empty_source_id(CollectionKind::Articles, "sourceId", json!(""), "sourceId")]
#[case::founded_too_early(CollectionKind::MediaSources, "foundedYear", json!(1700), "foundedYear")]
#[case::founded_too_late(CollectionKind::MediaSources, "foundedYear", json!(2026), "foundedYear")]
#[case::ownership_info(CollectionKind::MediaSources, "ownershipInfo", json!("o".repeat(201)), "ownershipInfo")]
#[case::description(CollectionKind::MediaSources, "description", json!("d".repeat(501)), "description")]
fn out_of_bounds_rejected_by_both(
    #[case] kind: CollectionKind,
    #[case] field: &str,
    #[case] value: Value,
    #[case] path: &str,
) {
    let registry = SchemaRegistry::new();
    let mut doc = sample(kind);
    doc[field] = value;

    let err = validate(kind, &doc).unwrap_err();
    assert_eq!(err.field, path);
    assert!(registry.validate(kind, &doc).is_err(), "{kind}.{field}");
}

#[test]
fn bounds_at_the_limit_accepted_by_both() {
    let registry = SchemaRegistry::new();
    let mut issue = sample(CollectionKind::Issues);
    issue["leftSummary"] = json!("x".repeat(500));
    issue["keywords"] = json!(["k".repeat(50)]);
    let mut source = sample(CollectionKind::MediaSources);
    source["foundedYear"] = json!(2025);
    source["ownershipInfo"] = json!("o".repeat(200));

    for (kind, doc) in [
        (CollectionKind::Issues, issue),
        (CollectionKind::MediaSources, source),
    ] {
        validate(kind, &doc).unwrap();
        registry.validate(kind, &doc).unwrap();
    }
}
