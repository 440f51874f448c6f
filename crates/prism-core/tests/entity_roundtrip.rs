//! Serde roundtrip and JsonSchema validation tests for all document types.

use chrono::{TimeZone, Utc};
use schemars::schema_for;
use prism_core::document::Document;
use prism_core::entities::*;
use prism_core::enums::*;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            // Serde roundtrip
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            // Schema validation
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn full_issue() -> Issue {
    Issue {
        id: "iss-001".into(),
        title: "Budget negotiations stall".into(),
        category: Some(Category::Economy),
        summary: "Parliament fails to agree on the annual budget.".into(),
        image_url: Some("https://img.example/budget.png".into()),
        keywords: vec!["budget".into(), "parliament".into()],
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        updated_at: Some(Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap()),
        left_summary: Some("Cuts hurt welfare.".into()),
        center_summary: None,
        right_summary: Some("Spending is out of control.".into()),
        bias_comparison: None,
        view: 42,
        coverage_spectrum: CoverageSpectrum::from_counts(2, 1, 3),
        left_keywords: vec!["welfare".into()],
        center_keywords: vec![],
        right_keywords: vec!["deficit".into()],
    }
}

roundtrip_and_validate!(issue_roundtrip, Issue, full_issue());

roundtrip_and_validate!(
    article_roundtrip,
    Article,
    Article {
        id: "art-001".into(),
        title: "Budget talks collapse".into(),
        url: "https://news.example/a/1".into(),
        content: "Full text".into(),
        preview: "Talks collapsed late on Friday".into(),
        source_id: "src-daily".into(),
        source: Some(EmbeddedSource {
            id: "src-daily".into(),
            name: "The Daily".into(),
            perspective: Perspective::CenterLeft,
        }),
        summary: Some("Talks collapsed.".into()),
        keywords: vec!["budget".into()],
        reporter: Some("J. Kim".into()),
        published_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap()),
        issue_id: Some("iss-001".into()),
        category: Some(Category::Economy),
        image_url: None,
        embedding: Some(vec![0.25, -0.5, 1.0]),
    }
);

roundtrip_and_validate!(
    media_source_roundtrip,
    MediaSource,
    MediaSource {
        id: "src-daily".into(),
        name: "The Daily".into(),
        perspective: Perspective::FarRight,
        description: None,
        website_url: Some("https://daily.example".into()),
        founded_year: Some(1901),
        ownership_info: Some("Daily Holdings".into()),
        created_at: None,
    }
);

#[test]
fn issue_uses_wire_field_names() {
    let json = serde_json::to_value(full_issue()).unwrap();
    let obj = json.as_object().unwrap();
    for key in [
        "_id",
        "createdAt",
        "updatedAt",
        "imageUrl",
        "leftSummary",
        "coverageSpectrum",
        "leftKeywords",
    ] {
        assert!(obj.contains_key(key), "missing wire field {key}");
    }
    assert!(!obj.contains_key("id"));
    assert!(!obj.contains_key("centerSummary"), "None fields are skipped");
}

#[test]
fn spectrum_total_is_sum() {
    let s = CoverageSpectrum::from_counts(1, 2, 3);
    assert_eq!(s.total, 6);
    assert!(s.is_consistent());
    assert_eq!(s.count(Bucket::Right), 3);
    assert!(CoverageSpectrum::default().is_consistent());
}

#[test]
fn document_reports_kind_and_id() {
    let doc = Document::from(full_issue());
    assert_eq!(doc.kind(), CollectionKind::Issues);
    assert_eq!(doc.id(), "iss-001");
}
