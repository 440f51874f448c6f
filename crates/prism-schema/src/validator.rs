//! Closed-schema validation for candidate documents.
//!
//! Each collection declares an allow-list of [`FieldSpec`]s. A document is
//! checked in six passes, in this order, and the first violation is returned:
//!
//! 1. required fields present
//! 2. JSON type conformance (dates are RFC 3339 strings)
//! 3. string length bounds, counted in Unicode scalar values
//! 4. integer bounds
//! 5. enum membership (`category`, `perspective`)
//! 6. no undeclared fields, at any nesting level
//!
//! A `null` value is treated as an absent field.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use prism_core::document::Document;
use prism_core::entities::{Article, Issue, MediaSource};
use prism_core::enums::CollectionKind;

use crate::error::{Constraint, ValidationError};

const CATEGORY_VALUES: &[&str] = &[
    "politics",
    "economy",
    "society",
    "culture",
    "international",
    "environment",
];

const PERSPECTIVE_VALUES: &[&str] = &[
    "far_left",
    "left",
    "center_left",
    "center",
    "center_right",
    "right",
    "far_right",
];

/// Path used when the violation concerns the document as a whole.
const DOCUMENT_PATH: &str = "(document)";

#[derive(Debug, Clone, Copy)]
enum FieldType {
    String,
    Int,
    Date,
    StringArray,
    NumberArray,
    Object(&'static [FieldSpec]),
    Enum(&'static [&'static str]),
}

impl FieldType {
    const fn name(self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Int => "int",
            Self::Date => "date",
            Self::StringArray => "array<string>",
            Self::NumberArray => "array<number>",
            Self::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    ty: FieldType,
    required: bool,
    /// Applies to strings, and to each item of a string array.
    min_len: usize,
    max_len: Option<usize>,
    min: Option<i64>,
    max: Option<i64>,
}

impl FieldSpec {
    const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            min_len: 0,
            max_len: None,
            min: None,
            max: None,
        }
    }

    const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            required: true,
            ..Self::optional(name, ty)
        }
    }

    const fn length(self, min: usize, max: usize) -> Self {
        Self {
            min_len: min,
            max_len: Some(max),
            ..self
        }
    }

    const fn non_empty(self) -> Self {
        Self { min_len: 1, ..self }
    }

    const fn range(self, min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..self
        }
    }
}

const SPECTRUM_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("left", FieldType::Int).range(0, u32::MAX as i64),
    FieldSpec::required("center", FieldType::Int).range(0, u32::MAX as i64),
    FieldSpec::required("right", FieldType::Int).range(0, u32::MAX as i64),
    FieldSpec::required("total", FieldType::Int).range(0, u32::MAX as i64),
];

const EMBEDDED_SOURCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("_id", FieldType::String).non_empty(),
    FieldSpec::required("name", FieldType::String).length(1, 50),
    FieldSpec::required("perspective", FieldType::Enum(PERSPECTIVE_VALUES)),
];

const ISSUE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("_id", FieldType::String).non_empty(),
    FieldSpec::required("title", FieldType::String).length(1, 200),
    FieldSpec::optional("category", FieldType::Enum(CATEGORY_VALUES)),
    FieldSpec::required("summary", FieldType::String).length(1, 500),
    FieldSpec::optional("imageUrl", FieldType::String),
    FieldSpec::optional("keywords", FieldType::StringArray).length(1, 50),
    FieldSpec::required("createdAt", FieldType::Date),
    FieldSpec::optional("updatedAt", FieldType::Date),
    FieldSpec::optional("leftSummary", FieldType::String).length(0, 500),
    FieldSpec::optional("centerSummary", FieldType::String).length(0, 500),
    FieldSpec::optional("rightSummary", FieldType::String).length(0, 500),
    FieldSpec::optional("biasComparison", FieldType::String).length(0, 500),
    FieldSpec::optional("view", FieldType::Int).range(0, i64::MAX),
    FieldSpec::optional("coverageSpectrum", FieldType::Object(SPECTRUM_FIELDS)),
    FieldSpec::optional("leftKeywords", FieldType::StringArray).length(1, 50),
    FieldSpec::optional("centerKeywords", FieldType::StringArray).length(1, 50),
    FieldSpec::optional("rightKeywords", FieldType::StringArray).length(1, 50),
];

const ARTICLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("_id", FieldType::String).non_empty(),
    FieldSpec::required("title", FieldType::String).length(1, 300),
    FieldSpec::required("url", FieldType::String),
    FieldSpec::required("content", FieldType::String),
    FieldSpec::required("preview", FieldType::String).length(1, 1000),
    FieldSpec::required("sourceId", FieldType::String).non_empty(),
    FieldSpec::optional("source", FieldType::Object(EMBEDDED_SOURCE_FIELDS)),
    FieldSpec::optional("summary", FieldType::String).length(0, 500),
    FieldSpec::optional("keywords", FieldType::StringArray).length(1, 50),
    FieldSpec::optional("reporter", FieldType::String).length(1, 50),
    FieldSpec::optional("publishedAt", FieldType::Date),
    FieldSpec::optional("issueId", FieldType::String).non_empty(),
    FieldSpec::optional("category", FieldType::Enum(CATEGORY_VALUES)),
    FieldSpec::optional("imageUrl", FieldType::String),
    FieldSpec::optional("embedding", FieldType::NumberArray),
];

const MEDIA_SOURCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("_id", FieldType::String).non_empty(),
    FieldSpec::required("name", FieldType::String).length(1, 50),
    FieldSpec::required("perspective", FieldType::Enum(PERSPECTIVE_VALUES)),
    FieldSpec::optional("description", FieldType::String).length(0, 500),
    FieldSpec::optional("websiteUrl", FieldType::String),
    FieldSpec::optional("foundedYear", FieldType::Int).range(1800, 2025),
    FieldSpec::optional("ownershipInfo", FieldType::String).length(0, 200),
    FieldSpec::optional("createdAt", FieldType::Date),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Required,
    Type,
    Length,
    Range,
    Enum,
    Unknown,
}

const PHASES: [Phase; 6] = [
    Phase::Required,
    Phase::Type,
    Phase::Length,
    Phase::Range,
    Phase::Enum,
    Phase::Unknown,
];

const fn fields_for(kind: CollectionKind) -> &'static [FieldSpec] {
    match kind {
        CollectionKind::Issues => ISSUE_FIELDS,
        CollectionKind::Articles => ARTICLE_FIELDS,
        CollectionKind::MediaSources => MEDIA_SOURCE_FIELDS,
    }
}

/// Validate a candidate document for `kind` and decode it.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, naming the field, the
/// violated constraint, and the offending value.
pub fn validate(kind: CollectionKind, document: &Value) -> Result<Document, ValidationError> {
    match kind {
        CollectionKind::Issues => validate_issue(document).map(Document::Issue),
        CollectionKind::Articles => validate_article(document).map(Document::Article),
        CollectionKind::MediaSources => {
            validate_media_source(document).map(Document::MediaSource)
        }
    }
}

/// Validate and decode an issue document.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_issue(document: &Value) -> Result<Issue, ValidationError> {
    check(CollectionKind::Issues, document)?;
    decode(CollectionKind::Issues, document)
}

/// Validate and decode an article document.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_article(document: &Value) -> Result<Article, ValidationError> {
    check(CollectionKind::Articles, document)?;
    decode(CollectionKind::Articles, document)
}

/// Validate and decode a media source document.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_media_source(document: &Value) -> Result<MediaSource, ValidationError> {
    check(CollectionKind::MediaSources, document)?;
    decode(CollectionKind::MediaSources, document)
}

/// Names of every field declared for a collection, in declaration order.
#[must_use]
pub fn declared_fields(kind: CollectionKind) -> Vec<&'static str> {
    fields_for(kind).iter().map(|f| f.name).collect()
}

fn check(kind: CollectionKind, document: &Value) -> Result<(), ValidationError> {
    let Some(obj) = document.as_object() else {
        return Err(violation(
            kind,
            DOCUMENT_PATH.to_string(),
            Constraint::Type("object"),
            Some(document),
        ));
    };
    let specs = fields_for(kind);
    for phase in PHASES {
        check_object(kind, obj, specs, "", phase)?;
    }
    Ok(())
}

fn check_object(
    kind: CollectionKind,
    obj: &Map<String, Value>,
    specs: &[FieldSpec],
    prefix: &str,
    phase: Phase,
) -> Result<(), ValidationError> {
    if phase == Phase::Unknown {
        if let Some((key, value)) = obj
            .iter()
            .find(|(key, _)| !specs.iter().any(|s| s.name == key.as_str()))
        {
            return Err(violation(
                kind,
                join(prefix, key),
                Constraint::UnknownField,
                Some(value),
            ));
        }
    }

    for spec in specs {
        let path = join(prefix, spec.name);
        match obj.get(spec.name).filter(|v| !v.is_null()) {
            Some(value) => check_value(kind, spec, value, &path, phase)?,
            None if phase == Phase::Required && spec.required => {
                return Err(violation(kind, path, Constraint::Required, None));
            }
            None => {}
        }
    }
    Ok(())
}

fn check_value(
    kind: CollectionKind,
    spec: &FieldSpec,
    value: &Value,
    path: &str,
    phase: Phase,
) -> Result<(), ValidationError> {
    match phase {
        Phase::Type => check_type(kind, spec.ty, value, path)?,
        Phase::Length => match spec.ty {
            FieldType::String => check_length(kind, spec, value, path.to_string())?,
            FieldType::StringArray => {
                for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                    check_length(kind, spec, item, format!("{path}[{i}]"))?;
                }
            }
            _ => {}
        },
        Phase::Range => {
            if let Some(n) = value.as_i64() {
                if let Some(min) = spec.min.filter(|min| n < *min) {
                    return Err(violation(
                        kind,
                        path.to_string(),
                        Constraint::Minimum(min),
                        Some(value),
                    ));
                }
                if let Some(max) = spec.max.filter(|max| n > *max) {
                    return Err(violation(
                        kind,
                        path.to_string(),
                        Constraint::Maximum(max),
                        Some(value),
                    ));
                }
            }
        }
        Phase::Enum => {
            if let FieldType::Enum(allowed) = spec.ty {
                if !value.as_str().is_some_and(|s| allowed.contains(&s)) {
                    return Err(violation(
                        kind,
                        path.to_string(),
                        Constraint::Enum(allowed),
                        Some(value),
                    ));
                }
            }
        }
        Phase::Required | Phase::Unknown => {}
    }

    if let (FieldType::Object(nested), Some(obj)) = (spec.ty, value.as_object()) {
        check_object(kind, obj, nested, path, phase)?;
    }
    Ok(())
}

fn check_type(
    kind: CollectionKind,
    ty: FieldType,
    value: &Value,
    path: &str,
) -> Result<(), ValidationError> {
    let type_error = |path: String, value: &Value| {
        violation(kind, path, Constraint::Type(ty.name()), Some(value))
    };
    let ok = match ty {
        FieldType::String | FieldType::Enum(_) => value.is_string(),
        FieldType::Int => value.as_i64().is_some(),
        FieldType::Date => value
            .as_str()
            .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
        FieldType::Object(_) => value.is_object(),
        FieldType::StringArray | FieldType::NumberArray => {
            let Some(items) = value.as_array() else {
                return Err(type_error(path.to_string(), value));
            };
            let item_ok = |v: &Value| match ty {
                FieldType::StringArray => v.is_string(),
                _ => v.is_number(),
            };
            if let Some((i, item)) = items.iter().enumerate().find(|(_, v)| !item_ok(v)) {
                return Err(type_error(format!("{path}[{i}]"), item));
            }
            true
        }
    };
    if ok {
        Ok(())
    } else {
        Err(type_error(path.to_string(), value))
    }
}

fn check_length(
    kind: CollectionKind,
    spec: &FieldSpec,
    value: &Value,
    path: String,
) -> Result<(), ValidationError> {
    let Some(s) = value.as_str() else {
        return Ok(());
    };
    let len = s.chars().count();
    if len < spec.min_len {
        return Err(violation(
            kind,
            path,
            Constraint::MinLength(spec.min_len),
            Some(value),
        ));
    }
    if let Some(max) = spec.max_len.filter(|max| len > *max) {
        return Err(violation(kind, path, Constraint::MaxLength(max), Some(value)));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(kind: CollectionKind, document: &Value) -> Result<T, ValidationError> {
    serde_json::from_value(strip_nulls(document)).map_err(|e| {
        violation(
            kind,
            DOCUMENT_PATH.to_string(),
            Constraint::Malformed(e.to_string()),
            None,
        )
    })
}

/// Drop `null` members so optional fields decode as absent.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn violation(
    kind: CollectionKind,
    field: String,
    constraint: Constraint,
    value: Option<&Value>,
) -> ValidationError {
    ValidationError {
        collection: kind,
        field,
        constraint,
        value: value.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prism_core::enums::{Category, Perspective};
    use rstest::rstest;
    use serde_json::json;

    fn issue() -> Value {
        json!({
            "_id": "iss-1",
            "title": "Election reform bill",
            "category": "politics",
            "summary": "Lawmakers debate a new election law.",
            "keywords": ["election", "reform"],
            "createdAt": "2025-04-01T10:00:00Z",
            "coverageSpectrum": {"left": 0, "center": 0, "right": 0, "total": 0},
            "view": 3
        })
    }

    fn article() -> Value {
        json!({
            "_id": "art-1",
            "title": "Reform bill passes committee",
            "url": "https://news.example/1",
            "content": "Body",
            "preview": "The bill passed",
            "sourceId": "src-1",
            "keywords": ["reform"],
            "publishedAt": "2025-04-02T08:00:00+09:00",
            "issueId": "iss-1",
            "embedding": [0.1, 2, -3.5]
        })
    }

    fn media_source() -> Value {
        json!({
            "_id": "src-1",
            "name": "Morning Herald",
            "perspective": "center_left",
            "foundedYear": 1920
        })
    }

    fn with(mut doc: Value, key: &str, value: Value) -> Value {
        doc.as_object_mut().unwrap().insert(key.to_string(), value);
        doc
    }

    fn without(mut doc: Value, key: &str) -> Value {
        doc.as_object_mut().unwrap().remove(key);
        doc
    }

    #[test]
    fn valid_documents_are_accepted() {
        let issue = validate_issue(&issue()).unwrap();
        assert_eq!(issue.category, Some(Category::Politics));
        assert_eq!(issue.view, 3);

        let article = validate_article(&article()).unwrap();
        assert_eq!(article.issue_id.as_deref(), Some("iss-1"));
        assert_eq!(article.embedding.as_deref(), Some(&[0.1, 2.0, -3.5][..]));

        let source = validate_media_source(&media_source()).unwrap();
        assert_eq!(source.perspective, Perspective::CenterLeft);
    }

    #[test]
    fn dispatch_returns_matching_document_kind() {
        for (kind, doc) in [
            (CollectionKind::Issues, issue()),
            (CollectionKind::Articles, article()),
            (CollectionKind::MediaSources, media_source()),
        ] {
            assert_eq!(validate(kind, &doc).unwrap().kind(), kind);
        }
    }

    #[rstest]
    #[case::missing_title(without(issue(), "title"), "title", Constraint::Required)]
    #[case::missing_created(without(issue(), "createdAt"), "createdAt", Constraint::Required)]
    #[case::null_summary(with(issue(), "summary", Value::Null), "summary", Constraint::Required)]
    #[case::title_not_string(with(issue(), "title", json!(7)), "title", Constraint::Type("string"))]
    #[case::bad_date(with(issue(), "createdAt", json!("yesterday")), "createdAt", Constraint::Type("date"))]
    #[case::keyword_item_type(with(issue(), "keywords", json!(["ok", 5])), "keywords[1]", Constraint::Type("string"))]
    #[case::view_float(with(issue(), "view", json!(1.5)), "view", Constraint::Type("int"))]
    #[case::empty_title(with(issue(), "title", json!("")), "title", Constraint::MinLength(1))]
    #[case::long_title(with(issue(), "title", json!("x".repeat(201))), "title", Constraint::MaxLength(200))]
    #[case::long_keyword(with(issue(), "keywords", json!(["a", "k".repeat(51)])), "keywords[1]", Constraint::MaxLength(50))]
    #[case::long_right_summary(with(issue(), "rightSummary", json!("r".repeat(501))), "rightSummary", Constraint::MaxLength(500))]
    #[case::negative_view(with(issue(), "view", json!(-1)), "view", Constraint::Minimum(0))]
    #[case::negative_spectrum(with(issue(), "coverageSpectrum", json!({"left": -1, "center": 0, "right": 0, "total": 0})), "coverageSpectrum.left", Constraint::Minimum(0))]
    #[case::bad_category(with(issue(), "category", json!("sports")), "category", Constraint::Enum(CATEGORY_VALUES))]
    #[case::unknown_field(with(issue(), "author", json!("x")), "author", Constraint::UnknownField)]
    #[case::unknown_nested(with(issue(), "coverageSpectrum", json!({"left": 0, "center": 0, "right": 0, "total": 0, "extra": 1})), "coverageSpectrum.extra", Constraint::UnknownField)]
    fn issue_violations_name_the_field(
        #[case] doc: Value,
        #[case] field: &str,
        #[case] constraint: Constraint,
    ) {
        let err = validate_issue(&doc).unwrap_err();
        assert_eq!(err.collection, CollectionKind::Issues);
        assert_eq!(err.field, field);
        assert_eq!(err.constraint, constraint);
    }

    #[rstest]
    #[case::missing_source(without(article(), "sourceId"), "sourceId", Constraint::Required)]
    #[case::missing_preview(without(article(), "preview"), "preview", Constraint::Required)]
    #[case::long_preview(with(article(), "preview", json!("p".repeat(1001))), "preview", Constraint::MaxLength(1000))]
    #[case::empty_reporter(with(article(), "reporter", json!("")), "reporter", Constraint::MinLength(1))]
    #[case::embedding_text(with(article(), "embedding", json!([0.5, "x"])), "embedding[1]", Constraint::Type("array<number>"))]
    #[case::bad_category(with(article(), "category", json!("weather")), "category", Constraint::Enum(CATEGORY_VALUES))]
    #[case::bad_embedded_perspective(with(article(), "source", json!({"_id": "s", "name": "n", "perspective": "moderate"})), "source.perspective", Constraint::Enum(PERSPECTIVE_VALUES))]
    #[case::perspective_on_article(with(article(), "perspective", json!("left")), "perspective", Constraint::UnknownField)]
    fn article_violations_name_the_field(
        #[case] doc: Value,
        #[case] field: &str,
        #[case] constraint: Constraint,
    ) {
        let err = validate_article(&doc).unwrap_err();
        assert_eq!(err.field, field);
        assert_eq!(err.constraint, constraint);
    }

    #[rstest]
    #[case::missing_perspective(without(media_source(), "perspective"), "perspective", Constraint::Required)]
    #[case::long_name(with(media_source(), "name", json!("n".repeat(51))), "name", Constraint::MaxLength(50))]
    #[case::too_old(with(media_source(), "foundedYear", json!(1799)), "foundedYear", Constraint::Minimum(1800))]
    #[case::too_new(with(media_source(), "foundedYear", json!(2026)), "foundedYear", Constraint::Maximum(2025))]
    #[case::long_ownership(with(media_source(), "ownershipInfo", json!("o".repeat(201))), "ownershipInfo", Constraint::MaxLength(200))]
    #[case::bad_perspective(with(media_source(), "perspective", json!("centrist")), "perspective", Constraint::Enum(PERSPECTIVE_VALUES))]
    #[case::category_list(with(media_source(), "category_list", json!([])), "category_list", Constraint::UnknownField)]
    fn media_source_violations_name_the_field(
        #[case] doc: Value,
        #[case] field: &str,
        #[case] constraint: Constraint,
    ) {
        let err = validate_media_source(&doc).unwrap_err();
        assert_eq!(err.field, field);
        assert_eq!(err.constraint, constraint);
    }

    #[test]
    fn checks_run_in_declared_order() {
        // Missing required field wins over an unknown field and a bad enum.
        let doc = with(with(without(issue(), "summary"), "bogus", json!(1)), "category", json!("x"));
        assert_eq!(validate_issue(&doc).unwrap_err().constraint, Constraint::Required);

        // Length wins over enum, enum wins over unknown.
        let doc = with(with(with(issue(), "title", json!("")), "category", json!("x")), "bogus", json!(1));
        assert_eq!(validate_issue(&doc).unwrap_err().field, "title");
        let doc = with(with(issue(), "category", json!("x")), "bogus", json!(1));
        assert_eq!(validate_issue(&doc).unwrap_err().field, "category");
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let korean_title = "선거".repeat(100);
        assert_eq!(korean_title.chars().count(), 200);
        assert!(korean_title.len() > 200);
        assert!(validate_issue(&with(issue(), "title", json!(korean_title))).is_ok());
    }

    #[test]
    fn error_carries_offending_value_and_message() {
        let err = validate_issue(&with(issue(), "category", json!("sports"))).unwrap_err();
        assert_eq!(err.value, Some(json!("sports")));
        let msg = err.to_string();
        assert!(msg.starts_with("issues.category must be one of"), "{msg}");
    }

    #[test]
    fn non_object_document_rejected() {
        let err = validate(CollectionKind::Articles, &json!(["not", "a", "doc"])).unwrap_err();
        assert_eq!(err.field, DOCUMENT_PATH);
        assert_eq!(err.constraint, Constraint::Type("object"));
    }

    #[test]
    fn null_optional_fields_are_absent() {
        let doc = with(with(article(), "issueId", Value::Null), "keywords", Value::Null);
        let article = validate_article(&doc).unwrap();
        assert_eq!(article.issue_id, None);
        assert!(article.keywords.is_empty());
    }

    #[test]
    fn enum_lists_match_core_enums() {
        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(categories, CATEGORY_VALUES);
        let perspectives: Vec<&str> = Perspective::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(perspectives, PERSPECTIVE_VALUES);
    }

    #[test]
    fn declared_fields_cover_typed_documents() {
        let fields = declared_fields(CollectionKind::MediaSources);
        assert_eq!(
            fields,
            vec![
                "_id",
                "name",
                "perspective",
                "description",
                "websiteUrl",
                "foundedYear",
                "ownershipInfo",
                "createdAt"
            ]
        );
    }
}
