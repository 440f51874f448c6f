//! Schema validation error types.

use std::fmt;

use prism_core::enums::CollectionKind;
use thiserror::Error;

/// The rule a field violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A required field is absent (or null).
    Required,
    /// The value has the wrong JSON type; holds the expected type name.
    Type(&'static str),
    MinLength(usize),
    MaxLength(usize),
    Minimum(i64),
    Maximum(i64),
    /// The value is not one of the allowed enum members.
    Enum(&'static [&'static str]),
    /// The field is not declared for this collection.
    UnknownField,
    /// Passed every rule but could not be decoded into the typed document.
    Malformed(String),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::Type(expected) => write!(f, "must be of type {expected}"),
            Self::MinLength(1) => f.write_str("must not be empty"),
            Self::MinLength(n) => write!(f, "must be at least {n} characters"),
            Self::MaxLength(1) => f.write_str("must be at most 1 character"),
            Self::MaxLength(n) => write!(f, "must be at most {n} characters"),
            Self::Minimum(n) => write!(f, "must be >= {n}"),
            Self::Maximum(n) => write!(f, "must be <= {n}"),
            Self::Enum(allowed) => write!(f, "must be one of [{}]", allowed.join(", ")),
            Self::UnknownField => f.write_str("is not an allowed field"),
            Self::Malformed(reason) => write!(f, "is malformed: {reason}"),
        }
    }
}

/// A document failed validation. Never written to storage.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{collection}.{field} {constraint}")]
pub struct ValidationError {
    pub collection: CollectionKind,
    /// Dotted / indexed path, e.g. `title`, `keywords[2]`, `coverageSpectrum.left`.
    pub field: String,
    pub constraint: Constraint,
    /// The offending value, when there is one.
    pub value: Option<serde_json::Value>,
}

/// Errors from the schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// JSON value did not pass schema validation.
    #[error("Validation failed: {errors:?}")]
    ValidationFailed {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// Schema compilation error.
    #[error("Schema generation error: {0}")]
    Generation(String),
}
