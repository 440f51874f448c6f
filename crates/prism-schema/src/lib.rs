//! # prism-schema
//!
//! Write-time schema enforcement for Prism collections.
//!
//! This crate provides:
//! - [`validate`]: the ordered, fail-fast allow-list validator every write
//!   passes through before reaching storage
//! - [`SchemaRegistry`]: JSON Schemas generated from the prism-core types for
//!   export to external tooling
//!
//! ## Architecture
//!
//! Document types are defined in `prism-core` with `#[derive(JsonSchema)]`.
//! The validator works on raw `serde_json::Value` input so that a rejection can
//! name the exact field and constraint, then hands back a typed
//! [`prism_core::document::Document`].

pub mod error;
pub mod registry;
pub mod validator;

pub use error::{Constraint, SchemaError, ValidationError};
pub use registry::SchemaRegistry;
pub use validator::{validate, validate_article, validate_issue, validate_media_source};
