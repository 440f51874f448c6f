//! JSON Schemas for the three collections.
//!
//! The `SchemaRegistry` builds one schema per [`CollectionKind`] from the
//! prism-core types using [`schemars::schema_for!`]. These are published for
//! external tooling; writes go through [`crate::validator`], which enforces the
//! same contract with field-level error reporting.

use std::collections::HashMap;

use prism_core::entities::{Article, Issue, MediaSource};
use prism_core::enums::CollectionKind;
use schemars::schema_for;

use crate::error::SchemaError;

pub struct SchemaRegistry {
    schemas: HashMap<CollectionKind, serde_json::Value>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(CollectionKind::Issues, schema_for!(Issue).to_value());
        schemas.insert(CollectionKind::Articles, schema_for!(Article).to_value());
        schemas.insert(
            CollectionKind::MediaSources,
            schema_for!(MediaSource).to_value(),
        );
        Self { schemas }
    }

    /// Schema for one collection.
    #[must_use]
    pub fn get(&self, kind: CollectionKind) -> Option<&serde_json::Value> {
        self.schemas.get(&kind)
    }

    /// All schemas keyed by wire collection name, for export.
    #[must_use]
    pub fn export(&self) -> serde_json::Map<String, serde_json::Value> {
        CollectionKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.get(kind)
                    .map(|schema| (kind.as_str().to_string(), schema.clone()))
            })
            .collect()
    }

    /// Validate a JSON value against a collection's schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Generation` if the schema fails to compile, or
    /// `SchemaError::ValidationFailed` if validation produces errors.
    pub fn validate(
        &self,
        kind: CollectionKind,
        instance: &serde_json::Value,
    ) -> Result<(), SchemaError> {
        let schema = self
            .get(kind)
            .ok_or_else(|| SchemaError::Generation(format!("no schema for {kind}")))?;

        let validator = jsonschema::validator_for(schema)
            .map_err(|e| SchemaError::Generation(format!("{e}")))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { errors })
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_collection_has_a_schema() {
        let reg = SchemaRegistry::new();
        for kind in CollectionKind::ALL {
            assert!(reg.get(kind).is_some(), "missing schema for {kind}");
        }
        let exported = reg.export();
        assert_eq!(exported.len(), 3);
        assert!(exported.contains_key("mediaSources"));
    }

    #[test]
    fn schemas_are_closed() {
        let reg = SchemaRegistry::new();
        for kind in CollectionKind::ALL {
            let schema = reg.get(kind).unwrap();
            assert_eq!(schema["additionalProperties"], json!(false), "{kind}");
        }
    }

    #[test]
    fn validate_valid_media_source() {
        let reg = SchemaRegistry::new();
        let doc = json!({"_id": "src-1", "name": "Herald", "perspective": "left"});
        assert!(reg.validate(CollectionKind::MediaSources, &doc).is_ok());
    }

    #[test]
    fn validate_rejects_invalid_enum() {
        let reg = SchemaRegistry::new();
        let doc = json!({"_id": "src-1", "name": "Herald", "perspective": "moderate"});
        let result = reg.validate(CollectionKind::MediaSources, &doc);
        if let Err(SchemaError::ValidationFailed { errors }) = result {
            assert!(!errors.is_empty());
        } else {
            panic!("Expected ValidationFailed");
        }
    }

    #[test]
    fn validate_rejects_missing_required_field() {
        let reg = SchemaRegistry::new();
        let doc = json!({"_id": "iss-1", "title": "t", "createdAt": "2025-01-01T00:00:00Z"});
        assert!(reg.validate(CollectionKind::Issues, &doc).is_err());
    }
}
