use anyhow::bail;
use prism_core::enums::CollectionKind;
use prism_schema::{SchemaError, SchemaRegistry};
use serde::Serialize;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::commands::document::read_documents;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CheckReport {
    index: usize,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    valid: bool,
    /// First rule the write path would reject on.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Findings from the exported JSON Schema.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    schema_errors: Vec<String>,
}

/// Handle `prism schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = SchemaRegistry::new();
    match (args.collection, &args.check) {
        (None, _) => output(&registry.export(), flags.format),
        (Some(kind), None) => match registry.get(kind) {
            Some(schema) => output(schema, flags.format),
            None => bail!("no schema registered for {kind}"),
        },
        (Some(kind), Some(path)) => {
            let documents = read_documents(Some(path))?;
            let reports = check_documents(&registry, kind, &documents)?;
            let failed = reports.iter().filter(|r| !r.valid).count();
            output(&reports, flags.format)?;
            if failed > 0 {
                bail!("{failed} of {} document(s) failed validation", reports.len());
            }
            Ok(())
        }
    }
}

fn check_documents(
    registry: &SchemaRegistry,
    kind: CollectionKind,
    documents: &[Value],
) -> anyhow::Result<Vec<CheckReport>> {
    documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let error = prism_schema::validate(kind, document)
                .err()
                .map(|e| e.to_string());
            let schema_errors = match registry.validate(kind, document) {
                Ok(()) => Vec::new(),
                Err(SchemaError::ValidationFailed { errors }) => errors,
                Err(e) => return Err(e.into()),
            };
            Ok(CheckReport {
                index,
                id: document
                    .get("_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                valid: error.is_none(),
                error,
                schema_errors,
            })
        })
        .collect()
}
