use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use prism_core::enums::CollectionKind;
use prism_db::outcome::IntegrityWarning;
use prism_db::service::NewsService;
use serde::Serialize;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{DocumentArgs, WriteArgs};
use crate::output::output;

#[derive(Debug, Serialize)]
struct DeleteResponse<'a> {
    collection: CollectionKind,
    deleted: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<IntegrityWarning>,
}

/// Read one JSON object or an array of objects from `file`, or stdin when
/// `file` is absent or `-`.
pub fn read_documents(file: Option<&Path>) -> anyhow::Result<Vec<Value>> {
    let raw = match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    parse_documents(&raw)
}

fn parse_documents(raw: &str) -> anyhow::Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw).context("input is not valid JSON")? {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        other => bail!("expected a JSON object or array, got {other}"),
    }
}

/// Handle `prism put`.
pub async fn handle_put(
    args: &WriteArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let documents = read_documents(args.file.as_deref())?;
    let mut outcomes = Vec::with_capacity(documents.len());
    for (i, document) in documents.iter().enumerate() {
        let outcome = service
            .insert(args.collection, document)
            .await
            .with_context(|| format!("document #{i} was not inserted"))?;
        outcomes.push(outcome);
    }
    output(&outcomes, flags.format)
}

/// Handle `prism update`.
pub async fn handle_update(
    args: &WriteArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let documents = read_documents(args.file.as_deref())?;
    let mut outcomes = Vec::with_capacity(documents.len());
    for (i, document) in documents.iter().enumerate() {
        let outcome = service
            .update(args.collection, document)
            .await
            .with_context(|| format!("document #{i} was not updated"))?;
        outcomes.push(outcome);
    }
    output(&outcomes, flags.format)
}

/// Handle `prism delete`.
pub async fn handle_delete(
    args: &DocumentArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let warnings = service.delete(args.collection, &args.id).await?;
    output(
        &DeleteResponse {
            collection: args.collection,
            deleted: &args.id,
            warnings,
        },
        flags.format,
    )
}

/// Handle `prism get`.
pub async fn handle_get(
    args: &DocumentArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let document = service.get(args.collection, &args.id).await?;
    output(&document, flags.format)
}
