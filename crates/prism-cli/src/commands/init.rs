use prism_config::PrismConfig;
use prism_core::enums::CollectionKind;
use prism_db::indexes::indexes_for;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse<'a> {
    database: &'a str,
    indexes: Vec<&'static str>,
}

/// Handle `prism init`. Opening the service already created and verified
/// everything; this reports what exists.
pub fn handle(config: &PrismConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let indexes = CollectionKind::ALL
        .into_iter()
        .flat_map(indexes_for)
        .map(|def| def.name)
        .collect();
    output(
        &InitResponse {
            database: &config.database.path,
            indexes,
        },
        flags.format,
    )
}
