use prism_db::service::NewsService;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::IssueIdArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ViewResponse<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    view: u64,
}

/// Handle `prism view`.
pub async fn handle_view(
    args: &IssueIdArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let view = service.increment_view(&args.issue_id).await?;
    output(
        &ViewResponse {
            id: &args.issue_id,
            view,
        },
        flags.format,
    )
}

/// Handle `prism reconcile`.
pub async fn handle_reconcile(
    args: &IssueIdArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let outcome = service.reconcile_issue(&args.issue_id).await?;
    output(&outcome, flags.format)
}
