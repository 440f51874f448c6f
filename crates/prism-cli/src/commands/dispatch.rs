use prism_config::PrismConfig;
use prism_db::service::NewsService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    service: &NewsService,
    config: &PrismConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Init => commands::init::handle(config, flags),
        Commands::Put(args) => commands::document::handle_put(&args, service, flags).await,
        Commands::Update(args) => commands::document::handle_update(&args, service, flags).await,
        Commands::Delete(args) => commands::document::handle_delete(&args, service, flags).await,
        Commands::Get(args) => commands::document::handle_get(&args, service, flags).await,
        Commands::View(args) => commands::issue::handle_view(&args, service, flags).await,
        Commands::Reconcile(args) => {
            commands::issue::handle_reconcile(&args, service, flags).await
        }
        Commands::Issues(args) => commands::query::handle_issues(&args, service, flags).await,
        Commands::Articles(args) => commands::query::handle_articles(&args, service, flags).await,
        Commands::Sources(args) => commands::query::handle_sources(&args, service, flags).await,
        Commands::Search(args) => commands::query::handle_search(&args, service, flags).await,
        Commands::Schema(_) => unreachable!("schema is pre-dispatched in main"),
    }
}
