use anyhow::Context;
use prism_config::PrismConfig;
use prism_db::service::NewsService;

use crate::cli::GlobalFlags;

/// Layered configuration with `.env` support; `--db` wins over every layer.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<PrismConfig> {
    let mut config = PrismConfig::load_with_dotenv().context("failed to load configuration")?;
    if let Some(path) = &flags.db {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

pub async fn open_service(config: &PrismConfig) -> anyhow::Result<NewsService> {
    NewsService::open(config)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))
}
