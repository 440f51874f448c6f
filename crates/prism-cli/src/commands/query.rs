use prism_db::router::{ArticleQuery, IssueOrder, IssueQuery, MediaSourceQuery, PageRequest};
use prism_db::service::NewsService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{ArticlesArgs, IssuesArgs, SearchArgs, SearchTarget, SourcesArgs};
use crate::output::output;

fn page_request(flags: &GlobalFlags, token: Option<&str>) -> PageRequest {
    PageRequest {
        limit: flags.limit,
        token: token.map(str::to_string),
    }
}

/// Handle `prism issues`.
pub async fn handle_issues(
    args: &IssuesArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let query = match (args.category, args.updated) {
        (Some(category), _) => IssueQuery::ByCategory(category),
        (None, true) => IssueQuery::Recent(IssueOrder::Updated),
        (None, false) => IssueQuery::Recent(IssueOrder::Created),
    };
    let page = service
        .query_issues(&query, &page_request(flags, args.token.as_deref()))
        .await?;
    output(&page, flags.format)
}

/// Handle `prism articles`.
pub async fn handle_articles(
    args: &ArticlesArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let query = match (&args.issue, &args.source) {
        (Some(issue_id), _) => ArticleQuery::ByIssue {
            issue_id: issue_id.clone(),
            bucket: args.bucket,
        },
        (None, Some(source_id)) => ArticleQuery::BySource(source_id.clone()),
        (None, None) => ArticleQuery::Recent,
    };
    let page = service
        .query_articles(&query, &page_request(flags, args.token.as_deref()))
        .await?;
    output(&page, flags.format)
}

/// Handle `prism sources`.
pub async fn handle_sources(
    args: &SourcesArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let query = MediaSourceQuery {
        perspective: args.perspective,
    };
    let page = service
        .query_media_sources(&query, &page_request(flags, args.token.as_deref()))
        .await?;
    output(&page, flags.format)
}

/// Handle `prism search`.
pub async fn handle_search(
    args: &SearchArgs,
    service: &NewsService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let text = args.text.join(" ");
    let request = page_request(flags, args.token.as_deref());
    match args.target {
        SearchTarget::Issues => {
            let page = service
                .query_issues(&IssueQuery::Search(text), &request)
                .await?;
            output(&page, flags.format)
        }
        SearchTarget::Articles => {
            let page = service
                .query_articles(&ArticleQuery::Search(text), &request)
                .await?;
            output(&page, flags.format)
        }
    }
}
