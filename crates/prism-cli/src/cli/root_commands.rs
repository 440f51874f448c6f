use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use prism_core::enums::{Bucket, Category, CollectionKind, Perspective};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the database and its indexes.
    Init,
    /// Insert documents (one JSON object or an array) into a collection.
    Put(WriteArgs),
    /// Replace documents by `_id`.
    Update(WriteArgs),
    /// Delete a document by id.
    Delete(DocumentArgs),
    /// Fetch a document by id.
    Get(DocumentArgs),
    /// Count one view of an issue.
    View(IssueIdArgs),
    /// Recompute an issue's coverage aggregates from its articles.
    Reconcile(IssueIdArgs),
    /// List issues by category, creation or last update.
    Issues(IssuesArgs),
    /// List articles of an issue or a media source, or all newest first.
    Articles(ArticlesArgs),
    /// List media sources along the perspective scale.
    Sources(SourcesArgs),
    /// Weighted text search over issues or articles.
    Search(SearchArgs),
    /// Print collection JSON Schemas, or check a document file.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct WriteArgs {
    /// issues, articles or mediaSources
    pub collection: CollectionKind,
    /// JSON file to read; stdin when omitted or `-`
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct DocumentArgs {
    /// issues, articles or mediaSources
    pub collection: CollectionKind,
    pub id: String,
}

#[derive(Clone, Debug, Args)]
pub struct IssueIdArgs {
    pub issue_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct IssuesArgs {
    /// Only this category, newest first
    #[arg(long)]
    pub category: Option<Category>,
    /// Most recently updated first
    #[arg(long, conflicts_with = "category")]
    pub updated: bool,
    /// Continuation token from the previous page
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ArticlesArgs {
    /// Articles of this issue
    #[arg(long, conflicts_with = "source")]
    pub issue: Option<String>,
    /// Only this perspective bucket of the issue
    #[arg(long, requires = "issue")]
    pub bucket: Option<Bucket>,
    /// Articles from this media source
    #[arg(long)]
    pub source: Option<String>,
    /// Continuation token from the previous page
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SourcesArgs {
    /// Only this perspective
    #[arg(long)]
    pub perspective: Option<Perspective>,
    /// Continuation token from the previous page
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SearchTarget {
    Issues,
    Articles,
}

#[derive(Clone, Debug, Args)]
pub struct SearchArgs {
    pub target: SearchTarget,
    /// Search terms
    #[arg(required = true)]
    pub text: Vec<String>,
    /// Continuation token from the previous page
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Print only this collection's schema
    pub collection: Option<CollectionKind>,
    /// Validate the documents in this JSON file instead of printing
    #[arg(long, requires = "collection")]
    pub check: Option<PathBuf>,
}
