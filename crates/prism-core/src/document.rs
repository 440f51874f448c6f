//! A validated document of any collection.

use serde::Serialize;

use crate::entities::{Article, Issue, MediaSource};
use crate::enums::CollectionKind;

/// Output of schema validation: a typed document tagged by its collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Issue(Issue),
    Article(Article),
    MediaSource(MediaSource),
}

impl Document {
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        match self {
            Self::Issue(_) => CollectionKind::Issues,
            Self::Article(_) => CollectionKind::Articles,
            Self::MediaSource(_) => CollectionKind::MediaSources,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Issue(i) => &i.id,
            Self::Article(a) => &a.id,
            Self::MediaSource(m) => &m.id,
        }
    }
}

impl From<Issue> for Document {
    fn from(value: Issue) -> Self {
        Self::Issue(value)
    }
}

impl From<Article> for Document {
    fn from(value: Article) -> Self {
        Self::Article(value)
    }
}

impl From<MediaSource> for Document {
    fn from(value: MediaSource) -> Self {
        Self::MediaSource(value)
    }
}
