//! Closed enumerations for Prism documents.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`,
//! except [`CollectionKind`], which serializes with the collection names used on
//! the wire (`issues`, `articles`, `mediaSources`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string does not name a variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Topic category shared by issues and articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Politics,
    Economy,
    Society,
    Culture,
    International,
    Environment,
}

impl Category {
    pub const ALL: [Self; 6] = [
        Self::Politics,
        Self::Economy,
        Self::Society,
        Self::Culture,
        Self::International,
        Self::Environment,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Politics => "politics",
            Self::Economy => "economy",
            Self::Society => "society",
            Self::Culture => "culture",
            Self::International => "international",
            Self::Environment => "environment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Perspective
// ---------------------------------------------------------------------------

/// Political leaning of a media source, on an ordered seven-point scale.
///
/// ```text
/// far_left < left < center_left < center < center_right < right < far_right
/// ```
///
/// The derived `Ord` follows the scale; [`Perspective::rank`] is the ordinal
/// persisted by the store so that index order matches scale order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    FarLeft,
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
    FarRight,
}

impl Perspective {
    pub const ALL: [Self; 7] = [
        Self::FarLeft,
        Self::Left,
        Self::CenterLeft,
        Self::Center,
        Self::CenterRight,
        Self::Right,
        Self::FarRight,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FarLeft => "far_left",
            Self::Left => "left",
            Self::CenterLeft => "center_left",
            Self::Center => "center",
            Self::CenterRight => "center_right",
            Self::Right => "right",
            Self::FarRight => "far_right",
        }
    }

    /// Position on the scale, `0` (far left) through `6` (far right).
    #[must_use]
    pub const fn rank(self) -> i64 {
        match self {
            Self::FarLeft => 0,
            Self::Left => 1,
            Self::CenterLeft => 2,
            Self::Center => 3,
            Self::CenterRight => 4,
            Self::Right => 5,
            Self::FarRight => 6,
        }
    }

    /// Inverse of [`Perspective::rank`].
    #[must_use]
    pub const fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            0 => Some(Self::FarLeft),
            1 => Some(Self::Left),
            2 => Some(Self::CenterLeft),
            3 => Some(Self::Center),
            4 => Some(Self::CenterRight),
            5 => Some(Self::Right),
            6 => Some(Self::FarRight),
            _ => None,
        }
    }

    /// The coverage-spectrum bucket this perspective is counted under.
    #[must_use]
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::FarLeft | Self::Left => Bucket::Left,
            Self::CenterLeft | Self::Center | Self::CenterRight => Bucket::Center,
            Self::Right | Self::FarRight => Bucket::Right,
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Perspective {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "perspective",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// Three-way grouping of perspectives used by an issue's coverage spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Left,
    Center,
    Right,
}

impl Bucket {
    pub const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Inclusive range of perspective ranks that fall in this bucket.
    ///
    /// Buckets are contiguous on the scale, so a bucket filter is a single
    /// range over the persisted rank.
    #[must_use]
    pub const fn rank_range(self) -> (i64, i64) {
        match self {
            Self::Left => (Perspective::FarLeft.rank(), Perspective::Left.rank()),
            Self::Center => (Perspective::CenterLeft.rank(), Perspective::CenterRight.rank()),
            Self::Right => (Perspective::Right.rank(), Perspective::FarRight.rank()),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "bucket",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// CollectionKind
// ---------------------------------------------------------------------------

/// The three document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CollectionKind {
    #[serde(rename = "issues")]
    Issues,
    #[serde(rename = "articles")]
    Articles,
    #[serde(rename = "mediaSources")]
    MediaSources,
}

impl CollectionKind {
    pub const ALL: [Self; 3] = [Self::Issues, Self::Articles, Self::MediaSources];

    /// Collection name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Articles => "articles",
            Self::MediaSources => "mediaSources",
        }
    }

    /// Backing SQL table.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Articles => "articles",
            Self::MediaSources => "media_sources",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issues" | "issue" => Ok(Self::Issues),
            "articles" | "article" => Ok(Self::Articles),
            "mediaSources" | "media_sources" | "media-sources" | "sources" => {
                Ok(Self::MediaSources)
            }
            other => Err(UnknownVariant {
                kind: "collection",
                value: other.to_string(),
            }),
        }
    }
}
