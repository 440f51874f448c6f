//! Document structs for the three Prism collections.
//!
//! Field names serialize in camelCase with `_id` as the identifier, matching
//! the persisted document shapes. All structs derive `Serialize`, `Deserialize`,
//! and `JsonSchema` for JSON roundtrip and schema export.

mod article;
mod issue;
mod media_source;

pub use article::{Article, EmbeddedSource};
pub use issue::{CoverageSpectrum, Issue};
pub use media_source::MediaSource;
