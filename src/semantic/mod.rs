//! Mentor retrieval: index building and querying.
//!
//! The builder turns mentor records into a generation of two artifacts (a
//! flat vector file and a label-keyed metadata store) published atomically
//! through [`ArtifactStore`]. The query engine loads one generation and
//! answers recommendations against it.

mod artifacts;
mod builder;
mod engine;
mod filter;
mod manifest;
mod store;
mod text;

pub use artifacts::{ArtifactStore, CURRENT_FILE, PendingGeneration};
pub use builder::{BuildLog, BuildOutcome, IndexBuilder, PublishedGeneration};
pub use engine::QueryEngine;
pub use filter::{CountryResolver, DEFAULT_CITY_TO_COUNTRY};
pub use manifest::{IndexManifest, MANIFEST_FILE, sha256_file};
pub use store::MetadataStore;
pub use text::{LIST_SEPARATOR, SEGMENT_SEPARATOR, mentor_text, query_text};
