//! Semantic mentor recommendation.
//!
//! Mentor records are composed into text, embedded, normalized and stored in
//! a flat inner-product index next to a label-keyed metadata table. A
//! student profile is embedded the same way, searched with oversampling,
//! post-filtered by country and department, and trimmed to `top_k`.

pub mod config;
pub mod display;
pub mod error;
#[cfg(feature = "http-server")]
pub mod http;
pub mod io;
pub mod semantic;
pub mod service;
pub mod source;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{MentorError, MentorResult};
pub use semantic::{
    ArtifactStore, BuildLog, BuildOutcome, CountryResolver, IndexBuilder, IndexManifest,
    MetadataStore, QueryEngine, mentor_text, query_text,
};
pub use service::MentorService;
pub use source::{InMemorySource, JsonFileSource, MentorSource, SourceError};
pub use types::{
    BuildReport, BuildStatus, MentorListing, MentorRecord, QueryProfile, RecommendResponse,
    Recommendation, SearchFilters, TopK,
};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator, FlatIpIndex, IndexLabel, VectorIndex};
