//! Error types for the mentor recommendation engine
//!
//! Leaf layers have their own enums (`VectorError`, `SourceError`); everything
//! that reaches a caller is a [`MentorError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceError;
use crate::vector::{IndexLabel, VectorError};

/// Main error type for build and query operations
#[derive(Error, Debug)]
pub enum MentorError {
    /// No generation has ever been published
    #[error("Mentor index not found at '{path}'. Run 'mentor-rag build' first.")]
    IndexNotFound { path: PathBuf },

    /// Build-time errors
    #[error(
        "Mentor {mentor_id} (label {label}) produced a zero-length or non-finite embedding; build aborted"
    )]
    DegenerateEmbedding { label: IndexLabel, mentor_id: i64 },

    #[error("Embedding model returned {actual} vectors for {expected} texts")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// Consistency errors between the vector index and the metadata store
    #[error("Index label {label} has no metadata entry")]
    MetadataLabelMismatch { label: IndexLabel },

    #[error("Mentor index appears to be corrupted: {reason}")]
    IndexCorrupted { reason: String },

    #[error(
        "Index was built with embedding model '{found}' but '{expected}' is configured"
    )]
    ModelMismatch { expected: String, found: String },

    /// Collaborator failures
    #[error("Failed to fetch mentors: {0}")]
    UpstreamFetch(#[from] SourceError),

    #[error("Embedding model failed: {reason}")]
    UpstreamEmbedding { reason: String },

    #[error(transparent)]
    Vector(VectorError),

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize '{path}': {reason}")]
    Serialization { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },
}

impl From<VectorError> for MentorError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::EmbeddingFailed(reason) => Self::UpstreamEmbedding { reason },
            other => Self::Vector(other),
        }
    }
}

impl MentorError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            Self::DegenerateEmbedding { .. } => "DEGENERATE_EMBEDDING",
            Self::EmbeddingCountMismatch { .. } => "EMBEDDING_COUNT_MISMATCH",
            Self::MetadataLabelMismatch { .. } => "METADATA_LABEL_MISMATCH",
            Self::IndexCorrupted { .. } => "INDEX_CORRUPTED",
            Self::ModelMismatch { .. } => "MODEL_MISMATCH",
            Self::UpstreamFetch(_) => "UPSTREAM_FETCH_FAILURE",
            Self::UpstreamEmbedding { .. } => "UPSTREAM_EMBEDDING_FAILURE",
            Self::Vector(_) => "VECTOR_ERROR",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexNotFound { .. } => vec![
                "Run 'mentor-rag build' to create the first index generation",
                "Check that 'index_path' in settings points at the built index",
            ],
            Self::DegenerateEmbedding { .. } => vec![
                "Check that the mentor has descriptive fields filled in",
                "The previously published index is still being served",
            ],
            Self::IndexCorrupted { .. } | Self::MetadataLabelMismatch { .. } => vec![
                "Run 'mentor-rag build' to publish a fresh generation",
                "Check for disk errors or filesystem corruption",
            ],
            Self::ModelMismatch { .. } => vec![
                "Rebuild the index with the configured model",
                "Or set 'embedding.model' back to the model the index was built with",
            ],
            Self::UpstreamFetch(_) => vec![
                "Check that the mentor export at 'data.mentors_path' exists and is valid JSON",
            ],
            Self::UpstreamEmbedding { .. } => vec![
                "Ensure you have internet connection for first-time model download",
                "Check 'embedding.cache_dir' is writable",
            ],
            Self::FileRead { .. } | Self::FileWrite { .. } => vec![
                "Check that the path exists and you have the required permissions",
                "Check available disk space",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'mentor-rag config' to inspect the effective settings",
            ],
            _ => vec![],
        }
    }

    /// Whether the failure is an operator-recoverable "build first" state.
    #[must_use]
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::IndexNotFound { .. })
    }
}

/// Result type alias for mentor operations
pub type MentorResult<T> = Result<T, MentorError>;
