//! Type-safe wrappers and core types for the vector index.
//!
//! Labels, dimensions and scores are newtypes so that a position in the
//! metadata arena can never be confused with a mentor id or a raw float.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output dimension of the default embedding model (all-MiniLM-L6-v2).
pub const VECTOR_DIMENSION_384: usize = 384;

/// Dense position of a vector inside one index generation.
///
/// Labels are assigned `0..N` in the order records were embedded and are the
/// join key between the vector index and the metadata store. They are not
/// stable across rebuilds; `mentor_id` is the stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexLabel(u32);

impl IndexLabel {
    /// Creates a label from a position.
    #[must_use]
    pub const fn new(position: u32) -> Self {
        Self(position)
    }

    /// Creates a label from a `usize` position.
    ///
    /// Returns `None` if the position does not fit in a `u32`.
    #[must_use]
    pub fn from_index(position: usize) -> Option<Self> {
        u32::try_from(position).ok().map(Self)
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the label as an arena position.
    #[must_use]
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }

    /// Parses the stringified form used as a metadata key.
    #[must_use]
    pub fn parse_key(key: &str) -> Option<Self> {
        key.parse::<u32>().ok().map(Self)
    }
}

impl std::fmt::Display for IndexLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inner-product similarity between two unit vectors.
///
/// Conceptually in `[-1.0, 1.0]`; natural-language embeddings land in
/// `[0.0, 1.0]` in practice. A small tolerance absorbs f32 rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f32);

impl Score {
    const TOLERANCE: f32 = 1e-3;

    /// Creates a new `Score` with validation.
    ///
    /// Returns an error if the score is NaN or outside `[-1.0, 1.0]`.
    pub fn new(value: f32) -> Result<Self, VectorError> {
        if value.is_nan() {
            return Err(VectorError::InvalidScore {
                value,
                reason: "Score cannot be NaN",
            });
        }
        if !(-1.0 - Self::TOLERANCE..=1.0 + Self::TOLERANCE).contains(&value) {
            return Err(VectorError::InvalidScore {
                value,
                reason: "Score must be in range [-1.0, 1.0]",
            });
        }
        Ok(Self(value))
    }

    /// Returns the underlying f32 value.
    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Type-safe wrapper for vector dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl TryFrom<usize> for VectorDimension {
    type Error = VectorError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VectorDimension> for usize {
    fn from(value: VectorDimension) -> Self {
        value.0
    }
}

/// One entry of a k-nearest-neighbour result.
///
/// `label` is `None` when the backend signals "no neighbour" for a slot,
/// e.g. a backend that pads results when asked for more than it holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub label: Option<IndexLabel>,
    pub score: Score,
}

impl Neighbor {
    #[must_use]
    pub fn new(label: IndexLabel, score: Score) -> Self {
        Self {
            label: Some(label),
            score,
        }
    }

    /// Placeholder slot for a backend that could not fill position `k`.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            label: None,
            score: Score(-1.0),
        }
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Invalid score value: {value}\nReason: {reason}")]
    InvalidScore { value: f32, reason: &'static str },

    #[error(
        "Cannot normalize a zero-length vector\nSuggestion: The embedding model returned a degenerate embedding for this text"
    )]
    ZeroNorm,

    #[error(
        "Vector contains non-finite values\nSuggestion: The embedding model returned NaN or infinity for this text"
    )]
    NonFinite,

    #[error("Storage error: {0}\nSuggestion: Check disk space and file permissions")]
    Storage(#[from] std::io::Error),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Unknown embedding model '{0}'\nSuggestion: Use one of: {supported}",
        supported = crate::vector::SUPPORTED_MODELS.join(", ")
    )]
    UnknownModel(String),

    #[error("Invalid storage format: {0}\nSuggestion: Rebuild the mentor index")]
    InvalidFormat(String),

    #[error(
        "Index capacity exceeded: {0} vectors\nSuggestion: Labels are 32-bit; split the mentor set"
    )]
    CapacityExceeded(usize),

    #[error(
        "Invalid storage version: expected {expected}, got {actual}\nSuggestion: Rebuild the mentor index with this version"
    )]
    VersionMismatch { expected: u32, actual: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip_through_key() {
        let label = IndexLabel::new(42);
        assert_eq!(label.to_string(), "42");
        assert_eq!(IndexLabel::parse_key("42"), Some(label));
        assert_eq!(IndexLabel::parse_key("-1"), None);
        assert_eq!(IndexLabel::parse_key("abc"), None);
        assert_eq!(label.as_index(), 42);
    }

    #[test]
    fn test_label_from_index_overflow() {
        assert_eq!(IndexLabel::from_index(7), Some(IndexLabel::new(7)));
        assert!(IndexLabel::from_index(u32::MAX as usize + 1).is_none());
    }

    #[test]
    fn test_score_validation() {
        assert_eq!(Score::new(0.5).unwrap().get(), 0.5);
        assert_eq!(Score::new(-1.0).unwrap().get(), -1.0);
        assert_eq!(Score::new(1.0).unwrap().get(), 1.0);
        // f32 rounding on unit vectors can overshoot slightly
        assert!(Score::new(1.000_1).is_ok());

        assert!(Score::new(1.1).is_err());
        assert!(Score::new(-1.1).is_err());
        assert!(Score::new(f32::NAN).is_err());
    }

    #[test]
    fn test_score_ordering() {
        let mut scores = vec![
            Score::new(0.2).unwrap(),
            Score::new(0.9).unwrap(),
            Score::new(-0.3).unwrap(),
        ];
        scores.sort_by(|a, b| b.cmp(a));
        let values: Vec<f32> = scores.iter().map(Score::get).collect();
        assert_eq!(values, vec![0.9, 0.2, -0.3]);
    }

    #[test]
    fn test_vector_dimension() {
        let dim = VectorDimension::new(384).unwrap();
        assert_eq!(dim.get(), 384);
        assert_eq!(VectorDimension::dimension_384(), dim);

        assert!(VectorDimension::new(0).is_err());

        assert!(dim.validate_vector(&vec![0.1; 384]).is_ok());
        match dim.validate_vector(&vec![0.1; 100]) {
            Err(VectorError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 384);
                assert_eq!(actual, 100);
            }
            other => panic!("Expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_dimension_serde_rejects_zero() {
        let dim: VectorDimension = serde_json::from_str("8").unwrap();
        assert_eq!(dim.get(), 8);
        assert!(serde_json::from_str::<VectorDimension>("0").is_err());
    }
}
