//! Vector layer: embeddings, normalization and nearest-neighbour search.
//!
//! Every stored vector is L2-normalized, so the inner product used by
//! [`FlatIpIndex`] equals cosine similarity. Vectors are persisted in a
//! memory-mapped flat file whose row number is the [`IndexLabel`].

mod embedding;
mod index;
mod similarity;
mod storage;
mod types;

// Re-export core types for public API
#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, SUPPORTED_MODELS, model_to_string,
    parse_embedding_model,
};
pub use index::{FlatIpIndex, VectorIndex};
pub use similarity::{inner_product, l2_norm, normalize_l2};
pub use storage::{MmapVectorStorage, VectorStorageError};
pub use types::{IndexLabel, Neighbor, Score, VECTOR_DIMENSION_384, VectorDimension, VectorError};
