//! Nearest-neighbour index over unit-normalized mentor vectors.
//!
//! [`VectorIndex`] is the seam the builder and query engine program against;
//! [`FlatIpIndex`] is the exact, brute-force inner-product backend. The
//! mentor population is small enough that an exhaustive scan beats the
//! bookkeeping of an approximate structure, and it keeps results exact.

use std::cmp::Ordering;
use std::path::Path;

use rayon::prelude::*;

use crate::vector::{
    IndexLabel, MmapVectorStorage, Neighbor, Score, VectorDimension, VectorError, inner_product,
};

/// Rows below this count are scored on the calling thread.
const PARALLEL_THRESHOLD: usize = 4096;

/// Capability set of a vector index backend.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Dimension every stored vector has.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Number of stored vectors.
    #[must_use]
    fn len(&self) -> usize;

    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends unit-normalized vectors, returning the labels they were given.
    ///
    /// Labels continue densely from the current length.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<Vec<IndexLabel>, VectorError>;

    /// Returns up to `k` neighbours of `query` by descending inner product.
    ///
    /// Ties are broken by ascending label so results are deterministic.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError>;
}

/// Exact inner-product index holding all rows in one contiguous buffer.
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl FlatIpIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Borrows the stored row for `label`.
    #[must_use]
    pub fn vector(&self, label: IndexLabel) -> Option<&[f32]> {
        let dim = self.dimension.get();
        let start = label.as_index().checked_mul(dim)?;
        self.data.get(start..start + dim)
    }

    /// Persists the index to a vector file.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        MmapVectorStorage::write(path, self.dimension, &self.data)?;
        Ok(())
    }

    /// Loads an index previously written with [`FlatIpIndex::save`].
    pub fn load(path: &Path) -> Result<Self, VectorError> {
        let storage = MmapVectorStorage::open(path)?;
        Ok(Self {
            dimension: storage.dimension(),
            data: storage.read_all(),
        })
    }

    fn score_rows(&self, query: &[f32]) -> Vec<(usize, f32)> {
        let dim = self.dimension.get();
        if self.len() >= PARALLEL_THRESHOLD {
            self.data
                .par_chunks_exact(dim)
                .enumerate()
                .map(|(i, row)| (i, inner_product(query, row)))
                .collect()
        } else {
            self.data
                .chunks_exact(dim)
                .enumerate()
                .map(|(i, row)| (i, inner_product(query, row)))
                .collect()
        }
    }
}

fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

impl VectorIndex for FlatIpIndex {
    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<Vec<IndexLabel>, VectorError> {
        for vector in vectors {
            self.dimension.validate_vector(vector)?;
        }

        let start = self.len();
        let end = start + vectors.len();
        if end > u32::MAX as usize {
            return Err(VectorError::CapacityExceeded(end));
        }

        self.data.reserve(vectors.len() * self.dimension.get());
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }

        Ok((start..end)
            .filter_map(IndexLabel::from_index)
            .collect())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.dimension.validate_vector(query)?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self.score_rows(query);
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        scored
            .into_iter()
            .map(|(i, raw)| {
                let label = IndexLabel::from_index(i).ok_or(VectorError::CapacityExceeded(i))?;
                let score = Score::new(raw.clamp(-1.0, 1.0))?;
                Ok(Neighbor::new(label, score))
            })
            .collect()
    }
}
