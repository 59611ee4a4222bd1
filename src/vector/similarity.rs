//! Similarity primitives shared by the builder and the query engine.
//!
//! Stored vectors are always unit length, so the inner product is the cosine
//! similarity. Both paths normalize through [`normalize_l2`] so a query vector
//! and a mentor vector are never compared at different scales.

use crate::vector::VectorError;

/// Dot product of two equal-length vectors.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scales `v` in place to unit length.
///
/// Fails instead of leaving a zero vector behind: a zero vector scores 0.0
/// against everything and would silently sink a record to the bottom of
/// every ranking.
pub fn normalize_l2(v: &mut [f32]) -> Result<(), VectorError> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(VectorError::NonFinite);
    }

    let norm = l2_norm(v);
    if norm == 0.0 {
        return Err(VectorError::ZeroNorm);
    }
    if !norm.is_finite() {
        return Err(VectorError::NonFinite);
    }

    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}
