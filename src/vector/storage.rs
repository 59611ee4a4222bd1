//! Memory-mapped storage for one generation of mentor vectors.
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic `MVEC`, version, dimension, vector count
//! - Vectors: contiguous little-endian f32 rows in label order
//!
//! Rows carry no id: the row number is the [`IndexLabel`](crate::vector::IndexLabel). Files are written
//! once per build and never appended to.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use thiserror::Error;

use crate::vector::types::{VectorDimension, VectorError};

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes to identify mentor vector files.
const MAGIC_BYTES: &[u8; 4] = b"MVEC";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Errors specific to vector storage operations.
#[derive(Error, Debug)]
pub enum VectorStorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid storage format: {0}")]
    InvalidFormat(String),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}

impl From<VectorStorageError> for VectorError {
    fn from(err: VectorStorageError) -> Self {
        match err {
            VectorStorageError::Io(e) => VectorError::Storage(e),
            VectorStorageError::InvalidFormat(reason) => VectorError::InvalidFormat(reason),
            VectorStorageError::Vector(e) => e,
        }
    }
}

/// Read-only memory-mapped view over a vector file.
#[derive(Debug)]
pub struct MmapVectorStorage {
    mmap: Mmap,
    dimension: VectorDimension,
    vector_count: usize,
}

impl MmapVectorStorage {
    /// Writes `data` (row-major, `dimension` floats per row) to `path`.
    ///
    /// The file is flushed and synced before returning so a later rename of
    /// its directory publishes complete contents.
    pub fn write(
        path: impl AsRef<Path>,
        dimension: VectorDimension,
        data: &[f32],
    ) -> Result<(), VectorStorageError> {
        let dim = dimension.get();
        if data.len() % dim != 0 {
            return Err(VectorStorageError::InvalidFormat(format!(
                "{} floats is not a whole number of {dim}-dimensional rows",
                data.len()
            )));
        }
        let count = data.len() / dim;
        let count_u32 = u32::try_from(count).map_err(|_| VectorError::CapacityExceeded(count))?;
        let dim_u32 = u32::try_from(dim).map_err(|_| VectorError::InvalidDimension {
            dimension: dim,
            reason: "Vector dimension does not fit the file header",
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC_BYTES)?;
        writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
        writer.write_all(&dim_u32.to_le_bytes())?;
        writer.write_all(&count_u32.to_le_bytes())?;

        for value in data {
            writer.write_all(&value.to_le_bytes())?;
        }

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// Opens an existing vector file.
    ///
    /// Returns an error if the file doesn't exist, has a foreign header, or
    /// its length disagrees with the header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VectorStorageError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(VectorStorageError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Vector storage file not found: {path:?}"),
            )));
        }

        let file = File::open(&path)?;
        // SAFETY: generation files are immutable once published; builds write
        // into a fresh directory and never modify a mapped file.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let (version, dimension, vector_count) = Self::read_header(&mmap)?;

        if version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: version,
            }
            .into());
        }

        let expected_len = HEADER_SIZE + vector_count * dimension.get() * BYTES_PER_F32;
        if mmap.len() != expected_len {
            return Err(VectorStorageError::InvalidFormat(format!(
                "Expected {expected_len} bytes for {vector_count} vectors, found {}",
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            dimension,
            vector_count,
        })
    }

    /// Reads every row into one contiguous row-major buffer.
    #[must_use]
    pub fn read_all(&self) -> Vec<f32> {
        decode_f32s(&self.mmap[HEADER_SIZE..])
    }

    /// Returns the number of vectors stored.
    #[must_use]
    pub fn vector_count(&self) -> usize {
        self.vector_count
    }

    /// Returns the vector dimension.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn read_header(mmap: &Mmap) -> Result<(u32, VectorDimension, usize), VectorStorageError> {
        if mmap.len() < HEADER_SIZE {
            return Err(VectorStorageError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        if &mmap[0..4] != MAGIC_BYTES {
            return Err(VectorStorageError::InvalidFormat(
                "Invalid magic bytes".to_string(),
            ));
        }

        let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);

        let dim_value = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]);
        let dimension = VectorDimension::new(dim_value as usize)?;

        let vector_count = u32::from_le_bytes([mmap[12], mmap[13], mmap[14], mmap[15]]) as usize;

        Ok((version, dimension, vector_count))
    }
}

fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_vectors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.vec");
        let dimension = VectorDimension::new(4).unwrap();

        let data = vec![
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0,
        ];
        MmapVectorStorage::write(&path, dimension, &data).unwrap();

        let storage = MmapVectorStorage::open(&path).unwrap();
        assert_eq!(storage.vector_count(), 3);
        assert_eq!(storage.dimension(), dimension);
        assert_eq!(storage.read_all(), data);
        assert_eq!(&storage.read_all()[4..8], &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            (HEADER_SIZE + 12 * BYTES_PER_F32) as u64
        );
    }

    #[test]
    fn test_empty_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.vec");
        let dimension = VectorDimension::new(3).unwrap();

        MmapVectorStorage::write(&path, dimension, &[]).unwrap();
        let storage = MmapVectorStorage::open(&path).unwrap();
        assert_eq!(storage.vector_count(), 0);
        assert!(storage.read_all().is_empty());
    }

    #[test]
    fn test_ragged_data_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ragged.vec");
        let dimension = VectorDimension::new(3).unwrap();

        let result = MmapVectorStorage::write(&path, dimension, &[1.0, 2.0]);
        assert!(matches!(result, Err(VectorStorageError::InvalidFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = MmapVectorStorage::open(temp_dir.path().join("missing.vec"));
        match result {
            Err(VectorStorageError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.vec");
        let dimension = VectorDimension::new(2).unwrap();
        MmapVectorStorage::write(&path, dimension, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            MmapVectorStorage::open(&path),
            Err(VectorStorageError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.vec");
        std::fs::write(&path, b"CVEC\x01\0\0\0\x02\0\0\0\0\0\0\0").unwrap();

        assert!(matches!(
            MmapVectorStorage::open(&path),
            Err(VectorStorageError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.vec");
        std::fs::write(&path, b"MVEC\x09\0\0\0\x02\0\0\0\0\0\0\0").unwrap();

        match MmapVectorStorage::open(&path) {
            Err(VectorStorageError::Vector(VectorError::VersionMismatch { expected, actual })) => {
                assert_eq!(expected, STORAGE_VERSION);
                assert_eq!(actual, 9);
            }
            other => panic!("Expected VersionMismatch, got {other:?}"),
        }
    }
}
