//! Manifest describing one published index generation.
//!
//! Tracks the embedding model, dimension and record count plus checksums of
//! both artifacts, so a reader can reject a generation that was built with a
//! different model or damaged after publication.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MentorError, MentorResult};
use crate::vector::VectorDimension;

/// File name of the manifest inside a generation directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Name of the embedding model used
    pub model_name: String,

    /// Dimension of embeddings
    pub dimension: VectorDimension,

    /// Number of mentors in both artifacts
    pub record_count: usize,

    pub created_at: DateTime<Utc>,

    /// Version of the manifest format
    pub version: u32,

    pub index_file: String,
    pub index_sha256: String,
    pub meta_file: String,
    pub meta_sha256: String,
}

impl IndexManifest {
    /// Current manifest version
    pub const CURRENT_VERSION: u32 = 1;

    /// Describes the artifacts already written into `dir`.
    pub fn describe(
        dir: &Path,
        model_name: String,
        dimension: VectorDimension,
        record_count: usize,
        index_file: &str,
        meta_file: &str,
    ) -> MentorResult<Self> {
        Ok(Self {
            model_name,
            dimension,
            record_count,
            created_at: Utc::now(),
            version: Self::CURRENT_VERSION,
            index_file: index_file.to_string(),
            index_sha256: sha256_file(&dir.join(index_file))?,
            meta_file: meta_file.to_string(),
            meta_sha256: sha256_file(&dir.join(meta_file))?,
        })
    }

    /// Save manifest into a generation directory and sync it.
    pub fn save(&self, dir: &Path) -> MentorResult<()> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| MentorError::Serialization {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        write().map_err(|source| MentorError::FileWrite {
            path: path.clone(),
            source,
        })
    }

    /// Load manifest from a generation directory.
    pub fn load(dir: &Path) -> MentorResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        let json = std::fs::read_to_string(&path).map_err(|source| MentorError::FileRead {
            path: path.clone(),
            source,
        })?;

        let manifest: Self =
            serde_json::from_str(&json).map_err(|e| MentorError::Serialization {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if manifest.version > Self::CURRENT_VERSION {
            return Err(MentorError::IndexCorrupted {
                reason: format!(
                    "manifest version {} is newer than supported version {}",
                    manifest.version,
                    Self::CURRENT_VERSION
                ),
            });
        }

        Ok(manifest)
    }

    /// Check if a manifest exists in `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILE).exists()
    }

    /// Recomputes both checksums and compares them with the recorded ones.
    pub fn verify(&self, dir: &Path) -> MentorResult<()> {
        for (file, expected) in [
            (&self.index_file, &self.index_sha256),
            (&self.meta_file, &self.meta_sha256),
        ] {
            let actual = sha256_file(&dir.join(file))?;
            if &actual != expected {
                return Err(MentorError::IndexCorrupted {
                    reason: format!("checksum mismatch for '{file}'"),
                });
            }
        }
        Ok(())
    }
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> MentorResult<String> {
    let read_err = |source| MentorError::FileRead {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut BufReader::new(file), &mut hasher).map_err(read_err)?;
    Ok(format!("{:x}", hasher.finalize()))
}
