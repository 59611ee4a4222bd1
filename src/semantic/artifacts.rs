//! On-disk layout of published index generations.
//!
//! ```text
//! <index_path>/
//!   CURRENT                  # name of the served generation
//!   generations/
//!     <gen>/                 # mentor_index.vec, mentor_meta.json, manifest.json
//!     <gen>.partial/         # build in progress, never read
//! ```
//!
//! A generation becomes visible only when `CURRENT` is atomically replaced
//! to name it, so readers always open a matched (index, metadata) pair.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::error::{MentorError, MentorResult};

/// Pointer file naming the served generation.
pub const CURRENT_FILE: &str = "CURRENT";

const GENERATIONS_DIR: &str = "generations";
const PARTIAL_SUFFIX: &str = ".partial";

/// Partials younger than this may belong to a build in another process.
pub const DEFAULT_PARTIAL_EXPIRY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    index_file: String,
    meta_file: String,
    keep_generations: usize,
    partial_expiry: Duration,
}

/// A generation directory being written by a build.
#[derive(Debug)]
pub struct PendingGeneration {
    id: String,
    dir: PathBuf,
}

impl PendingGeneration {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore {
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        index_file: impl Into<String>,
        meta_file: impl Into<String>,
        keep_generations: usize,
    ) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
            meta_file: meta_file.into(),
            keep_generations: keep_generations.max(1),
            partial_expiry: DEFAULT_PARTIAL_EXPIRY,
        }
    }

    /// Age after which an abandoned `.partial` directory is deleted.
    #[must_use]
    pub fn with_partial_expiry(mut self, expiry: Duration) -> Self {
        self.partial_expiry = expiry;
        self
    }

    /// Store rooted at `root` with the default artifact names.
    #[must_use]
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, "mentor_index.vec", "mentor_meta.json", 2)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    #[must_use]
    pub fn meta_file(&self) -> &str {
        &self.meta_file
    }

    fn generations_root(&self) -> PathBuf {
        self.root.join(GENERATIONS_DIR)
    }

    #[must_use]
    pub fn generation_dir(&self, id: &str) -> PathBuf {
        self.generations_root().join(id)
    }

    /// Name of the served generation, if any build has been published.
    pub fn current_generation(&self) -> MentorResult<Option<String>> {
        let path = self.root.join(CURRENT_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let id = contents.trim();
                if id.is_empty() {
                    Err(MentorError::IndexCorrupted {
                        reason: format!("'{}' is empty", path.display()),
                    })
                } else {
                    Ok(Some(id.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(MentorError::FileRead { path, source }),
        }
    }

    /// Directory of the served generation.
    ///
    /// Fails with [`MentorError::IndexNotFound`] before the first build.
    pub fn current_dir(&self) -> MentorResult<PathBuf> {
        let id = self
            .current_generation()?
            .ok_or_else(|| MentorError::IndexNotFound {
                path: self.root.clone(),
            })?;
        let dir = self.generation_dir(&id);
        if !dir.is_dir() {
            return Err(MentorError::IndexCorrupted {
                reason: format!("current generation '{id}' is missing from disk"),
            });
        }
        Ok(dir)
    }

    /// Published generations, oldest first.
    pub fn generations(&self) -> MentorResult<Vec<String>> {
        let mut ids = self.list_generation_dirs()?;
        ids.retain(|id| !id.ends_with(PARTIAL_SUFFIX));
        ids.sort();
        Ok(ids)
    }

    /// Creates a fresh `.partial` directory for a build.
    ///
    /// Expired leftovers from crashed builds are removed first.
    pub fn begin(&self) -> MentorResult<PendingGeneration> {
        self.clean_partials()?;

        let root = self.generations_root();
        std::fs::create_dir_all(&root).map_err(|source| MentorError::FileWrite {
            path: root.clone(),
            source,
        })?;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S-%6f").to_string();
        let mut id = stamp.clone();
        let mut attempt = 1;
        loop {
            let dir = self.generation_dir(&format!("{id}{PARTIAL_SUFFIX}"));
            // create_dir fails on an existing name, so concurrent builds never share one
            let taken = self.generation_dir(&id).exists();
            match (taken, std::fs::create_dir(&dir)) {
                (false, Ok(())) => {
                    tracing::debug!(
                        generation = %id,
                        dir = %dir.display(),
                        "started generation"
                    );
                    return Ok(PendingGeneration { id, dir });
                }
                (true, Ok(())) => {
                    let _ = std::fs::remove_dir(&dir);
                }
                (_, Err(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                (_, Err(source)) => return Err(MentorError::FileWrite { path: dir, source }),
            }
            id = format!("{stamp}-{attempt}");
            attempt += 1;
        }
    }

    /// Makes a completed generation the served one and prunes old ones.
    pub fn publish(&self, pending: PendingGeneration) -> MentorResult<String> {
        let final_dir = self.generation_dir(&pending.id);
        std::fs::rename(&pending.dir, &final_dir).map_err(|source| MentorError::FileWrite {
            path: final_dir.clone(),
            source,
        })?;
        sync_dir(&self.generations_root());

        self.write_current(&pending.id)?;
        tracing::info!(generation = %pending.id, "published generation");

        self.prune(&pending.id);
        Ok(pending.id)
    }

    /// Removes an unfinished generation.
    pub fn discard(&self, pending: PendingGeneration) {
        if let Err(e) = std::fs::remove_dir_all(&pending.dir) {
            tracing::warn!(
                dir = %pending.dir.display(),
                error = %e,
                "failed to remove partial generation"
            );
        }
    }

    fn write_current(&self, id: &str) -> MentorResult<()> {
        let path = self.root.join(CURRENT_FILE);
        let write_err = |source| MentorError::FileWrite {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(write_err)?;
        writeln!(tmp, "{id}").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        sync_dir(&self.root);
        Ok(())
    }

    fn list_generation_dirs(&self) -> MentorResult<Vec<String>> {
        let root = self.generations_root();
        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(MentorError::FileRead { path: root, source }),
        };

        Ok(entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect())
    }

    fn clean_partials(&self) -> MentorResult<()> {
        for id in self.list_generation_dirs()? {
            if !id.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            let dir = self.generation_dir(&id);
            let expired = std::fs::metadata(&dir)
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .is_some_and(|age| age >= self.partial_expiry);
            if !expired {
                tracing::debug!(dir = %dir.display(), "leaving recent partial generation");
                continue;
            }

            tracing::warn!(dir = %dir.display(), "removing leftover partial generation");
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                // Its owner finished or cleaned it up meanwhile
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(MentorError::FileWrite { path: dir, source }),
            }
        }
        Ok(())
    }

    fn prune(&self, current: &str) {
        let Ok(ids) = self.generations() else {
            return;
        };
        let excess = ids.len().saturating_sub(self.keep_generations);
        for id in ids.iter().take(excess).filter(|id| id.as_str() != current) {
            let dir = self.generation_dir(id);
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => tracing::debug!(generation = %id, "pruned generation"),
                Err(e) => {
                    tracing::warn!(generation = %id, error = %e, "failed to prune generation")
                }
            }
        }
    }
}

/// Flushes directory entries so a rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = std::fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
