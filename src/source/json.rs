use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{MentorSource, SourceError, select};
use crate::types::MentorRecord;

/// Reads mentors from a JSON export on every fetch.
///
/// Accepts either a bare array of records or the `{"count", "mentors"}`
/// listing shape the service itself emits.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Export {
    Records(Vec<MentorRecord>),
    Listing { mentors: Vec<MentorRecord> },
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<MentorRecord>, SourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                SourceError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let export: Export =
            serde_json::from_str(&contents).map_err(|e| SourceError::Parse {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(match export {
            Export::Records(records) | Export::Listing { mentors: records } => records,
        })
    }
}

impl MentorSource for JsonFileSource {
    fn fetch_mentors(&self, only_available: bool) -> Result<Vec<MentorRecord>, SourceError> {
        let records = self.read()?;
        tracing::debug!(
            path = %self.path.display(),
            total = records.len(),
            only_available,
            "read mentor export"
        );
        select(records, only_available, &self.describe())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
