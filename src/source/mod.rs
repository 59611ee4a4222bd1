//! Where mentor records come from.
//!
//! The index builder and the listing surface only see [`MentorSource`]; the
//! concrete backend is picked by the caller.

mod json;
mod memory;

pub use json::JsonFileSource;
pub use memory::InMemorySource;

use std::path::PathBuf;

use thiserror::Error;

use crate::types::MentorRecord;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Mentor export not found at '{path}'")]
    NotFound { path: PathBuf },

    #[error("Failed to read mentor export '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid mentor export '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Duplicate mentor_id {mentor_id} in '{origin}'")]
    DuplicateId { mentor_id: i64, origin: String },

    #[error("Mentor source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies mentor records in a stable order.
///
/// With `only_available` set, only mentors currently accepting mentees are
/// returned. The builder always asks for those.
pub trait MentorSource: Send + Sync {
    fn fetch_mentors(&self, only_available: bool) -> Result<Vec<MentorRecord>, SourceError>;

    /// Short human-readable origin, used in logs and `info` output.
    fn describe(&self) -> String;
}

/// Drops unavailable mentors and rejects repeated ids.
pub(crate) fn select(
    records: Vec<MentorRecord>,
    only_available: bool,
    origin: &str,
) -> Result<Vec<MentorRecord>, SourceError> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.mentor_id) {
            return Err(SourceError::DuplicateId {
                mentor_id: record.mentor_id,
                origin: origin.to_string(),
            });
        }
    }

    Ok(records
        .into_iter()
        .filter(|record| !only_available || record.availability)
        .collect())
}
