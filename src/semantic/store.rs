//! Label-addressed arena of mentor records.
//!
//! On disk the store is a JSON object keyed by stringified label
//! (`{"0": {...}, "1": {...}}`), written in label order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::ser::{Serialize, Serializer};

use crate::error::{MentorError, MentorResult};
use crate::types::MentorRecord;
use crate::vector::IndexLabel;

/// Dense array of records; position `i` belongs to label `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    records: Vec<MentorRecord>,
}

impl MetadataStore {
    /// Wraps records in embedding order.
    #[must_use]
    pub fn new(records: Vec<MentorRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn get(&self, label: IndexLabel) -> Option<&MentorRecord> {
        self.records.get(label.as_index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndexLabel, &MentorRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| IndexLabel::from_index(i).map(|label| (label, record)))
    }

    /// Writes the store as pretty-printed JSON and syncs it to disk.
    pub fn save(&self, path: &Path) -> MentorResult<()> {
        let write_err = |source| MentorError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| {
            MentorError::Serialization {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        writer.write_all(b"\n").map_err(write_err)?;

        let file = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
        file.sync_all().map_err(write_err)?;
        Ok(())
    }

    /// Loads a store and checks that its labels form `0..N`.
    ///
    /// A non-numeric or repeated key is corruption; a gap in the label range
    /// is a [`MentorError::MetadataLabelMismatch`] naming the first missing
    /// label.
    pub fn load(path: &Path) -> MentorResult<Self> {
        let file = File::open(path).map_err(|source| MentorError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: HashMap<String, MentorRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| MentorError::Serialization {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut by_label: HashMap<IndexLabel, MentorRecord> = HashMap::with_capacity(raw.len());
        for (key, record) in raw {
            let label = IndexLabel::parse_key(&key).ok_or_else(|| MentorError::IndexCorrupted {
                reason: format!("metadata key '{key}' is not an index label"),
            })?;
            if by_label.insert(label, record).is_some() {
                return Err(MentorError::IndexCorrupted {
                    reason: format!("metadata label {label} appears twice"),
                });
            }
        }

        let count = by_label.len();
        let records = (0..count)
            .map(|i| {
                let label = IndexLabel::from_index(i).ok_or_else(|| MentorError::IndexCorrupted {
                    reason: format!("{count} metadata entries exceed the label range"),
                })?;
                by_label
                    .remove(&label)
                    .ok_or(MentorError::MetadataLabelMismatch { label })
            })
            .collect::<MentorResult<Vec<_>>>()?;

        Ok(Self { records })
    }
}

impl Serialize for MetadataStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(label, record)| (label.to_string(), record)))
    }
}

impl FromIterator<MentorRecord> for MetadataStore {
    fn from_iter<I: IntoIterator<Item = MentorRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
