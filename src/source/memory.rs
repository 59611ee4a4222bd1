use parking_lot::RwLock;

use super::{MentorSource, SourceError, select};
use crate::types::MentorRecord;

/// Records held in memory. Replaceable at runtime.
#[derive(Debug, Default)]
pub struct InMemorySource {
    records: RwLock<Vec<MentorRecord>>,
}

impl InMemorySource {
    #[must_use]
    pub fn new(records: Vec<MentorRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn replace(&self, records: Vec<MentorRecord>) {
        *self.records.write() = records;
    }
}

impl MentorSource for InMemorySource {
    fn fetch_mentors(&self, only_available: bool) -> Result<Vec<MentorRecord>, SourceError> {
        select(self.records.read().clone(), only_available, "memory")
    }

    fn describe(&self) -> String {
        format!("in-memory ({} mentors)", self.records.read().len())
    }
}
