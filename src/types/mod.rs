//! Domain records shared by the builder, the query engine and the service
//! surfaces.

use std::num::NonZeroUsize;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::vector::IndexLabel;

/// Result count used when a caller asks for zero or a negative number.
pub const DEFAULT_TOP_K: usize = 5;

/// Candidates retrieved per requested result, so post-filters rarely starve
/// the final list.
pub const OVERSAMPLE_FACTOR: usize = 5;

/// One mentor as supplied by the data source.
///
/// `mentor_id` is the only stable identity; everything else is descriptive
/// and may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorRecord {
    pub mentor_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub current_position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Free-text city or region.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default)]
    pub availability: bool,
    #[serde(default)]
    pub max_mentees: Option<i32>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MentorRecord {
    /// Creates a record with only an id set.
    #[must_use]
    pub fn new(mentor_id: i64) -> Self {
        Self {
            mentor_id,
            name: None,
            email: None,
            graduation_year: None,
            degree: None,
            department: None,
            current_position: None,
            company: None,
            location: None,
            expertise: None,
            availability: false,
            max_mentees: None,
            created_at: None,
        }
    }
}

/// Timestamps exported by relational databases often carry no offset.
/// Those are read as UTC; RFC 3339 input keeps its offset.
mod timestamp {
    use super::*;

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
        }
    }
}

/// A student's request, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryProfile {
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_domain: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub career_goal: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
}

impl QueryProfile {
    /// Requested result count, defaulted when absent or non-positive.
    #[must_use]
    pub fn top_k(&self) -> TopK {
        TopK::from_requested(self.top_k)
    }

    /// Post-filters implied by the profile's country and department.
    #[must_use]
    pub fn filters(&self) -> SearchFilters {
        SearchFilters::new(self.country.as_deref(), self.department.as_deref())
    }
}

/// Number of results a query returns at most. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopK(NonZeroUsize);

impl TopK {
    /// Creates a `TopK`, substituting [`DEFAULT_TOP_K`] for zero.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self(NonZeroUsize::new(k).unwrap_or(Self::default_value()))
    }

    /// Interprets a caller-supplied count; absent or `<= 0` means default.
    #[must_use]
    pub fn from_requested(requested: Option<i64>) -> Self {
        match requested.and_then(|k| usize::try_from(k).ok()) {
            Some(k) => Self::new(k),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Candidate pool size retrieved before post-filtering.
    #[must_use]
    pub fn oversampled(&self) -> usize {
        self.get().saturating_mul(OVERSAMPLE_FACTOR)
    }

    const fn default_value() -> NonZeroUsize {
        match NonZeroUsize::new(DEFAULT_TOP_K) {
            Some(k) => k,
            None => NonZeroUsize::MIN,
        }
    }
}

impl Default for TopK {
    fn default() -> Self {
        Self(Self::default_value())
    }
}

/// Exact-match post-filters applied to retrieved candidates.
///
/// Blank strings count as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub country: Option<String>,
    pub department: Option<String>,
}

impl SearchFilters {
    #[must_use]
    pub fn new(country: Option<&str>, department: Option<&str>) -> Self {
        fn present(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }
        Self {
            country: present(country),
            department: present(department),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.department.is_none()
    }
}

/// One accepted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub mentor_label: IndexLabel,
    pub mentor_id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub expertise: Option<String>,
    pub availability: bool,
    pub score: f32,
}

impl Recommendation {
    #[must_use]
    pub fn from_record(label: IndexLabel, record: &MentorRecord, score: f32) -> Self {
        Self {
            mentor_label: label,
            mentor_id: record.mentor_id,
            name: record.name.clone(),
            email: record.email.clone(),
            department: record.department.clone(),
            company: record.company.clone(),
            position: record.current_position.clone(),
            location: record.location.clone(),
            expertise: record.expertise.clone(),
            availability: record.availability,
            score,
        }
    }
}

/// Ranked results plus the composed text that was embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub query: String,
    pub results: Vec<Recommendation>,
}

/// Administrative listing of mentors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorListing {
    pub count: usize,
    pub mentors: Vec<MentorRecord>,
}

impl From<Vec<MentorRecord>> for MentorListing {
    fn from(mentors: Vec<MentorRecord>) -> Self {
        Self {
            count: mentors.len(),
            mentors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// A new generation was published.
    Ok,
    /// No eligible mentors; nothing was written.
    Empty,
    /// The build aborted; the previous generation is still served.
    Error,
}

/// Outcome of one rebuild, including the step log shown to operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub status: BuildStatus,
    pub records_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildReport {
    #[must_use]
    pub fn empty(messages: Vec<String>) -> Self {
        Self {
            status: BuildStatus::Empty,
            records_processed: 0,
            dimension: None,
            generation: None,
            messages,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(messages: Vec<String>, error: String) -> Self {
        Self {
            status: BuildStatus::Error,
            records_processed: 0,
            dimension: None,
            generation: None,
            messages,
            error: Some(error),
        }
    }

    /// Step log joined into one block, one step per line.
    #[must_use]
    pub fn output(&self) -> String {
        let mut out = self.messages.join("\n");
        if let Some(error) = &self.error {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(error);
        }
        out
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status != BuildStatus::Error
    }
}
