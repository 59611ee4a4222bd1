//! Rendering of mentor records and query profiles into embedding text.
//!
//! Both sides walk a fixed, ordered field table and emit `Label: value`
//! segments joined by [`SEGMENT_SEPARATOR`]. Empty fields are skipped without
//! reordering the rest. Build and query paths must stay in lockstep or their
//! embeddings stop being comparable.

use crate::types::{MentorRecord, QueryProfile};

/// Separator placed between labeled segments.
pub const SEGMENT_SEPARATOR: &str = " || ";

/// Separator used to flatten list-valued fields.
pub const LIST_SEPARATOR: &str = ", ";

type MentorField = (&'static str, fn(&MentorRecord) -> Option<&str>);

const MENTOR_FIELDS: &[MentorField] = &[
    ("Name", |r| r.name.as_deref()),
    ("Expertise", |r| r.expertise.as_deref()),
    ("Department", |r| r.department.as_deref()),
    ("Degree", |r| r.degree.as_deref()),
    ("Current position", |r| r.current_position.as_deref()),
    ("Company", |r| r.company.as_deref()),
    ("Location", |r| r.location.as_deref()),
];

/// Composes the embedding text for a mentor.
#[must_use]
pub fn mentor_text(record: &MentorRecord) -> String {
    join_segments(
        MENTOR_FIELDS
            .iter()
            .map(|(label, field)| (*label, field(record).map(str::to_string))),
    )
}

/// Composes the embedding text for a query profile.
#[must_use]
pub fn query_text(profile: &QueryProfile) -> String {
    let list = |items: &Option<Vec<String>>| {
        items
            .as_ref()
            .filter(|items| !items.is_empty())
            .map(|items| items.join(LIST_SEPARATOR))
    };

    join_segments([
        ("Degree", profile.degree.clone()),
        ("Department", profile.department.clone()),
        ("Skills", list(&profile.skills)),
        ("Interests", list(&profile.interests)),
        ("Preferred domain", profile.preferred_domain.clone()),
        ("Career goal", profile.career_goal.clone()),
        ("Country preference", profile.country.clone()),
    ])
}

fn join_segments(fields: impl IntoIterator<Item = (&'static str, Option<String>)>) -> String {
    fields
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{label}: {v}"))
        })
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}
