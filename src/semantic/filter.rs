//! Exact-match post-filters for retrieved candidates.

use std::collections::HashMap;

use crate::types::{MentorRecord, SearchFilters};

/// Cities resolved to a country when no table is configured.
pub const DEFAULT_CITY_TO_COUNTRY: &[(&str, &str)] = &[
    ("bangalore", "india"),
    ("bengaluru", "india"),
    ("pune", "india"),
    ("chennai", "india"),
    ("mumbai", "india"),
    ("delhi", "india"),
    ("hyderabad", "india"),
];

/// Resolves a mentor's free-text location to a country.
///
/// Keys and values are stored lowercased; a location that is not a known
/// city is taken to be the country itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryResolver {
    city_to_country: HashMap<String, String>,
}

impl Default for CountryResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_CITY_TO_COUNTRY
                .iter()
                .map(|(city, country)| (city.to_string(), country.to_string())),
        )
    }
}

impl CountryResolver {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            city_to_country: entries
                .into_iter()
                .map(|(city, country)| (normalize(&city), normalize(&country)))
                .collect(),
        }
    }

    /// Lowercased country for `location`.
    #[must_use]
    pub fn resolve(&self, location: &str) -> String {
        let city = normalize(location);
        match self.city_to_country.get(&city) {
            Some(country) => country.clone(),
            None => city,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.city_to_country.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city_to_country.is_empty()
    }

    /// Whether a mentor passes `filters`. A missing field never matches a
    /// filter that is set.
    #[must_use]
    pub fn matches(&self, record: &MentorRecord, filters: &SearchFilters) -> bool {
        if let Some(country) = &filters.country {
            let resolved = self.resolve(record.location.as_deref().unwrap_or_default());
            if resolved != normalize(country) {
                return false;
            }
        }

        if let Some(department) = &filters.department {
            let mentor_dept = record
                .department
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            if !mentor_dept.contains(&department.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
