//! End-to-end build then recommend over the shared roster.

use std::collections::BTreeSet;
use std::sync::Arc;

use mentor_rag::semantic::{IndexManifest, MetadataStore};
use mentor_rag::vector::IndexLabel;
use mentor_rag::{BuildStatus, CountryResolver, InMemorySource, QueryEngine, QueryProfile};

use crate::common::{BagOfWords, TestWorkspace, roster};

fn built_workspace() -> (TestWorkspace, mentor_rag::MentorService) {
    let workspace = TestWorkspace::new();
    let service = workspace.service(Arc::new(InMemorySource::new(roster())));
    let report = service.rebuild();
    assert_eq!(report.status, BuildStatus::Ok, "{}", report.output());
    (workspace, service)
}

#[test]
fn test_build_round_trips_only_available_mentors() {
    let (workspace, service) = built_workspace();

    let engine = QueryEngine::open(
        &workspace.artifacts(),
        Arc::new(BagOfWords::new()),
        CountryResolver::default(),
    )
    .unwrap();
    // Hiro (108) is not accepting mentees
    assert_eq!(engine.len(), 7);
    assert_eq!(service.engine().unwrap().len(), 7);

    let dir = workspace.artifacts().current_dir().unwrap();
    let manifest = IndexManifest::load(&dir).unwrap();
    assert_eq!(manifest.record_count, 7);
    assert_eq!(manifest.dimension.get(), BagOfWords::DIMENSION);
    assert_eq!(manifest.model_name, "test-bag-of-words");

    let store = MetadataStore::load(&dir.join("mentor_meta.json")).unwrap();
    let ids: Vec<i64> = store.iter().map(|(_, record)| record.mentor_id).collect();
    assert_eq!(ids, vec![101, 102, 103, 104, 105, 106, 107]);
    assert_eq!(
        store.get(IndexLabel::new(0)).unwrap().company.as_deref(),
        Some("Infosys")
    );
}

#[test]
fn test_metadata_keys_are_stringified_labels() {
    let (workspace, _service) = built_workspace();
    let dir = workspace.artifacts().current_dir().unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("mentor_meta.json")).unwrap())
            .unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 7);
    assert_eq!(json["0"]["mentor_id"], 101);
    assert_eq!(json["6"]["location"], "Chennai");
}

#[test]
fn test_profile_ranks_closest_mentor_first() {
    let (_workspace, service) = built_workspace();

    let profile = QueryProfile {
        skills: Some(vec!["machine learning".into(), "python".into()]),
        department: Some("Computer Science".into()),
        degree: Some("B.Tech".into()),
        ..QueryProfile::default()
    };
    let response = service.recommend(&profile).unwrap();

    assert_eq!(
        response.query,
        "Degree: B.Tech || Department: Computer Science || Skills: machine learning, python"
    );
    let ids: Vec<i64> = response.results.iter().map(|r| r.mentor_id).collect();
    // Department filter keeps the three Computer Science mentors
    assert_eq!(ids, vec![101, 106, 104]);

    let best = &response.results[0];
    assert!(best.score > 0.7, "score was {}", best.score);
    assert!(best.score > response.results[1].score);
    assert_eq!(best.position.as_deref(), Some("ML Engineer"));
    assert_eq!(best.email.as_deref(), Some("asha@alumni.example.edu"));
}

#[test]
fn test_country_filter_resolves_cities() {
    let (_workspace, service) = built_workspace();

    let profile = QueryProfile {
        skills: Some(vec!["python".into()]),
        country: Some("India".into()),
        ..QueryProfile::default()
    };
    let response = service.recommend(&profile).unwrap();

    let ids: Vec<i64> = response.results.iter().map(|r| r.mentor_id).collect();
    assert_eq!(&ids[..3], &[101, 103, 106]);
    let all: BTreeSet<i64> = ids.into_iter().collect();
    assert_eq!(all, BTreeSet::from([101, 103, 104, 106, 107]));
}

#[test]
fn test_unknown_city_compares_as_is() {
    let (_workspace, service) = built_workspace();

    let by_country = QueryProfile {
        skills: Some(vec!["firmware".into()]),
        country: Some("Germany".into()),
        ..QueryProfile::default()
    };
    assert!(service.recommend(&by_country).unwrap().results.is_empty());

    let by_city = QueryProfile {
        country: Some("munich".into()),
        ..by_country
    };
    let results = service.recommend(&by_city).unwrap().results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].mentor_id, 102);
}

#[test]
fn test_department_filter_is_case_insensitive_substring() {
    let (_workspace, service) = built_workspace();

    let profile = QueryProfile {
        interests: Some(vec!["engineering".into()]),
        department: Some("  science ".into()),
        ..QueryProfile::default()
    };
    let response = service.recommend(&profile).unwrap();

    let ids: BTreeSet<i64> = response.results.iter().map(|r| r.mentor_id).collect();
    assert_eq!(ids, BTreeSet::from([101, 104, 106]));
}

#[test]
fn test_blank_filters_are_ignored() {
    let (_workspace, service) = built_workspace();

    let profile = QueryProfile {
        skills: Some(vec!["python".into()]),
        country: Some(String::new()),
        department: Some("   ".into()),
        top_k: Some(10),
        ..QueryProfile::default()
    };
    assert_eq!(service.recommend(&profile).unwrap().results.len(), 7);
}
