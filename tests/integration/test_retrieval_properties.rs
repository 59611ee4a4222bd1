//! Oversampling, truncation and ordering guarantees of `recommend`.

use std::sync::Arc;

use mentor_rag::{
    BuildStatus, InMemorySource, MentorRecord, MentorService, QueryProfile, SearchFilters, TopK,
};

use crate::common::{TestWorkspace, mentor};

fn serve(workspace: &TestWorkspace, mentors: Vec<MentorRecord>) -> MentorService {
    let service = workspace.service(Arc::new(InMemorySource::new(mentors)));
    let report = service.rebuild();
    assert_eq!(report.status, BuildStatus::Ok, "{}", report.output());
    service
}

fn data_science() -> QueryProfile {
    QueryProfile {
        skills: Some(vec!["data science".into()]),
        ..QueryProfile::default()
    }
}

#[test]
fn test_oversampling_survives_country_filter() {
    let workspace = TestWorkspace::new();
    let mentors = (0..30)
        .map(|i| {
            let city = if i % 3 == 0 { "Pune" } else { "Berlin" };
            mentor(i, &format!("Mentor{i}"), "data science", "Statistics", city)
        })
        .collect();
    let service = serve(&workspace, mentors);

    let profile = QueryProfile {
        country: Some("India".into()),
        top_k: Some(5),
        ..data_science()
    };
    let response = service.recommend(&profile).unwrap();

    assert_eq!(response.results.len(), 5);
    assert!(
        response
            .results
            .iter()
            .all(|r| r.location.as_deref() == Some("Pune"))
    );
}

#[test]
fn test_filter_can_starve_beyond_candidate_pool() {
    let workspace = TestWorkspace::new();
    let mut mentors: Vec<MentorRecord> = (0..28)
        .map(|i| mentor(i, &format!("Mentor{i}"), "data science", "Statistics", "Berlin"))
        .collect();
    mentors.push(mentor(28, "Mentor28", "pottery", "Arts", "Pune"));
    mentors.push(mentor(29, "Mentor29", "pottery", "Arts", "Pune"));
    let service = serve(&workspace, mentors);

    // One result requested, so only the five closest mentors are examined
    let profile = QueryProfile {
        country: Some("India".into()),
        top_k: Some(1),
        ..data_science()
    };
    assert!(service.recommend(&profile).unwrap().results.is_empty());
}

#[test]
fn test_results_are_truncated_and_sorted() {
    let workspace = TestWorkspace::new();
    let topics = [
        "rust", "python", "statistics", "design", "finance", "robotics", "biology",
    ];
    let areas = [
        "systems", "web", "research", "startups", "policy", "hardware", "cloud", "teaching",
        "markets", "health", "energy",
    ];
    let mentors = (0..100)
        .map(|i| {
            let expertise = format!(
                "{} {}",
                topics[i % topics.len()],
                areas[(i * 3) % areas.len()]
            );
            mentor(i as i64, &format!("Mentor{i}"), &expertise, "Engineering", "Delhi")
        })
        .collect();
    let service = serve(&workspace, mentors);

    let profile = QueryProfile {
        skills: Some(vec!["rust".into(), "systems".into()]),
        interests: Some(vec!["cloud".into()]),
        top_k: Some(3),
        ..QueryProfile::default()
    };
    let results = service.recommend(&profile).unwrap().results;

    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.score)));
}

#[test]
fn test_top_k_defaults_to_five() {
    let workspace = TestWorkspace::new();
    let mentors = (0..12)
        .map(|i| mentor(i, &format!("Mentor{i}"), "data science", "Statistics", "Pune"))
        .collect();
    let service = serve(&workspace, mentors);

    for top_k in [None, Some(0), Some(-4)] {
        let profile = QueryProfile {
            top_k,
            ..data_science()
        };
        assert_eq!(service.recommend(&profile).unwrap().results.len(), 5);
    }
}

#[test]
fn test_equal_scores_rank_by_label() {
    let workspace = TestWorkspace::new();
    // Identical composed text, so identical vectors
    let mentors = [40, 10, 30, 20]
        .into_iter()
        .map(|id| MentorRecord {
            expertise: Some("distributed systems".into()),
            availability: true,
            ..MentorRecord::new(id)
        })
        .collect();
    let service = serve(&workspace, mentors);

    let response = service
        .recommend_text(
            "distributed systems",
            TopK::new(4),
            &SearchFilters::default(),
        )
        .unwrap();

    let ids: Vec<i64> = response.results.iter().map(|r| r.mentor_id).collect();
    assert_eq!(ids, vec![40, 10, 30, 20]);
    let labels: Vec<u32> = response.results.iter().map(|r| r.mentor_label.get()).collect();
    assert_eq!(labels, vec![0, 1, 2, 3]);
    assert!(response.results.iter().all(|r| (r.score - 1.0).abs() < 1e-5));
}
