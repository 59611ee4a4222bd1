//! Publication, rebuild and reload behaviour of index generations.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use mentor_rag::vector::{VectorDimension, VectorError};
use mentor_rag::{
    BuildStatus, CountryResolver, EmbeddingGenerator, InMemorySource, MentorError, MentorRecord,
    QueryEngine, QueryProfile, RecommendResponse, SearchFilters, TopK,
};

use crate::common::{BagOfWords, TestWorkspace, mentor, roster};

fn python_profile() -> QueryProfile {
    QueryProfile {
        skills: Some(vec!["python".into(), "statistics".into()]),
        ..QueryProfile::default()
    }
}

#[test]
fn test_rebuild_is_idempotent() {
    let workspace = TestWorkspace::new();
    let service = workspace.service(Arc::new(InMemorySource::new(roster())));

    let first = service.rebuild();
    let before = service.recommend(&python_profile()).unwrap();
    let second = service.rebuild();
    let after = service.recommend(&python_profile()).unwrap();

    assert_ne!(first.generation, second.generation);
    assert_eq!(first.records_processed, second.records_processed);
    assert_eq!(before, after);
}

#[test]
fn test_empty_build_leaves_artifacts_untouched() {
    let workspace = TestWorkspace::new();
    let source = Arc::new(InMemorySource::new(roster()));
    let service = workspace.service(Arc::clone(&source));
    service.rebuild();
    let snapshot = workspace.snapshot();
    assert!(!snapshot.is_empty());

    // Only unavailable mentors left
    source.replace(vec![MentorRecord {
        availability: false,
        ..mentor(1, "Ines", "robotics", "Mechanical", "Lisbon")
    }]);
    let report = service.rebuild();

    assert_eq!(report.status, BuildStatus::Empty);
    assert_eq!(report.records_processed, 0);
    assert_eq!(workspace.snapshot(), snapshot);
    assert_eq!(service.engine().unwrap().len(), 7);
}

#[test]
fn test_degenerate_mentor_aborts_build() {
    let workspace = TestWorkspace::new();
    let source = Arc::new(InMemorySource::new(roster()));
    let service = workspace.service(Arc::clone(&source));
    service.rebuild();
    let snapshot = workspace.snapshot();

    // Nothing but an id: the composed text is empty and embeds to zero
    let mut mentors = roster();
    mentors.push(MentorRecord {
        availability: true,
        ..MentorRecord::new(999)
    });
    source.replace(mentors);

    let report = service.rebuild();
    assert_eq!(report.status, BuildStatus::Error);
    assert!(report.output().contains("999"), "{}", report.output());
    assert_eq!(workspace.snapshot(), snapshot);
    assert_eq!(service.engine().unwrap().len(), 7);
}

#[test]
fn test_tampered_metadata_is_rejected() {
    let workspace = TestWorkspace::new();
    workspace
        .service(Arc::new(InMemorySource::new(roster())))
        .rebuild();

    let dir = workspace.artifacts().current_dir().unwrap();
    std::fs::write(dir.join("mentor_meta.json"), "{}").unwrap();

    let result = QueryEngine::open(
        &workspace.artifacts(),
        Arc::new(BagOfWords::new()),
        CountryResolver::default(),
    );
    assert!(matches!(result, Err(MentorError::IndexCorrupted { .. })));
}

struct OtherModel(BagOfWords);

impl EmbeddingGenerator for OtherModel {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        self.0.generate_embeddings(texts)
    }

    fn dimension(&self) -> VectorDimension {
        self.0.dimension()
    }

    fn model_name(&self) -> String {
        "another-model".to_string()
    }
}

#[test]
fn test_model_change_requires_rebuild() {
    let workspace = TestWorkspace::new();
    workspace
        .service(Arc::new(InMemorySource::new(roster())))
        .rebuild();

    let result = QueryEngine::open(
        &workspace.artifacts(),
        Arc::new(OtherModel(BagOfWords::new())),
        CountryResolver::default(),
    );
    match result {
        Err(MentorError::ModelMismatch { expected, found }) => {
            assert_eq!(expected, "another-model");
            assert_eq!(found, "test-bag-of-words");
        }
        other => panic!("Expected ModelMismatch, got {other:?}"),
    }
}

#[test]
fn test_old_generations_are_pruned() {
    let workspace = TestWorkspace::new();
    let service = workspace.service(Arc::new(InMemorySource::new(roster())));

    let generations: Vec<String> = (0..3)
        .map(|_| service.rebuild().generation.unwrap())
        .collect();

    let artifacts = workspace.artifacts();
    assert_eq!(artifacts.generations().unwrap(), generations[1..].to_vec());
    assert_eq!(
        artifacts.current_generation().unwrap().as_deref(),
        Some(generations[2].as_str())
    );
}

#[test]
fn test_reader_follows_external_build() {
    let workspace = TestWorkspace::new();
    let source = Arc::new(InMemorySource::new(roster()));
    let writer = workspace.service(Arc::clone(&source));
    let reader = workspace.service(Arc::clone(&source));

    writer.rebuild();
    let first = reader.engine().unwrap();
    assert_eq!(first.len(), 7);

    source.replace(roster().into_iter().take(3).collect());
    let report = writer.rebuild();

    let second = reader.engine().unwrap();
    assert_eq!(second.len(), 3);
    assert_eq!(second.generation(), report.generation.as_deref());
    // The engine handed out earlier is unaffected
    assert_eq!(first.len(), 7);
    assert_eq!(reader.reload().unwrap().len(), 3);
}

/// Three mentors whose ids never overlap with `roster()`.
fn replacement_roster() -> Vec<MentorRecord> {
    vec![
        mentor(201, "Ines", "python robotics", "Mechanical", "Lisbon"),
        mentor(202, "Jun", "statistics python", "Mathematics", "Pune"),
        mentor(203, "Kofi", "compilers", "Computer Science", "Accra"),
    ]
}

#[test]
fn test_queries_during_rebuilds_see_one_generation() {
    const ROUNDS: usize = 6;
    const QUERIES: usize = 40;

    let workspace = TestWorkspace::new();
    let source = Arc::new(InMemorySource::new(roster()));
    let service = workspace.service(Arc::clone(&source));
    assert_eq!(service.rebuild().status, BuildStatus::Ok);

    let full: HashSet<i64> = (101..=107).collect();
    let small: HashSet<i64> = (201..=203).collect();
    let every_mentor = QueryProfile {
        skills: Some(vec!["python".into()]),
        top_k: Some(50),
        ..QueryProfile::default()
    };

    let (reports, responses) = thread::scope(|scope| {
        let builders: Vec<_> = (0..2)
            .map(|_| {
                let service = &service;
                let source = &source;
                scope.spawn(move || {
                    (0..ROUNDS)
                        .map(|round| {
                            if round % 2 == 0 {
                                source.replace(replacement_roster());
                            } else {
                                source.replace(roster());
                            }
                            service.rebuild()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|reader| {
                let service = &service;
                let every_mentor = &every_mentor;
                scope.spawn(move || {
                    (0..QUERIES)
                        .map(|_| {
                            if reader % 2 == 0 {
                                service.recommend(every_mentor)
                            } else {
                                service.recommend_text(
                                    "python",
                                    TopK::new(50),
                                    &SearchFilters::default(),
                                )
                            }
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let reports: Vec<_> = builders
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let responses: Vec<_> = readers
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        (reports, responses)
    });

    assert_eq!(reports.len(), 2 * ROUNDS);
    for report in &reports {
        assert_eq!(report.status, BuildStatus::Ok, "{}", report.output());
    }

    assert_eq!(responses.len(), 4 * QUERIES);
    for response in responses {
        let response: RecommendResponse = response.unwrap();
        let ids: HashSet<i64> = response.results.iter().map(|r| r.mentor_id).collect();
        // A whole generation comes back, never a mix of two
        assert!(ids == full || ids == small, "mixed generations: {ids:?}");
    }

    // Whatever ran last is what a fresh reader sees
    let last = workspace.service(Arc::clone(&source));
    let served: HashSet<i64> = last
        .recommend(&every_mentor)
        .unwrap()
        .results
        .iter()
        .map(|r| r.mentor_id)
        .collect();
    assert!(served == full || served == small);
}
