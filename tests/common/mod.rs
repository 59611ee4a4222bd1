//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mentor_rag::vector::{VectorDimension, VectorError};
use mentor_rag::{
    ArtifactStore, CountryResolver, EmbeddingGenerator, InMemorySource, MentorRecord,
    MentorService,
};
use tempfile::TempDir;

/// Deterministic bag-of-words embedder.
///
/// Tokens are hashed (FNV-1a) into buckets; field labels are dropped so a
/// profile repeating a mentor's values embeds like that mentor.
pub struct BagOfWords {
    dimension: VectorDimension,
}

impl BagOfWords {
    pub const DIMENSION: usize = 256;

    const LABEL_WORDS: &'static [&'static str] = &[
        "name", "expertise", "department", "degree", "current", "position", "company",
        "location", "skills", "interests", "preferred", "domain", "career", "goal", "country",
    ];

    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(Self::DIMENSION).unwrap(),
        }
    }

    fn bucket(token: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % Self::DIMENSION as u64) as usize
    }
}

impl EmbeddingGenerator for BagOfWords {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.0; Self::DIMENSION];
                for token in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|t| !t.is_empty())
                    .map(str::to_lowercase)
                    .filter(|t| !Self::LABEL_WORDS.contains(&t.as_str()))
                {
                    embedding[Self::bucket(&token)] += 1.0;
                }
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> String {
        "test-bag-of-words".to_string()
    }
}

pub fn mentor(
    id: i64,
    name: &str,
    expertise: &str,
    department: &str,
    location: &str,
) -> MentorRecord {
    MentorRecord {
        name: Some(name.to_string()),
        email: Some(format!("{}@alumni.example.edu", name.to_lowercase())),
        expertise: Some(expertise.to_string()),
        department: Some(department.to_string()),
        location: Some(location.to_string()),
        availability: true,
        max_mentees: Some(3),
        ..MentorRecord::new(id)
    }
}

/// A small, varied alumni roster.
pub fn roster() -> Vec<MentorRecord> {
    vec![
        MentorRecord {
            degree: Some("B.Tech".into()),
            current_position: Some("ML Engineer".into()),
            company: Some("Infosys".into()),
            ..mentor(101, "Asha", "machine learning python", "Computer Science", "Bangalore")
        },
        mentor(102, "Ben", "embedded systems firmware", "Electronics", "Munich"),
        mentor(103, "Chitra", "data science statistics python", "Mathematics", "Pune"),
        mentor(104, "Dev", "cloud infrastructure kubernetes", "Computer Science", "Hyderabad"),
        mentor(105, "Elena", "product management strategy", "Management", "Madrid"),
        mentor(106, "Farhan", "computer vision deep learning", "Computer Science", "India"),
        mentor(107, "Grace", "structural engineering design", "Civil Engineering", "Chennai"),
        MentorRecord {
            availability: false,
            ..mentor(108, "Hiro", "machine learning research", "Computer Science", "Tokyo")
        },
    ]
}

pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join("index")
    }

    pub fn artifacts(&self) -> ArtifactStore {
        ArtifactStore::with_defaults(self.index_path())
    }

    pub fn service(&self, source: Arc<InMemorySource>) -> MentorService {
        MentorService::new(
            source,
            Arc::new(BagOfWords::new()),
            self.artifacts(),
            CountryResolver::default(),
        )
    }

    /// Every file under the index directory with its bytes, sorted by path.
    pub fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files = Vec::new();
        collect(&self.index_path(), &mut files);
        files.sort();
        files
    }
}

fn collect(dir: &Path, files: &mut Vec<(PathBuf, Vec<u8>)>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, files);
        } else {
            let bytes = std::fs::read(&path).unwrap();
            files.push((path, bytes));
        }
    }
}
