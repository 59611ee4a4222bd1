//! Turns mentor records into a published index generation.

use std::path::Path;
use std::sync::Arc;

use crate::error::{MentorError, MentorResult};
use crate::semantic::{ArtifactStore, IndexManifest, MetadataStore, mentor_text};
use crate::types::MentorRecord;
use crate::vector::{
    EmbeddingGenerator, FlatIpIndex, IndexLabel, VectorError, VectorIndex, normalize_l2,
};

/// Human-readable step log of one build.
///
/// Every step is also emitted through `tracing`; the collected lines are what
/// the build trigger reports back as captured output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildLog {
    messages: Vec<String>,
}

impl BuildLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.messages.push(message);
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Result of a build that did not fail.
#[derive(Debug)]
pub enum BuildOutcome {
    /// No records were supplied; nothing was written.
    Empty,
    Published(PublishedGeneration),
}

/// A freshly published generation, still held in memory.
#[derive(Debug)]
pub struct PublishedGeneration {
    pub generation: String,
    pub manifest: IndexManifest,
    pub index: FlatIpIndex,
    pub store: MetadataStore,
}

/// Embeds records and publishes them as a new generation.
pub struct IndexBuilder {
    generator: Arc<dyn EmbeddingGenerator>,
    artifacts: ArtifactStore,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(generator: Arc<dyn EmbeddingGenerator>, artifacts: ArtifactStore) -> Self {
        Self {
            generator,
            artifacts,
        }
    }

    /// Builds and publishes a generation from `records`, in order.
    ///
    /// Record `i` gets label `i`. Any failure leaves the served generation
    /// untouched; an empty input writes nothing at all.
    pub fn build(
        &self,
        records: Vec<MentorRecord>,
        log: &mut BuildLog,
    ) -> MentorResult<BuildOutcome> {
        if records.is_empty() {
            tracing::warn!("no eligible mentors, keeping the current index");
            log.step("No mentors found. Nothing to build.");
            return Ok(BuildOutcome::Empty);
        }

        let texts: Vec<String> = records.iter().map(mentor_text).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        log.step(format!("Encoding {} mentor texts...", texts.len()));
        let mut embeddings = self.generator.generate_embeddings(&text_refs)?;
        if embeddings.len() != records.len() {
            return Err(MentorError::EmbeddingCountMismatch {
                expected: records.len(),
                actual: embeddings.len(),
            });
        }

        let dimension = self.generator.dimension();
        log.step(format!("Embedding dimension: {}", dimension.get()));

        for (position, (embedding, record)) in embeddings.iter_mut().zip(&records).enumerate() {
            dimension.validate_vector(embedding)?;
            let label = IndexLabel::from_index(position)
                .ok_or(VectorError::CapacityExceeded(records.len()))?;
            normalize_l2(embedding).map_err(|e| match e {
                VectorError::ZeroNorm | VectorError::NonFinite => MentorError::DegenerateEmbedding {
                    label,
                    mentor_id: record.mentor_id,
                },
                other => other.into(),
            })?;
        }

        let mut index = FlatIpIndex::new(dimension);
        index.add(&embeddings)?;
        let store = MetadataStore::new(records);

        let pending = self.artifacts.begin()?;
        let manifest = match self.write_generation(pending.dir(), &index, &store) {
            Ok(manifest) => manifest,
            Err(e) => {
                self.artifacts.discard(pending);
                return Err(e);
            }
        };
        log.step(format!("Saved {} vectors to {}", index.len(), self.artifacts.index_file()));
        log.step(format!("Saved metadata to {}", self.artifacts.meta_file()));

        let generation = self.artifacts.publish(pending)?;
        log.step(format!("Published generation {generation}"));

        Ok(BuildOutcome::Published(PublishedGeneration {
            generation,
            manifest,
            index,
            store,
        }))
    }

    fn write_generation(
        &self,
        dir: &Path,
        index: &FlatIpIndex,
        store: &MetadataStore,
    ) -> MentorResult<IndexManifest> {
        index.save(&dir.join(self.artifacts.index_file()))?;
        store.save(&dir.join(self.artifacts.meta_file()))?;

        let manifest = IndexManifest::describe(
            dir,
            self.generator.model_name(),
            index.dimension(),
            store.len(),
            self.artifacts.index_file(),
            self.artifacts.meta_file(),
        )?;
        manifest.save(dir)?;
        Ok(manifest)
    }
}
