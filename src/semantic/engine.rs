//! Query side: embeds a request, over-samples neighbours, filters and trims.
//!
//! An engine only exists in the ready state. Construction either loads a
//! consistent generation or fails (`IndexNotFound` before the first build);
//! after that it is immutable and safe to share across threads. A rebuild
//! produces a new engine rather than mutating this one.

use std::sync::Arc;

use crate::error::{MentorError, MentorResult};
use crate::semantic::{ArtifactStore, CountryResolver, IndexManifest, MetadataStore, query_text};
use crate::types::{QueryProfile, Recommendation, RecommendResponse, SearchFilters, TopK};
use crate::vector::{EmbeddingGenerator, FlatIpIndex, VectorIndex, normalize_l2};

pub struct QueryEngine {
    generator: Arc<dyn EmbeddingGenerator>,
    index: Box<dyn VectorIndex>,
    store: MetadataStore,
    resolver: CountryResolver,
    generation: Option<String>,
    manifest: Option<IndexManifest>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("generation", &self.generation)
            .field("vectors", &self.index.len())
            .field("records", &self.store.len())
            .field("model", &self.generator.model_name())
            .finish()
    }
}

impl QueryEngine {
    /// Loads the served generation from `artifacts`.
    ///
    /// Verifies the manifest's model against `generator`, both checksums,
    /// and that every label resolves in both the index and the metadata.
    pub fn open(
        artifacts: &ArtifactStore,
        generator: Arc<dyn EmbeddingGenerator>,
        resolver: CountryResolver,
    ) -> MentorResult<Self> {
        let dir = artifacts.current_dir()?;
        let manifest = IndexManifest::load(&dir)?;

        let model = generator.model_name();
        if manifest.model_name != model {
            return Err(MentorError::ModelMismatch {
                expected: model,
                found: manifest.model_name,
            });
        }
        manifest.verify(&dir)?;

        let index = FlatIpIndex::load(&dir.join(&manifest.index_file))?;
        if index.dimension() != manifest.dimension || index.dimension() != generator.dimension() {
            return Err(MentorError::IndexCorrupted {
                reason: format!(
                    "index dimension {} disagrees with manifest {} or model {}",
                    index.dimension().get(),
                    manifest.dimension.get(),
                    generator.dimension().get()
                ),
            });
        }

        let store = MetadataStore::load(&dir.join(&manifest.meta_file))?;
        if index.len() != store.len() || store.len() != manifest.record_count {
            return Err(MentorError::IndexCorrupted {
                reason: format!(
                    "{} vectors, {} metadata records, manifest says {}",
                    index.len(),
                    store.len(),
                    manifest.record_count
                ),
            });
        }

        let generation = dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        tracing::info!(
            generation = generation.as_deref().unwrap_or_default(),
            mentors = store.len(),
            "loaded mentor index"
        );

        let mut engine = Self::from_parts(generator, Box::new(index), store, resolver);
        engine.generation = generation;
        engine.manifest = Some(manifest);
        Ok(engine)
    }

    /// Assembles an engine from in-memory parts.
    ///
    /// No consistency check beyond a warning: labels without metadata are
    /// skipped at query time.
    #[must_use]
    pub fn from_parts(
        generator: Arc<dyn EmbeddingGenerator>,
        index: Box<dyn VectorIndex>,
        store: MetadataStore,
        resolver: CountryResolver,
    ) -> Self {
        if index.len() != store.len() {
            tracing::warn!(
                vectors = index.len(),
                records = store.len(),
                "vector index and metadata sizes differ"
            );
        }
        Self {
            generator,
            index,
            store,
            resolver,
            generation: None,
            manifest: None,
        }
    }

    /// Tags the engine with the generation it was built from.
    #[must_use]
    pub fn with_generation(mut self, generation: String, manifest: IndexManifest) -> Self {
        self.generation = Some(generation);
        self.manifest = Some(manifest);
        self
    }

    /// Ranks mentors against already-composed `query`.
    ///
    /// Retrieves `top_k * OVERSAMPLE_FACTOR` neighbours, walks them in score
    /// order skipping sentinels, labels without metadata and filtered-out
    /// mentors, and stops once `top_k` are accepted.
    pub fn recommend(
        &self,
        query: &str,
        top_k: TopK,
        filters: &SearchFilters,
    ) -> MentorResult<RecommendResponse> {
        let mut embeddings = self.generator.generate_embeddings(&[query])?;
        if embeddings.len() != 1 {
            return Err(MentorError::EmbeddingCountMismatch {
                expected: 1,
                actual: embeddings.len(),
            });
        }
        let mut query_vector = embeddings.swap_remove(0);
        normalize_l2(&mut query_vector)?;

        let candidates = self.index.search(&query_vector, top_k.oversampled())?;
        let examined = candidates.len();

        // top_k is caller-controlled; never reserve more than was retrieved
        let mut results = Vec::with_capacity(top_k.get().min(examined));
        for neighbor in candidates {
            let Some(label) = neighbor.label else {
                tracing::debug!("skipping empty neighbour slot");
                continue;
            };
            let Some(record) = self.store.get(label) else {
                tracing::debug!(%label, "skipping label without metadata");
                continue;
            };
            if !self.resolver.matches(record, filters) {
                continue;
            }

            results.push(Recommendation::from_record(label, record, neighbor.score.get()));
            if results.len() >= top_k.get() {
                break;
            }
        }

        tracing::debug!(
            examined,
            accepted = results.len(),
            top_k = top_k.get(),
            "recommendation finished"
        );

        Ok(RecommendResponse {
            query: query.to_string(),
            results,
        })
    }

    /// Composes the profile into query text and recommends against it.
    ///
    /// Filters come from the profile's `country` and `department`.
    pub fn recommend_profile(&self, profile: &QueryProfile) -> MentorResult<RecommendResponse> {
        self.recommend(&query_text(profile), profile.top_k(), &profile.filters())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn generation(&self) -> Option<&str> {
        self.generation.as_deref()
    }

    #[must_use]
    pub fn manifest(&self) -> Option<&IndexManifest> {
        self.manifest.as_ref()
    }
}
