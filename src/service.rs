//! Orchestration shared by the CLI and the HTTP surface.
//!
//! [`MentorService`] owns the served [`QueryEngine`] handle. Builds are
//! serialized; a successful build swaps the handle under a write lock, so a
//! query sees either the old (index, metadata) pair or the new one, never a
//! mix. In-flight queries keep their `Arc` to the engine they started with.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Settings;
use crate::error::MentorResult;
use crate::semantic::{
    ArtifactStore, BuildLog, BuildOutcome, CountryResolver, IndexBuilder, QueryEngine,
};
use crate::source::{JsonFileSource, MentorSource};
use crate::types::{
    BuildReport, BuildStatus, MentorListing, QueryProfile, RecommendResponse, SearchFilters, TopK,
};
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator};

pub struct MentorService {
    source: Arc<dyn MentorSource>,
    generator: Arc<dyn EmbeddingGenerator>,
    artifacts: ArtifactStore,
    resolver: CountryResolver,
    engine: RwLock<Option<Arc<QueryEngine>>>,
    build_lock: Mutex<()>,
}

impl std::fmt::Debug for MentorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentorService")
            .field("source", &self.source.describe())
            .field("model", &self.generator.model_name())
            .field("index_path", &self.artifacts.root())
            .field("loaded", &self.engine.read().is_some())
            .finish()
    }
}

impl MentorService {
    #[must_use]
    pub fn new(
        source: Arc<dyn MentorSource>,
        generator: Arc<dyn EmbeddingGenerator>,
        artifacts: ArtifactStore,
        resolver: CountryResolver,
    ) -> Self {
        Self {
            source,
            generator,
            artifacts,
            resolver,
            engine: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Wires the configured fastembed model and `source` together.
    ///
    /// Loads (and on first use downloads) the embedding model.
    pub fn from_settings(settings: &Settings, source: Arc<dyn MentorSource>) -> MentorResult<Self> {
        let model = settings.embedding_model()?;
        let generator = FastEmbedGenerator::new(
            model,
            settings.models_dir(),
            settings.embedding.show_download_progress,
        )?;
        Ok(Self::new(
            source,
            Arc::new(generator),
            settings.artifact_store(),
            settings.country_resolver(),
        ))
    }

    /// Source reading the configured JSON export.
    #[must_use]
    pub fn default_source(settings: &Settings) -> Arc<dyn MentorSource> {
        Arc::new(JsonFileSource::new(settings.resolved_mentors_path()))
    }

    #[must_use]
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    #[must_use]
    pub fn source(&self) -> &dyn MentorSource {
        self.source.as_ref()
    }

    /// All mentors, or only those accepting mentees.
    pub fn list_mentors(&self, only_available: bool) -> MentorResult<MentorListing> {
        Ok(self.source.fetch_mentors(only_available)?.into())
    }

    /// Rebuilds the index from available mentors and swaps it in.
    ///
    /// Never returns an error: failures are reported in the
    /// [`BuildReport`] and leave the served engine as it was.
    pub fn rebuild(&self) -> BuildReport {
        let _guard = self.build_lock.lock();
        let mut log = BuildLog::new();

        log.step(format!("Fetching available mentors from {}...", self.source.describe()));
        let records = match self.source.fetch_mentors(true) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "mentor fetch failed");
                let error = crate::error::MentorError::from(e).to_string();
                return BuildReport::failed(log.into_messages(), error);
            }
        };
        log.step(format!("Fetched {} mentors", records.len()));

        let builder = IndexBuilder::new(Arc::clone(&self.generator), self.artifacts.clone());
        match builder.build(records, &mut log) {
            Ok(BuildOutcome::Empty) => BuildReport::empty(log.into_messages()),
            Ok(BuildOutcome::Published(published)) => {
                let records_processed = published.store.len();
                let dimension = published.manifest.dimension.get();
                let generation = published.generation.clone();

                let engine = QueryEngine::from_parts(
                    Arc::clone(&self.generator),
                    Box::new(published.index),
                    published.store,
                    self.resolver.clone(),
                )
                .with_generation(published.generation, published.manifest);
                *self.engine.write() = Some(Arc::new(engine));

                BuildReport {
                    status: BuildStatus::Ok,
                    records_processed,
                    dimension: Some(dimension),
                    generation: Some(generation),
                    messages: log.into_messages(),
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "index build failed");
                BuildReport::failed(log.into_messages(), e.to_string())
            }
        }
    }

    /// Served engine, opened from disk on first use.
    ///
    /// Reopened whenever `CURRENT` names a generation other than the loaded
    /// one, so builds published by another process are picked up. If that
    /// generation fails to open, the loaded engine keeps serving.
    pub fn engine(&self) -> MentorResult<Arc<QueryEngine>> {
        let on_disk = self.artifacts.current_generation();
        if let Some(engine) = self.engine.read().as_ref() {
            if is_current(engine, &on_disk) {
                return Ok(Arc::clone(engine));
            }
        }

        let mut slot = self.engine.write();
        // Another caller may have opened it while we waited
        if let Some(engine) = slot.as_ref() {
            if is_current(engine, &on_disk) {
                return Ok(Arc::clone(engine));
            }
        }
        let engine = match self.open() {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                let Some(stale) = slot.as_ref() else {
                    return Err(e);
                };
                tracing::warn!(
                    error = %e,
                    serving = stale.generation().unwrap_or_default(),
                    "newer generation failed to open"
                );
                return Ok(Arc::clone(stale));
            }
        };
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Re-opens whatever generation `CURRENT` names now.
    pub fn reload(&self) -> MentorResult<Arc<QueryEngine>> {
        let engine = Arc::new(self.open()?);
        *self.engine.write() = Some(Arc::clone(&engine));
        Ok(engine)
    }

    fn open(&self) -> MentorResult<QueryEngine> {
        QueryEngine::open(
            &self.artifacts,
            Arc::clone(&self.generator),
            self.resolver.clone(),
        )
    }

    /// Recommends mentors for a student profile.
    pub fn recommend(&self, profile: &QueryProfile) -> MentorResult<RecommendResponse> {
        self.engine()?.recommend_profile(profile)
    }

    /// Recommends mentors for pre-composed query text.
    pub fn recommend_text(
        &self,
        query: &str,
        top_k: TopK,
        filters: &SearchFilters,
    ) -> MentorResult<RecommendResponse> {
        self.engine()?.recommend(query, top_k, filters)
    }
}

/// A loaded engine is stale only when `CURRENT` names a different generation.
fn is_current(engine: &QueryEngine, on_disk: &MentorResult<Option<String>>) -> bool {
    match on_disk {
        Ok(Some(id)) => engine.generation() == Some(id.as_str()),
        Ok(None) | Err(_) => true,
    }
}
