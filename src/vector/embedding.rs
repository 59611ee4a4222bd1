//! Embedding generation for mentor and query text.
//!
//! The builder and the query engine only see the [`EmbeddingGenerator`]
//! trait, so the fastembed backend can be swapped for any other model (or a
//! deterministic test double) without touching retrieval logic.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::vector::{VectorDimension, VectorError};

/// Model names accepted by [`parse_embedding_model`].
pub const SUPPORTED_MODELS: &[&str] = &[
    "AllMiniLML6V2",
    "AllMiniLML12V2",
    "BGESmallENV15",
    "BGEBaseENV15",
    "MultilingualE5Small",
    "ParaphraseMLMiniLML12V2",
];

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe: one generator is shared by every
/// concurrent query against a loaded engine.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// # Returns
    /// One raw (not necessarily normalized) vector per input, in input order.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Name recorded in the index manifest.
    ///
    /// An index is only queried with a generator reporting the same name.
    #[must_use]
    fn model_name(&self) -> String;
}

/// fastembed-backed generator.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Loads `model`, downloading it into `cache_dir` on first use.
    ///
    /// The output dimension is probed with a throwaway embedding rather than
    /// hardcoded per model.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new(
        model: EmbeddingModel,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> Result<Self, VectorError> {
        let has_cached_models = cache_dir.exists()
            && cache_dir
                .read_dir()
                .is_ok_and(|mut entries| entries.any(|_| true));
        if has_cached_models {
            tracing::debug!(cache_dir = %cache_dir.display(), "loading embedding model from cache");
        } else {
            tracing::info!(
                cache_dir = %cache_dir.display(),
                "downloading embedding model (first time only)"
            );
        }

        let model_name = model_to_string(&model);
        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| {
            VectorError::EmbeddingFailed(format!(
                "Failed to initialize embedding model: {e}. \
                 Ensure you have internet connection for first-time model download"
            ))
        })?;

        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| VectorError::EmbeddingFailed(e.to_string()))?;
        let width = probe.first().map(Vec::len).ok_or_else(|| {
            VectorError::EmbeddingFailed("Model returned no embedding for probe text".to_string())
        })?;

        Ok(Self {
            model: Mutex::new(text_model),
            model_name,
            dimension: VectorDimension::new(width)?,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(texts.to_vec(), None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}

/// Parses a configured model name.
///
/// Matching ignores case as well as `-` and `_`, so `all-MiniLM-L6-v2` and
/// `AllMiniLML6V2` name the same model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    let key: String = name
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    match key.as_str() {
        "allminilml6v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "allminilml12v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bgesmallenv15" | "bgesmallen" => Ok(EmbeddingModel::BGESmallENV15),
        "bgebaseenv15" | "bgebaseen" => Ok(EmbeddingModel::BGEBaseENV15),
        "multilinguale5small" => Ok(EmbeddingModel::MultilingualE5Small),
        "paraphrasemlminilml12v2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        _ => Err(VectorError::UnknownModel(name.to_string())),
    }
}

/// Canonical name of a model, as written to manifests and settings.
#[must_use]
pub fn model_to_string(model: &EmbeddingModel) -> String {
    match model {
        EmbeddingModel::AllMiniLML6V2 => "AllMiniLML6V2".to_string(),
        EmbeddingModel::AllMiniLML12V2 => "AllMiniLML12V2".to_string(),
        EmbeddingModel::BGESmallENV15 => "BGESmallENV15".to_string(),
        EmbeddingModel::BGEBaseENV15 => "BGEBaseENV15".to_string(),
        EmbeddingModel::MultilingualE5Small => "MultilingualE5Small".to_string(),
        EmbeddingModel::ParaphraseMLMiniLML12V2 => "ParaphraseMLMiniLML12V2".to_string(),
        other => format!("{other:?}"),
    }
}

/// Deterministic bag-of-words generator for unit tests.
///
/// Each token is hashed into one bucket, so texts sharing vocabulary point in
/// similar directions. Field labels are ignored so that a query and a mentor
/// carrying the same values embed identically.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
    degenerate_marker: Option<String>,
}

#[cfg(test)]
impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    const LABEL_WORDS: &'static [&'static str] = &[
        "name", "expertise", "department", "degree", "current", "position", "company",
        "location", "skills", "interests", "preferred", "domain", "career", "goal", "country",
    ];

    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(256).unwrap(),
            degenerate_marker: None,
        }
    }

    /// Texts containing `marker` embed to the zero vector.
    #[must_use]
    pub fn with_degenerate_marker(mut self, marker: &str) -> Self {
        self.degenerate_marker = Some(marker.to_string());
        self
    }

    fn bucket(token: &str, buckets: usize) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % buckets as u64) as usize
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        let dim = self.dimension.get();
        Ok(texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.0; dim];
                if self
                    .degenerate_marker
                    .as_deref()
                    .is_some_and(|marker| text.contains(marker))
                {
                    return embedding;
                }
                for token in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|t| !t.is_empty())
                    .map(str::to_lowercase)
                    .filter(|t| !Self::LABEL_WORDS.contains(&t.as_str()))
                {
                    embedding[Self::bucket(&token, dim)] += 1.0;
                }
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> String {
        "mock-bag-of-words".to_string()
    }
}
