//! Configuration for the mentor recommendation engine.
//!
//! Settings are layered:
//! - Default values
//! - TOML configuration file (`.mentor-rag/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `MR_` and use double underscores
//! to separate nested levels:
//! - `MR_EMBEDDING__MODEL=BGESmallENV15` sets `embedding.model`
//! - `MR_SERVER__BIND=0.0.0.0:8000` sets `server.bind`
//! - `MR_DATA__MENTORS_PATH=/srv/mentors.json` sets `data.mentors_path`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::semantic::{ArtifactStore, CountryResolver, DEFAULT_CITY_TO_COUNTRY};
use crate::vector::{VectorError, parse_embedding_model};

/// Directory holding the settings file, searched for upwards from the cwd.
pub const CONFIG_DIR: &str = ".mentor-rag";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "MR_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding index generations
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Workspace root directory (where .mentor-rag is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub countries: CountryConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Vector file name inside a generation
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Metadata file name inside a generation
    #[serde(default = "default_meta_file")]
    pub meta_file: String,

    /// Published generations kept on disk (at least 1)
    #[serde(default = "default_keep_generations")]
    pub keep_generations: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DataConfig {
    /// JSON export of mentor records
    #[serde(default = "default_mentors_path")]
    pub mentors_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded models are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CountryConfig {
    /// City to country lookup for the country filter
    #[serde(default = "default_city_to_country")]
    pub city_to_country: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// HTTP server bind address
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("index")
}
fn default_index_file() -> String {
    "mentor_index.vec".to_string()
}
fn default_meta_file() -> String {
    "mentor_meta.json".to_string()
}
fn default_keep_generations() -> usize {
    2
}
fn default_mentors_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("mentors.json")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_true() -> bool {
    true
}
fn default_city_to_country() -> BTreeMap<String, String> {
    DEFAULT_CITY_TO_COUNTRY
        .iter()
        .map(|(city, country)| (city.to_string(), country.to_string()))
        .collect()
}
fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            workspace_root: None,
            storage: StorageConfig::default(),
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            countries: CountryConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_file: default_index_file(),
            meta_file: default_meta_file(),
            keep_generations: default_keep_generations(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            mentors_path: default_mentors_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl Default for CountryConfig {
    fn default() -> Self {
        Self {
            city_to_country: default_city_to_country(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores
            // stay part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Find the settings file by looking for .mentor-rag from the current
    /// directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .mentor-rag is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<PathBuf, String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Cannot read configuration file: {e}"))?;
        toml::from_str::<Settings>(&content).map_err(|e| {
            format!(
                "Invalid configuration file at {}: {e}",
                config_path.display()
            )
        })?;

        Ok(config_path)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Like [`Settings::init_config_file`], rooted at `root`.
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let cities = default_city_to_country()
            .iter()
            .map(|(city, country)| format!("{city} = \"{country}\""))
            .collect::<Vec<_>>()
            .join("\n");

        let template = format!(
            r#"# mentor-rag configuration

# Version of the configuration schema
version = 1

# Directory holding published index generations
index_path = "{CONFIG_DIR}/index"

[storage]
index_file = "mentor_index.vec"
meta_file = "mentor_meta.json"
# Older generations beyond this count are deleted after each build
keep_generations = 2

[data]
# JSON export of mentor records (array, or {{"mentors": [...]}})
mentors_path = "{CONFIG_DIR}/mentors.json"

[embedding]
# One of: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15,
# MultilingualE5Small, ParaphraseMLMiniLML12V2
# Changing the model requires a rebuild
model = "AllMiniLML6V2"
# cache_dir = "/path/to/models"
show_download_progress = true

[server]
bind = "127.0.0.1:8000"

[logging]
# Overridden by RUST_LOG
level = "info"

# Cities resolved to a country by the country filter (case-insensitive).
# A location not listed here is compared as-is.
[countries.city_to_country]
{cities}
"#
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }

    /// Index directory, resolved against the workspace root when relative.
    #[must_use]
    pub fn resolved_index_path(&self) -> PathBuf {
        self.resolve(&self.index_path)
    }

    /// Mentor export path, resolved like [`Settings::resolved_index_path`].
    #[must_use]
    pub fn resolved_mentors_path(&self) -> PathBuf {
        self.resolve(&self.data.mentors_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Directory where embedding models are cached.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.embedding.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("mentor-rag").join("models"))
                .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
        })
    }

    /// Validates the configured model name.
    pub fn embedding_model(&self) -> Result<fastembed::EmbeddingModel, VectorError> {
        parse_embedding_model(&self.embedding.model)
    }

    #[must_use]
    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(
            self.resolved_index_path(),
            self.storage.index_file.clone(),
            self.storage.meta_file.clone(),
            self.storage.keep_generations,
        )
    }

    #[must_use]
    pub fn country_resolver(&self) -> CountryResolver {
        CountryResolver::new(self.countries.city_to_country.clone())
    }
}
