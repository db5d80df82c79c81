use serde::{Deserialize, Serialize};

use codescope_embed::config::{
    DEFAULT_GOOGLE_LOCATION, DEFAULT_GOOGLE_MODEL, DEFAULT_LOCAL_MODEL, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OPENAI_MODEL,
};
use codescope_index::chunker::DEFAULT_WINDOW;
use codescope_index::indexer::DEFAULT_BATCH_SIZE;
use codescope_index::retriever::DEFAULT_SEARCH_LIMIT;
use codescope_index::workspace::DEFAULT_EXCLUDES;
use codescope_store::DistanceMetric;
use codescope_store::qdrant::DEFAULT_QDRANT_URL;

use crate::vault::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Local,
    #[serde(alias = "openAI", alias = "open_ai")]
    OpenAi,
    Google,
    Ollama,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Ollama => "ollama",
        }
    }

    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Local => DEFAULT_LOCAL_MODEL,
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Google => DEFAULT_GOOGLE_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Whether this backend cannot work without an API key or access token.
    #[must_use]
    pub fn needs_secret(self) -> bool {
        matches!(self, Self::OpenAi | Self::Google)
    }
}

/// Per-workspace settings. TOML keys are `snake_case`; the legacy JSON file spells
/// them in camelCase.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Empty means `<root folder name>_vectors`.
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u64>,
    pub distance: DistanceMetric,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Literal key or `${env.NAME}`.
    #[serde(alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(alias = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(alias = "googleProject", skip_serializing_if = "Option::is_none")]
    pub google_project: Option<String>,
    #[serde(alias = "googleLocation")]
    pub google_location: String,
    pub exclude: Vec<String>,
    #[serde(alias = "chunkSize")]
    pub chunk_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
    pub watch: bool,
    #[serde(alias = "qdrantUrl")]
    pub qdrant_url: String,
    #[serde(alias = "qdrantApiKey", skip_serializing_if = "Option::is_none")]
    pub qdrant_api_key: Option<String>,
    #[serde(alias = "batchSize")]
    pub batch_size: usize,
    #[serde(alias = "searchLimit")]
    pub search_limit: usize,
    #[serde(alias = "minScore", skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
    #[serde(alias = "embedConcurrency")]
    pub embed_concurrency: usize,
    #[serde(alias = "maxRetries")]
    pub max_retries: u32,
    #[serde(alias = "respectGitignore")]
    pub respect_gitignore: bool,
    #[serde(alias = "reindexFiles")]
    pub reindex_files: bool,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection: String::new(),
            dimension: None,
            distance: DistanceMetric::default(),
            provider: ProviderKind::default(),
            model: None,
            api_key: None,
            base_url: None,
            google_project: None,
            google_location: DEFAULT_GOOGLE_LOCATION.into(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_owned()).collect(),
            chunk_size: DEFAULT_WINDOW,
            overlap: None,
            watch: false,
            qdrant_url: DEFAULT_QDRANT_URL.into(),
            qdrant_api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            search_limit: DEFAULT_SEARCH_LIMIT,
            min_score: None,
            embed_concurrency: 1,
            max_retries: 3,
            respect_gitignore: true,
            reindex_files: true,
            secrets: ResolvedSecrets::default(),
        }
    }
}

/// Secrets resolved from the vault. Never serialized.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub api_key: Option<Secret>,
    pub qdrant_api_key: Option<Secret>,
}
