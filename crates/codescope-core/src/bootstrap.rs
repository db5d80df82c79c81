//! Application bootstrap: config resolution, embedder/store/orchestrator construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use codescope_embed::config::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL};
use codescope_embed::{Embedder, GoogleConfig, OpenAiConfig, ProviderConfig};
use codescope_index::{
    ChunkerConfig, CodeIndexer, CodeRetriever, IndexerConfig, RetrievalConfig, SourceFilter,
};
use codescope_store::{QdrantStore, VectorStore};

use crate::config::{Config, ProviderKind};
use crate::vault::EnvVaultProvider;

pub struct AppBuilder {
    root: PathBuf,
    config: Config,
}

impl AppBuilder {
    /// Resolve the workspace root, load its config and resolve secrets from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist, the config is invalid, or a
    /// required secret cannot be resolved.
    pub async fn new(root: &Path, config_path: Option<&Path>) -> anyhow::Result<Self> {
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("workspace root {} not found", root.display()))?;
        let mut config = Config::load(&root, config_path)?;

        config.resolve_secrets(&EnvVaultProvider).await?;

        tracing::debug!(
            root = %root.display(),
            collection = %config.collection,
            provider = config.provider.as_str(),
            "configuration resolved"
        );
        Ok(Self { root, config })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared, not yet initialized embedder.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected provider lacks a required setting.
    pub fn build_embedder(&self) -> anyhow::Result<Arc<Embedder>> {
        Ok(Arc::new(Embedder::new(create_provider_config(&self.config)?)))
    }

    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn build_store(&self) -> anyhow::Result<Arc<dyn VectorStore>> {
        let api_key = self
            .config
            .secrets
            .qdrant_api_key
            .as_ref()
            .map(|s| s.expose().to_owned());
        let store = QdrantStore::new(&self.config.qdrant_url, api_key)
            .with_context(|| format!("failed to connect to Qdrant at {}", self.config.qdrant_url))?;
        Ok(Arc::new(store))
    }

    /// # Errors
    ///
    /// Returns an error if the exclusion globs do not parse.
    pub fn build_indexer(
        &self,
        store: Arc<dyn VectorStore>,
        embedder: Arc<Embedder>,
    ) -> anyhow::Result<CodeIndexer> {
        Ok(CodeIndexer::new(
            store,
            embedder,
            create_indexer_config(&self.config)?,
        ))
    }

    #[must_use]
    pub fn build_retriever(
        &self,
        store: Arc<dyn VectorStore>,
        embedder: Arc<Embedder>,
    ) -> CodeRetriever {
        CodeRetriever::new(store, embedder, create_retrieval_config(&self.config))
    }
}

/// Map the configured provider to the embedding backend description.
///
/// # Errors
///
/// Returns an error if `openai`/`google` has no resolved key or `google` has no project.
pub fn create_provider_config(config: &Config) -> anyhow::Result<ProviderConfig> {
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| config.provider.default_model().to_owned());

    match config.provider {
        ProviderKind::Local => Ok(ProviderConfig::Local { model }),
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .api_key
                .as_ref()
                .context("openai provider requires api_key (or OPENAI_API_KEY)")?;
            Ok(ProviderConfig::OpenAi(OpenAiConfig {
                api_key: api_key.expose().to_owned(),
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_owned()),
                model,
                max_retries: config.max_retries,
            }))
        }
        ProviderKind::Google => {
            let access_token = config
                .secrets
                .api_key
                .as_ref()
                .context("google provider requires api_key (or GOOGLE_ACCESS_TOKEN)")?;
            let project = config
                .google_project
                .clone()
                .context("google provider requires google_project")?;
            Ok(ProviderConfig::Google(GoogleConfig {
                access_token: access_token.expose().to_owned(),
                project,
                location: config.google_location.clone(),
                model,
                base_url: config.base_url.clone(),
                max_retries: config.max_retries,
            }))
        }
        ProviderKind::Ollama => Ok(ProviderConfig::Ollama {
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_owned()),
            model,
        }),
    }
}

/// # Errors
///
/// Returns an error if the exclusion globs do not parse.
pub fn create_indexer_config(config: &Config) -> anyhow::Result<IndexerConfig> {
    Ok(IndexerConfig {
        collection: config.collection.clone(),
        dimension: config.dimension,
        distance: config.distance,
        chunker: ChunkerConfig {
            window: config.chunk_size,
            overlap: config.overlap,
        },
        batch_size: config.batch_size,
        embed_concurrency: config.embed_concurrency,
        reindex_files: config.reindex_files,
        filter: SourceFilter::new(&config.exclude, config.respect_gitignore)?,
    })
}

#[must_use]
pub fn create_retrieval_config(config: &Config) -> RetrievalConfig {
    RetrievalConfig {
        collection: config.collection.clone(),
        limit: config.search_limit,
        min_score: config.min_score,
    }
}

#[cfg(test)]
mod tests {
    use codescope_store::DistanceMetric;

    use super::*;
    use crate::vault::Secret;

    fn config_with(provider: ProviderKind) -> Config {
        Config {
            collection: "code".into(),
            provider,
            ..Config::default()
        }
    }

    #[test]
    fn local_uses_default_model() {
        let cfg = create_provider_config(&config_with(ProviderKind::Local)).unwrap();
        assert!(matches!(
            cfg,
            ProviderConfig::Local { ref model } if model == "sentence-transformers/all-MiniLM-L6-v2"
        ));
    }

    #[test]
    fn openai_requires_key() {
        assert!(create_provider_config(&config_with(ProviderKind::OpenAi)).is_err());

        let mut config = config_with(ProviderKind::OpenAi);
        config.secrets.api_key = Some(Secret::new("sk-test"));
        config.max_retries = 5;
        let ProviderConfig::OpenAi(openai) = create_provider_config(&config).unwrap() else {
            panic!("expected openai config");
        };
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.model, "text-embedding-3-small");
        assert_eq!(openai.base_url, "https://api.openai.com/v1");
        assert_eq!(openai.max_retries, 5);
    }

    #[test]
    fn google_requires_project_and_token() {
        let mut config = config_with(ProviderKind::Google);
        config.secrets.api_key = Some(Secret::new("ya29.token"));
        assert!(create_provider_config(&config).is_err());

        config.google_project = Some("proj-1".into());
        let ProviderConfig::Google(google) = create_provider_config(&config).unwrap() else {
            panic!("expected google config");
        };
        assert_eq!(google.project, "proj-1");
        assert_eq!(google.location, "us-central1");
        assert_eq!(google.model, "text-embedding-004");
    }

    #[test]
    fn ollama_honors_base_url_and_model() {
        let mut config = config_with(ProviderKind::Ollama);
        config.base_url = Some("http://gpu-box:11434".into());
        config.model = Some("mxbai-embed-large".into());
        let ProviderConfig::Ollama { base_url, model } = create_provider_config(&config).unwrap()
        else {
            panic!("expected ollama config");
        };
        assert_eq!(base_url, "http://gpu-box:11434");
        assert_eq!(model, "mxbai-embed-large");
    }

    #[test]
    fn indexer_config_maps_fields() {
        let mut config = config_with(ProviderKind::Local);
        config.chunk_size = 40;
        config.overlap = Some(8);
        config.batch_size = 64;
        config.distance = DistanceMetric::Dot;
        config.dimension = Some(384);
        config.reindex_files = false;

        let ic = create_indexer_config(&config).unwrap();
        assert_eq!(ic.collection, "code");
        assert_eq!(
            ic.chunker,
            ChunkerConfig {
                window: 40,
                overlap: Some(8),
            }
        );
        assert_eq!(ic.batch_size, 64);
        assert_eq!(ic.distance, DistanceMetric::Dot);
        assert_eq!(ic.dimension, Some(384));
        assert!(!ic.reindex_files);
        assert!(ic.filter.is_excluded("node_modules/x/index.js"));
    }

    #[test]
    fn invalid_exclude_glob_fails_indexer_config() {
        let mut config = config_with(ProviderKind::Local);
        config.exclude = vec!["[".into()];
        assert!(create_indexer_config(&config).is_err());
    }

    #[test]
    fn retrieval_config_maps_fields() {
        let mut config = config_with(ProviderKind::Local);
        config.search_limit = 5;
        config.min_score = Some(0.4);
        let rc = create_retrieval_config(&config);
        assert_eq!(rc.collection, "code");
        assert_eq!(rc.limit, 5);
        assert_eq!(rc.min_score, Some(0.4));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn new_canonicalizes_root_and_derives_collection() {
        unsafe {
            std::env::remove_var("CODESCOPE_CONFIG");
            std::env::remove_var("CODESCOPE_COLLECTION");
        }
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("svc");
        std::fs::create_dir(&root).unwrap();

        let app = AppBuilder::new(&root, None).await.unwrap();
        assert_eq!(app.root(), std::fs::canonicalize(&root).unwrap());
        assert_eq!(app.config().collection, "svc_vectors");
        assert!(app.build_embedder().is_ok());
        assert!(app.build_store().is_ok());
    }

    #[tokio::test]
    async fn new_fails_for_missing_root() {
        assert!(AppBuilder::new(Path::new("/nonexistent/root/xyz"), None).await.is_err());
    }
}
