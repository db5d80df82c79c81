mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use codescope_index::SourceFilter;

use crate::vault::{Secret, SecretRef, VaultProvider};

pub const CONFIG_FILE: &str = ".codescope.toml";
pub const LEGACY_CONFIG_FILE: &str = ".semantic-search.json";
pub const CONFIG_PATH_ENV: &str = "CODESCOPE_CONFIG";

const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
const GOOGLE_TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";

impl Config {
    /// Load the configuration for the workspace at `root`.
    ///
    /// Lookup order: `explicit`, `$CODESCOPE_CONFIG`, `<root>/.codescope.toml`,
    /// `<root>/.semantic-search.json`. Falls back to defaults when none exists, then
    /// applies env overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed, or if the result
    /// fails validation.
    pub fn load(root: &Path, explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = resolve_config_path(root, explicit) {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(&path)?
        } else {
            tracing::warn!("no {CONFIG_FILE} or {LEGACY_CONFIG_FILE} found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        if config.collection.trim().is_empty() {
            config.collection = default_collection(root);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse one config file. `.json` files are read as JSON, everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))
        }
    }

    /// Validate numeric ranges and exclusion globs.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.collection.trim().is_empty() {
            bail!("collection must not be empty");
        }
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than 0");
        }
        if let Some(overlap) = self.overlap
            && overlap >= self.chunk_size
        {
            bail!(
                "overlap ({overlap}) must be smaller than chunk_size ({})",
                self.chunk_size
            );
        }
        if self.batch_size == 0 {
            bail!("batch_size must be greater than 0");
        }
        if self.search_limit == 0 {
            bail!("search_limit must be greater than 0");
        }
        if self.embed_concurrency == 0 {
            bail!("embed_concurrency must be greater than 0");
        }
        if self.dimension == Some(0) {
            bail!("dimension must be greater than 0");
        }
        if let Some(min) = self.min_score
            && !min.is_finite()
        {
            bail!("min_score must be a finite number");
        }
        SourceFilter::new(&self.exclude, self.respect_gitignore)?;
        Ok(())
    }

    /// Resolve `api_key` and `qdrant_api_key` through the vault.
    ///
    /// Without an explicit `api_key`, `OPENAI_API_KEY` or `GOOGLE_ACCESS_TOKEN` is
    /// consulted for the providers that need one.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails or if a `${env.NAME}` reference
    /// needed by the selected provider is not set.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(raw) = self.api_key.as_deref() {
            match SecretRef::parse(raw).resolve(vault).await? {
                Some(secret) => self.secrets.api_key = Some(secret),
                None if self.provider.needs_secret() => {
                    bail!("api_key refers to {raw}, which is not set");
                }
                None => tracing::warn!("api_key refers to {raw}, which is not set"),
            }
        } else {
            let fallback = match self.provider {
                ProviderKind::OpenAi => Some(OPENAI_KEY_ENV),
                ProviderKind::Google => Some(GOOGLE_TOKEN_ENV),
                ProviderKind::Local | ProviderKind::Ollama => None,
            };
            if let Some(key) = fallback
                && let Some(val) = vault.get_secret(key).await?
            {
                self.secrets.api_key = Some(Secret::new(val));
            }
        }

        if let Some(raw) = self.qdrant_api_key.as_deref() {
            match SecretRef::parse(raw).resolve(vault).await? {
                Some(secret) => self.secrets.qdrant_api_key = Some(secret),
                None => bail!("qdrant_api_key refers to {raw}, which is not set"),
            }
        }
        Ok(())
    }

    /// Copy with literal secrets masked. `${env.NAME}` references are kept.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| {
            value.as_deref().map(|raw| match SecretRef::parse(raw) {
                SecretRef::Env(_) => raw.to_owned(),
                SecretRef::Literal(_) => "[REDACTED]".to_owned(),
            })
        };
        Self {
            api_key: mask(&self.api_key),
            qdrant_api_key: mask(&self.qdrant_api_key),
            ..self.clone()
        }
    }

    /// Render as TOML with secrets masked.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(&self.redacted()).context("failed to serialize config")
    }
}

fn resolve_config_path(root: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    [CONFIG_FILE, LEGACY_CONFIG_FILE]
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// `<root folder name>_vectors`.
#[must_use]
pub fn default_collection(root: &Path) -> String {
    let resolved = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let name = resolved
        .file_name()
        .map_or_else(|| "workspace".into(), |n| n.to_string_lossy().into_owned());
    format!("{name}_vectors")
}
