use tokio::sync::OnceCell;

use crate::any::AnyEmbedder;
use crate::config::ProviderConfig;
use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

const PROBE_TEXT: &str = "probe";

#[derive(Debug)]
struct Ready {
    provider: AnyEmbedder,
    dimension: usize,
}

/// A configured embedding provider with a one-time, idempotent initialization step.
///
/// `init` builds the backend (loading a local model if needed) and embeds a probe string
/// to learn the output dimension. Concurrent callers of `init` share a single
/// initialization; a failed attempt leaves the embedder uninitialized so it can be retried.
#[derive(Debug)]
pub struct Embedder {
    config: ProviderConfig,
    state: OnceCell<Ready>,
}

impl Embedder {
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            state: OnceCell::new(),
        }
    }

    /// Initialize the provider and return the embedding dimension.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if it cannot be built or the probe embedding fails.
    pub async fn init(&self) -> Result<usize, EmbedError> {
        let ready = self
            .state
            .get_or_try_init(|| async {
                tracing::info!(provider = self.config.kind(), "initializing embedding provider");
                let provider = AnyEmbedder::connect(&self.config).await?;
                let probe = provider.embed(PROBE_TEXT).await?;
                if probe.is_empty() {
                    return Err(EmbedError::EmptyResponse {
                        provider: provider.name(),
                    });
                }
                tracing::info!(
                    provider = provider.name(),
                    dimension = probe.len(),
                    "embedding provider ready"
                );
                Ok(Ready {
                    provider,
                    dimension: probe.len(),
                })
            })
            .await?;
        Ok(ready.dimension)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.initialized()
    }

    /// Output size, known once `init` has succeeded.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.state.get().map(|r| r.dimension)
    }

    /// Embed `text` with the initialized provider.
    ///
    /// # Errors
    ///
    /// Returns `EmbedError::NotInitialized` before a successful `init`,
    /// `EmbedError::DimensionChanged` if the provider answers with a different length
    /// than the probe, or the provider's own error.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let ready = self.state.get().ok_or(EmbedError::NotInitialized)?;
        let vector = ready.provider.embed(text).await?;
        if vector.len() != ready.dimension {
            return Err(EmbedError::DimensionChanged {
                expected: ready.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.config.kind()
    }
}
