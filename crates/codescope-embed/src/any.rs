#[cfg(feature = "candle")]
use crate::candle_provider::LocalEmbedder;
use crate::config::ProviderConfig;
use crate::error::EmbedError;
use crate::google::GoogleEmbedder;
#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAiEmbedder;
use crate::provider::EmbeddingProvider;

/// Generates a match over all `AnyEmbedder` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            #[cfg(feature = "candle")]
            AnyEmbedder::Local($p) => $expr,
            AnyEmbedder::OpenAi($p) => $expr,
            AnyEmbedder::Google($p) => $expr,
            AnyEmbedder::Ollama($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    #[cfg(feature = "candle")]
    Local(LocalEmbedder),
    OpenAi(OpenAiEmbedder),
    Google(GoogleEmbedder),
    Ollama(OllamaEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl AnyEmbedder {
    /// Build the backend described by `config`. The local model is loaded here.
    ///
    /// # Errors
    ///
    /// Returns `EmbedError::Config` for incomplete settings, `EmbedError::Unsupported`
    /// when the local provider was compiled out, or a model loading error.
    pub async fn connect(config: &ProviderConfig) -> Result<Self, EmbedError> {
        match config {
            #[cfg(feature = "candle")]
            ProviderConfig::Local { model } => Ok(Self::Local(LocalEmbedder::load(model).await?)),
            #[cfg(not(feature = "candle"))]
            ProviderConfig::Local { .. } => Err(EmbedError::Unsupported(
                "the local provider requires building with the `candle` feature".into(),
            )),
            ProviderConfig::OpenAi(cfg) => Ok(Self::OpenAi(OpenAiEmbedder::new(cfg)?)),
            ProviderConfig::Google(cfg) => Ok(Self::Google(GoogleEmbedder::new(cfg)?)),
            ProviderConfig::Ollama { base_url, model } => {
                Ok(Self::Ollama(OllamaEmbedder::new(base_url, model.clone())))
            }
            #[cfg(feature = "mock")]
            ProviderConfig::Mock(mock) => Ok(Self::Mock(mock.clone())),
        }
    }
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    fn name(&self) -> &'static str {
        delegate_provider!(self, |p| p.name())
    }
}
