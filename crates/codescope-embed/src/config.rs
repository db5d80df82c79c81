use std::fmt;

#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;

pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GOOGLE_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GOOGLE_LOCATION: &str = "us-central1";
pub const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Which backend to build and how to reach it.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Local { model: String },
    OpenAi(OpenAiConfig),
    Google(GoogleConfig),
    Ollama { base_url: String, model: String },
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl ProviderConfig {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::OpenAi(_) => "openai",
            Self::Google(_) => "google",
            Self::Ollama { .. } => "ollama",
            #[cfg(feature = "mock")]
            Self::Mock(_) => "mock",
        }
    }
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth2 bearer token for the Vertex AI endpoint.
    pub access_token: String,
    pub project: String,
    pub location: String,
    pub model: String,
    /// Overrides `https://{location}-aiplatform.googleapis.com`.
    pub base_url: Option<String>,
    pub max_retries: u32,
}

impl GoogleConfig {
    #[must_use]
    pub fn endpoint(&self) -> String {
        let base = self.base_url.as_deref().map_or_else(
            || format!("https://{}-aiplatform.googleapis.com", self.location),
            |b| b.trim_end_matches('/').to_owned(),
        );
        format!(
            "{base}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.project, self.location, self.model
        )
    }
}

impl fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &"<redacted>")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
