#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("embedding provider is not initialized")]
    NotInitialized,

    #[error("embedding dimension changed: expected {expected}, got {actual}")]
    DimensionChanged { expected: usize, actual: usize },

    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[cfg(feature = "candle")]
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("{0}")]
    Other(String),
}

impl EmbedError {
    /// Build a [`EmbedError::Status`] from a non-success response, consuming its body.
    pub(crate) async fn from_response(provider: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let mut body = response.text().await.unwrap_or_default();
        body.truncate(512);
        Self::Status {
            provider,
            status,
            body,
        }
    }
}

pub type Result<T> = std::result::Result<T, EmbedError>;
