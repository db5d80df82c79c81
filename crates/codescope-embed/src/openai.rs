use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;
use crate::retry::send_with_retry;

#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl OpenAiEmbedder {
    /// # Errors
    ///
    /// Returns `EmbedError::Config` when the API key is empty, or an HTTP error if the
    /// client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, EmbedError> {
        if config.api_key.trim().is_empty() {
            return Err(EmbedError::Config(
                "the openai provider requires an API key".into(),
            ));
        }
        Ok(Self {
            client: crate::http::default_client()?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.model,
        };
        let url = format!("{}/embeddings", self.base_url);

        let response = send_with_retry("openai", self.max_retries, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(EmbedError::from_response("openai", response).await);
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(EmbedError::EmptyResponse { provider: "openai" })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: "sk-test".into(),
            base_url: base_url.into(),
            model: "text-embedding-3-small".into(),
            max_retries: 2,
        }
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let mut cfg = config("http://localhost");
        cfg.api_key = "  ".into();
        assert!(matches!(
            OpenAiEmbedder::new(&cfg),
            Err(EmbedError::Config(_))
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let embedder = OpenAiEmbedder::new(&config("http://localhost")).unwrap();
        assert!(!format!("{embedder:?}").contains("sk-test"));
    }

    #[test]
    fn request_body_has_only_model_and_input() {
        let body = EmbeddingRequest {
            input: "fn main() {}",
            model: "m",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"input": "fn main() {}", "model": "m"}));
    }

    #[tokio::test]
    async fn embeds_first_data_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "input": "parse the config",
                "model": "text-embedding-3-small"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"object": "embedding", "index": 0, "embedding": [0.5, -0.25, 1.0]}],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        let vector = embedder.embed("parse the config").await.unwrap();
        assert_eq!(vector, vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn retries_rate_limited_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        assert_eq!(embedder.embed("x").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn client_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        let err = embedder.embed("x").await.unwrap_err();
        let EmbedError::Status { status, ref body, .. } = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(status, 401);
        assert!(body.contains("invalid"));
    }

    #[tokio::test]
    async fn empty_data_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        assert!(matches!(
            embedder.embed("x").await,
            Err(EmbedError::EmptyResponse { provider: "openai" })
        ));
    }
}
