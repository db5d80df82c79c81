//! Google Vertex AI text embeddings (`publishers/google/models/*:predict`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GoogleConfig;
use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;
use crate::retry::send_with_retry;

#[derive(Clone)]
pub struct GoogleEmbedder {
    client: reqwest::Client,
    access_token: String,
    endpoint: String,
    max_retries: u32,
}

impl fmt::Debug for GoogleEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleEmbedder")
            .field("client", &"<reqwest::Client>")
            .field("access_token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GoogleEmbedder {
    /// # Errors
    ///
    /// Returns `EmbedError::Config` when the project or access token is missing.
    pub fn new(config: &GoogleConfig) -> Result<Self, EmbedError> {
        if config.project.trim().is_empty() {
            return Err(EmbedError::Config(
                "the google provider requires a project id".into(),
            ));
        }
        if config.access_token.trim().is_empty() {
            return Err(EmbedError::Config(
                "the google provider requires an access token".into(),
            ));
        }
        Ok(Self {
            client: crate::http::default_client()?,
            access_token: config.access_token.clone(),
            endpoint: config.endpoint(),
            max_retries: config.max_retries,
        })
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
}

#[derive(Serialize)]
struct Instance<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct Prediction {
    embeddings: PredictionEmbeddings,
}

#[derive(Deserialize)]
struct PredictionEmbeddings {
    values: Vec<f32>,
}

impl EmbeddingProvider for GoogleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = PredictRequest {
            instances: [Instance { content: text }],
        };

        let response = send_with_retry("google", self.max_retries, || {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.access_token)
                .json(&body)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(EmbedError::from_response("google", response).await);
        }

        let parsed: PredictResponse = response.json().await?;
        parsed
            .predictions
            .into_iter()
            .next()
            .map(|p| p.embeddings.values)
            .filter(|v| !v.is_empty())
            .ok_or(EmbedError::EmptyResponse { provider: "google" })
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PREDICT_PATH: &str =
        "/v1/projects/acme/locations/us-central1/publishers/google/models/text-embedding-005:predict";

    fn config(base_url: &str) -> GoogleConfig {
        GoogleConfig {
            access_token: "ya29.token".into(),
            project: "acme".into(),
            location: "us-central1".into(),
            model: "text-embedding-005".into(),
            base_url: Some(base_url.into()),
            max_retries: 2,
        }
    }

    #[test]
    fn missing_project_is_rejected() {
        let mut cfg = config("http://localhost");
        cfg.project = String::new();
        assert!(matches!(
            GoogleEmbedder::new(&cfg),
            Err(EmbedError::Config(_))
        ));
    }

    #[tokio::test]
    async fn reads_first_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .and(header("authorization", "Bearer ya29.token"))
            .and(body_json(serde_json::json!({
                "instances": [{"content": "open a socket"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{
                    "embeddings": {
                        "statistics": {"truncated": false, "token_count": 3},
                        "values": [0.1, 0.2, 0.3]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = GoogleEmbedder::new(&config(&server.uri())).unwrap();
        let vector = embedder.embed("open a socket").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{"embeddings": {"values": [1.0]}}]
            })))
            .mount(&server)
            .await;

        let embedder = GoogleEmbedder::new(&config(&server.uri())).unwrap();
        assert_eq!(embedder.embed("x").await.unwrap(), vec![1.0]);
    }

    #[tokio::test]
    async fn missing_predictions_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let embedder = GoogleEmbedder::new(&config(&server.uri())).unwrap();
        assert!(matches!(
            embedder.embed("x").await,
            Err(EmbedError::EmptyResponse { provider: "google" })
        ));
    }
}
