//! OpenAI-compatible query embedder
//!
//! Posts `{model, input}` to `<base_url>/embeddings` and returns the first
//! vector of the reply. Any server speaking the OpenAI embeddings API works,
//! including local ones that need no key.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::QueryEmbedder;
use crate::catalog::BackendError;
use crate::config::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`QueryEmbedder`] backed by an OpenAI-compatible HTTP endpoint
pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiEmbedder {
    /// Build the client from `config`, reading the key from its environment variable if needed
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be created.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, BackendError> {
        Self::new(config, config.resolved_api_key())
    }

    /// Build the client with an explicit key
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be created.
    pub fn new(config: &EmbeddingConfig, api_key: Option<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {e}")))?;

        let url = format!("{}/embeddings", config.base_url.trim_end_matches('/'));
        tracing::debug!(%url, model = %config.model, keyed = api_key.is_some(), "query embedder ready");

        Ok(Self {
            client,
            url,
            model: config.model.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl QueryEmbedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
            encoding_format: "float",
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED && self.api_key.is_none() {
                return Err(BackendError::SearchUnavailable(format!(
                    "no API key configured (set {} or embeddings.api_key)",
                    self.api_key_env
                )));
            }
            let message = response
                .json::<ErrorResponse>()
                .await
                .map_or_else(|_| "unknown error".to_string(), |body| body.error.message);
            tracing::warn!(%status, %message, "embedding endpoint rejected request");
            return Err(BackendError::Server(format!(
                "Embedding endpoint returned {status}: {message}"
            )));
        }

        let reply: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Server(format!("Failed to parse embedding response: {e}")))?;

        reply
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| BackendError::Server("Embedding endpoint returned no vector".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: format!("{}/v1/", server.uri()),
            model: "test-embed".into(),
            timeout_secs: 5,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_embed_posts_model_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-embed",
                "input": ["red dress"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.5, -0.25, 1.0], "index": 0 }],
                "model": "test-embed",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config_for(&server), Some("sk-test".into())).unwrap();
        assert_eq!(embedder.embed("red dress").await.unwrap(), vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn test_missing_key_reported_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config_for(&server), None).unwrap();
        match embedder.embed("red").await {
            Err(BackendError::SearchUnavailable(message)) => assert!(message.contains("OPENAI_API_KEY")),
            other => panic!("Expected SearchUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached" }
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config_for(&server), Some("sk-test".into())).unwrap();
        match embedder.embed("red").await {
            Err(BackendError::Server(message)) => {
                assert!(message.contains("429"));
                assert!(message.contains("Rate limit reached"));
            }
            other => panic!("Expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config_for(&server), None).unwrap();
        assert!(matches!(embedder.embed("red").await, Err(BackendError::Server(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let config = EmbeddingConfig {
            base_url: format!("http://{addr}/v1"),
            timeout_secs: 5,
            ..EmbeddingConfig::default()
        };

        let embedder = OpenAiEmbedder::new(&config, None).unwrap();
        assert!(matches!(embedder.embed("red").await, Err(BackendError::Transport(_))));
    }
}
