use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, VectorError, VectorResult, VECTOR_TIMEOUT};

pub const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Text → embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;
}

/// Gemini `text-embedding-004` over the `:embedContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiEmbedder {
    pub fn new(client: Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let url = format!(
            "{}/v1beta/models/{EMBEDDING_MODEL}:embedContent",
            self.base_url
        );
        let request = EmbedRequest {
            model: format!("models/{EMBEDDING_MODEL}"),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(VECTOR_TIMEOUT)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: EmbedResponse = response.json().await?;
        let values = body
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| VectorError::Response("embedding missing from response".to_string()))?;

        debug!(dimensions = values.len(), "Generated embedding");
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockUpstream, Reply};
    use serde_json::json;

    #[tokio::test]
    async fn test_embed_request_and_response() {
        let upstream = MockUpstream::start(vec![Reply::ok(json!({
            "embedding": { "values": [0.1, 0.2, 0.3] }
        }))])
        .await;
        let embedder = GeminiEmbedder::new(Client::new(), &upstream.base_url(), "g".into());

        let values = embedder.embed("Name: Ada").await.unwrap();

        assert_eq!(values, vec![0.1, 0.2, 0.3]);
        let seen = upstream.requests();
        assert_eq!(
            seen[0].path,
            "/v1beta/models/text-embedding-004:embedContent"
        );
        assert_eq!(seen[0].query.as_deref(), Some("key=g"));
        assert_eq!(seen[0].body["model"], "models/text-embedding-004");
        assert_eq!(seen[0].body["content"]["parts"][0]["text"], "Name: Ada");
    }

    #[tokio::test]
    async fn test_embed_api_error_keeps_body() {
        let upstream = MockUpstream::start(vec![Reply::status(
            400,
            json!({ "error": { "message": "API key not valid" } }),
        )])
        .await;
        let embedder = GeminiEmbedder::new(Client::new(), &upstream.base_url(), "bad".into());

        match embedder.embed("x").await {
            Err(VectorError::Api { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("API key not valid"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_missing_values() {
        let upstream = MockUpstream::start(vec![Reply::ok(json!({}))]).await;
        let embedder = GeminiEmbedder::new(Client::new(), &upstream.base_url(), "g".into());
        assert!(matches!(
            embedder.embed("x").await,
            Err(VectorError::Response(_))
        ));
    }
}
