use crate::embedding::EmbeddingProvider;
use async_trait::async_trait;
use grocer_core::{GrocerError, GrocerResult};
use serde::Deserialize;

/// Embedding provider for any OpenAI-compatible `/embeddings` endpoint
/// (OpenAI, text-embeddings-inference, Ollama, vLLM, ...).
pub struct HttpEmbedding {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedding {
    /// Creates a provider posting to `<base_url>/embeddings`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            dimension,
            http: reqwest::Client::new(),
        }
    }

    /// Sends `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    async fn request(&self, texts: &[&str]) -> GrocerResult<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GrocerError::Embedding(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GrocerError::Embedding(format!(
                "Embedding API returned {status}: {text}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| GrocerError::Embedding(format!("Invalid embedding response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(GrocerError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> GrocerResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(GrocerError::Embedding("Cannot embed empty text".to_string()));
        }
        self.request(&[text])
            .await?
            .pop()
            .ok_or_else(|| GrocerError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> GrocerResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
