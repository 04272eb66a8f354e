//! HTTP embedding client.

use super::Embedder;
use crate::{Error, Result};
use serde_json::{json, Value};

/// Embedding client posting OpenAI-format requests to `/v1/embeddings`.
#[derive(Debug)]
pub struct HttpEmbeddingClient {
    http_client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    dimensions: usize,
}

impl HttpEmbeddingClient {
    pub fn builder() -> HttpEmbeddingClientBuilder {
        HttpEmbeddingClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn execute(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let endpoint = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dimensions,
        });
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("embedding request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::embedding(format!("failed to read embedding response: {e}")))?;
        if !status.is_success() {
            return Err(Error::embedding(format!(
                "embedding API error ({status}): {body}"
            )));
        }

        let json: Value = serde_json::from_str(&body)?;
        parse_vectors(&json)
    }
}

/// `data[*].embedding` in index order.
fn parse_vectors(response: &Value) -> Result<Vec<Vec<f32>>> {
    let mut items: Vec<(usize, Vec<f32>)> = response["data"]
        .as_array()
        .ok_or_else(|| Error::embedding("embedding response missing `data` array"))?
        .iter()
        .map(|item| {
            let index = item["index"].as_u64().unwrap_or(0) as usize;
            let vector = item["embedding"]
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect()
                })
                .unwrap_or_default();
            (index, vector)
        })
        .collect();
    items.sort_by_key(|(index, _)| *index);
    Ok(items.into_iter().map(|(_, vector)| vector).collect())
}

#[async_trait::async_trait]
impl Embedder for HttpEmbeddingClient {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.execute(texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "embedding count mismatch: {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

pub struct HttpEmbeddingClientBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    dimensions: usize,
}

impl HttpEmbeddingClientBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            dimensions: 384,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn build(self) -> Result<HttpEmbeddingClient> {
        let model = self
            .model
            .ok_or_else(|| Error::configuration("embedding model must be specified"))?;
        let api_key = self
            .api_key
            .or_else(|| std::env::var("AGENT_TOOLS_EMBEDDING_API_KEY").ok())
            .ok_or_else(|| Error::configuration("embedding API key required"))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string())
            .trim_end_matches('/')
            .to_string();
        let http_client = reqwest::Client::builder()
            .timeout(crate::config::http_timeout_from_env())
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(HttpEmbeddingClient {
            http_client,
            model,
            base_url,
            api_key,
            dimensions: self.dimensions,
        })
    }
}

impl Default for HttpEmbeddingClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
