use crate::config::EmbeddingConfig;
use crate::error::RagError;
use crate::retry::with_retries;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1_536;

#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

/// Embedding client for an external API that accepts `{model, input}` and
/// answers `{embedding: [..]}`.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    config: EmbeddingConfig,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(client: Client, config: EmbeddingConfig, max_retries: u32) -> Self {
        Self {
            client,
            config,
            max_retries,
        }
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&EmbedRequest {
                model: &self.config.model,
                input: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagError::BackendResponse {
                backend: "embeddings".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: EmbedResponse = response.json().await?;

        if payload.embedding.is_empty() {
            return Err(RagError::EmptyEmbedding);
        }

        if payload.embedding.len() != self.config.dimensions {
            return Err(RagError::EmbeddingDimension {
                expected: self.config.dimensions,
                actual: payload.embedding.len(),
            });
        }

        Ok(payload.embedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        with_retries("embeddings", self.max_retries, || {
            self.request_embedding(text)
        })
        .await
    }
}
