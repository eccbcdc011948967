//! Text embeddings through an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ycs_storage::HttpClient;

use crate::IndexError;

/// Inputs per embeddings request.
pub const DEFAULT_REQUEST_BATCH: usize = 64;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError>;
}

/// Named-vector label for `model`: `fast-` plus the lowercased last path segment.
pub fn vector_name_for_model(model: &str) -> String {
    let last = model.rsplit('/').next().unwrap_or(model);
    format!("fast-{}", last.to_lowercase())
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
    request_batch: usize,
}

impl HttpEmbedder {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            request_batch: DEFAULT_REQUEST_BATCH,
        }
    }

    pub fn with_request_batch(mut self, request_batch: usize) -> Self {
        self.request_batch = request_batch.max(1);
        self
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let mut response: EmbeddingResponse = self
            .http
            .execute_json("embeddings", |client| {
                client.post(&url).bearer_auth(&self.api_key).json(&body)
            })
            .await?;

        if response.data.len() != texts.len() {
            return Err(IndexError::EmbeddingCount {
                expected: texts.len(),
                got: response.data.len(),
            });
        }
        response.data.sort_by_key(|datum| datum.index);
        Ok(response.data.into_iter().map(|datum| datum.embedding).collect())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.request_batch) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        debug!(inputs = texts.len(), model = %self.model, "embedded texts");
        Ok(vectors)
    }
}
